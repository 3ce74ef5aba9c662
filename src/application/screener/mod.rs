pub mod latest_results;
pub mod orchestrator;
pub mod pipeline;
