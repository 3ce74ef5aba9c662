// Market data processing modules
pub mod indicator_engine;
