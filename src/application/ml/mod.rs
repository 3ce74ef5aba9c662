// Dataset building, classifiers and their validation
pub mod dataset;
pub mod ensemble;
pub mod models;
pub mod walk_forward;
