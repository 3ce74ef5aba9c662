//! Log output for the binaries.
//!
//! Everything is pushed to stdout through `tracing`; JSON output is meant
//! for log shippers (Loki, Fluentd, CloudWatch).

pub mod logging;

pub use logging::init_logging;
