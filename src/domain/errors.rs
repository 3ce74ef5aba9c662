use chrono::NaiveDate;
use thiserror::Error;

/// Reasons a ticker's price history cannot be used for screening.
///
/// Every variant is a skip-this-ticker condition, never a batch failure.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DataError {
    #[error("insufficient data: {bars} bars, need at least {required}")]
    InsufficientData { bars: usize, required: usize },

    #[error("missing value in {field} on {date}")]
    MissingValues { field: &'static str, date: NaiveDate },

    #[error("invalid bar on {date}: {reason}")]
    InvalidBar { date: NaiveDate, reason: String },

    #[error("data source failure: {reason}")]
    SourceFailure { reason: String },

    #[error("data fetch timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Errors raised while fitting or querying a classifier
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("empty training set")]
    EmptyTrainingSet,

    #[error("too few training rows: {rows} < {required}")]
    TooFewRows { rows: usize, required: usize },

    #[error("single-class training target (all {})", class_name(.positive))]
    SingleClass { positive: bool },

    #[error("feature dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("{model} is not fitted")]
    NotFitted { model: &'static str },

    #[error("{model} failed: {reason}")]
    Backend { model: &'static str, reason: String },
}

fn class_name(positive: &bool) -> &'static str {
    if *positive { "positive" } else { "negative" }
}

/// Top-level screening error.
///
/// Mirrors the failure taxonomy of a screening run: data problems and model
/// problems skip a ticker, fundamentals problems downgrade to "absent", and
/// only an empty universe fails the whole run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScreenerError {
    #[error(transparent)]
    DataUnavailable(#[from] DataError),

    #[error("model fit failure: {0}")]
    ModelFitFailure(#[from] ModelError),

    #[error("fundamentals unavailable: {reason}")]
    FundamentalsUnavailable { reason: String },

    #[error("invalid indicator configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("worker task failed: {reason}")]
    Worker { reason: String },

    #[error("ticker universe is empty")]
    EmptyUniverse,
}
