// Strong Buy alert digests
pub mod alerts;

// Universe pagination
pub mod batch;

// Feature rows, scored tickers and result tables
pub mod types;
