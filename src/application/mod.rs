// Indicator computation
pub mod market_data;

// Datasets, classifiers and walk-forward validation
pub mod ml;

// Decision policy
pub mod signals;

// Run orchestration and result cache
pub mod screener;
