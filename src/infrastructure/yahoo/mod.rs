pub mod common;
pub mod fundamentals;
pub mod market_data;

pub use fundamentals::YahooFundamentalsSource;
pub use market_data::{DEFAULT_YAHOO_BASE_URL, YahooChartSource};
