pub mod core;
pub mod csv_source;
pub mod factory;
pub mod fundamentals;
pub mod mock;
pub mod notifier;
pub mod observability;
pub mod yahoo;

pub use csv_source::CsvDirectorySource;
pub use factory::ServiceFactory;
pub use mock::{InMemoryFundamentals, InMemoryMarketData};
pub use yahoo::{YahooChartSource, YahooFundamentalsSource};
