// Price history
pub mod price_series;

// Valuation data used by the fundamentals gate
pub mod fundamentals;

// Periods and bar intervals
pub mod timeframe;
