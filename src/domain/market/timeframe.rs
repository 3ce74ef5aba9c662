use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bar interval requested from a market data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarInterval {
    OneDay,
    OneWeek,
}

impl BarInterval {
    /// Calendar days covered by one bar
    pub fn to_days(&self) -> u32 {
        match self {
            BarInterval::OneDay => 1,
            BarInterval::OneWeek => 7,
        }
    }

    /// Converts to Yahoo chart API interval string
    pub fn to_yahoo_string(&self) -> &'static str {
        match self {
            BarInterval::OneDay => "1d",
            BarInterval::OneWeek => "1wk",
        }
    }
}

impl FromStr for BarInterval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "1d" | "1day" | "oneday" | "daily" => Ok(BarInterval::OneDay),
            "1wk" | "1w" | "1week" | "weekly" => Ok(BarInterval::OneWeek),
            _ => Err(anyhow!(
                "Invalid interval: '{}'. Valid options: 1d, 1wk",
                s
            )),
        }
    }
}

impl fmt::Display for BarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_yahoo_string())
    }
}

/// Look-back period of history requested per ticker (`6mo`, `1y`, `2y`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryPeriod {
    Months(u32),
    Years(u32),
}

impl HistoryPeriod {
    /// Approximate calendar days covered by the period
    pub fn calendar_days(&self) -> i64 {
        match self {
            HistoryPeriod::Months(m) => *m as i64 * 31,
            HistoryPeriod::Years(y) => *y as i64 * 366,
        }
    }

    /// Approximate number of trading sessions in the period
    pub fn trading_days(&self) -> usize {
        (self.calendar_days() as f64 * 252.0 / 365.0) as usize
    }

    /// Converts to Yahoo chart API range string
    pub fn to_yahoo_string(&self) -> String {
        match self {
            HistoryPeriod::Months(m) => format!("{}mo", m),
            HistoryPeriod::Years(y) => format!("{}y", y),
        }
    }
}

impl Default for HistoryPeriod {
    fn default() -> Self {
        HistoryPeriod::Years(2)
    }
}

impl FromStr for HistoryPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        let (digits, unit) = lower.split_at(
            lower
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(lower.len()),
        );
        let count: u32 = digits
            .parse()
            .map_err(|_| anyhow!("Invalid period: '{}'. Expected e.g. 6mo, 1y, 2y", s))?;
        if count == 0 {
            return Err(anyhow!("Invalid period: '{}'. Count must be positive", s));
        }
        match unit {
            "mo" | "m" | "month" | "months" => Ok(HistoryPeriod::Months(count)),
            "y" | "yr" | "year" | "years" => Ok(HistoryPeriod::Years(count)),
            _ => Err(anyhow!(
                "Invalid period unit in '{}'. Valid units: mo, y",
                s
            )),
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_yahoo_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_str() {
        assert_eq!(BarInterval::from_str("1d").unwrap(), BarInterval::OneDay);
        assert_eq!(BarInterval::from_str("Daily").unwrap(), BarInterval::OneDay);
        assert_eq!(BarInterval::from_str("1wk").unwrap(), BarInterval::OneWeek);
        assert!(BarInterval::from_str("5m").is_err());
    }

    #[test]
    fn test_period_from_str() {
        assert_eq!(HistoryPeriod::from_str("2y").unwrap(), HistoryPeriod::Years(2));
        assert_eq!(HistoryPeriod::from_str("6mo").unwrap(), HistoryPeriod::Months(6));
        assert!(HistoryPeriod::from_str("0y").is_err());
        assert!(HistoryPeriod::from_str("y").is_err());
        assert!(HistoryPeriod::from_str("3d").is_err());
    }

    #[test]
    fn test_period_covers_backtest_history() {
        // 2y of daily bars must cover 200 warm-up bars plus a 200-row walk
        assert!(HistoryPeriod::Years(2).trading_days() > 400);
        assert_eq!(HistoryPeriod::Years(2).to_yahoo_string(), "2y");
    }
}
