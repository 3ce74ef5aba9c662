use crate::domain::screening::types::ResultTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Strong Buy alert handed to the notification layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDigest {
    pub tickers: Vec<String>,
    pub as_of: DateTime<Utc>,
}

impl AlertDigest {
    /// Digest of the Strong Buy rows of a table; `None` when there are none
    pub fn from_table(table: &ResultTable) -> Option<Self> {
        let tickers: Vec<String> = table
            .strong_buys()
            .into_iter()
            .map(|s| s.ticker.clone())
            .collect();

        if tickers.is_empty() {
            return None;
        }

        Some(Self {
            tickers,
            as_of: table.generated_at,
        })
    }

    pub fn message(&self) -> String {
        format!(
            "Swing Trade Alert\nStrong Buy: {}\nAs of {}",
            self.tickers.join(", "),
            self.as_of.format("%Y-%m-%d %H:%M UTC")
        )
    }
}
