use crate::domain::market::fundamentals::Fundamentals;
use crate::domain::ports::FundamentalsSource;
use anyhow::Result;
use async_trait::async_trait;

/// Source used when no fundamentals provider is configured; every ticker is "absent"
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFundamentals;

#[async_trait]
impl FundamentalsSource for NoFundamentals {
    async fn fundamentals(&self, _ticker: &str) -> Result<Option<Fundamentals>> {
        Ok(None)
    }
}
