use crate::domain::ports::Notifier;
use crate::domain::screening::alerts::AlertDigest;
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Writes Strong Buy digests to the log instead of an outbound channel
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, digest: &AlertDigest) -> Result<()> {
        info!(
            tickers = ?digest.tickers,
            "Notifier: {}",
            digest.message().replace('\n', " | ")
        );
        Ok(())
    }
}
