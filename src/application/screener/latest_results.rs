use crate::domain::screening::types::ResultTable;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// One published screening result
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerSnapshot {
    /// Starts at 1 and increases with every publish
    pub version: u64,
    pub table: ResultTable,
}

/// Process-wide cache of the most recent screening run.
///
/// The snapshot is immutable and swapped whole, so a reader holding an
/// `Arc` keeps a consistent table while a new run publishes.
#[derive(Debug, Default)]
pub struct LatestResults {
    current: RwLock<Option<Arc<ScreenerSnapshot>>>,
}

impl LatestResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached table; returns the new version
    pub async fn publish(&self, table: ResultTable) -> u64 {
        let mut guard = self.current.write().await;
        let version = guard.as_ref().map_or(1, |s| s.version + 1);
        *guard = Some(Arc::new(ScreenerSnapshot { version, table }));
        debug!("LatestResults: published version {}", version);
        version
    }

    pub async fn latest(&self) -> Option<Arc<ScreenerSnapshot>> {
        self.current.read().await.clone()
    }

    /// 0 until the first publish
    pub async fn version(&self) -> u64 {
        self.current.read().await.as_ref().map_or(0, |s| s.version)
    }
}
