use serde::{Deserialize, Serialize};

pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Caller request for one page of the ticker universe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub index: usize,
    pub size: usize,
}

impl BatchRequest {
    pub fn new(index: usize, size: usize) -> Self {
        Self { index, size }
    }

    /// Parse a raw batch index such as a query parameter; anything unparsable means batch 0
    pub fn from_raw(index: Option<&str>, size: usize) -> Self {
        let index = index
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(0);
        Self::new(index, size)
    }
}

impl Default for BatchRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_BATCH_SIZE)
    }
}

/// Resolved slice `[start, end)` of a universe of `total` tickers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchWindow {
    pub index: usize,
    pub size: usize,
    pub start: usize,
    pub end: usize,
    pub total: usize,
}

impl BatchWindow {
    /// Resolve a request against the universe size.
    ///
    /// Never fails: a zero page size falls back to the default size and an
    /// index past the end of the universe falls back to batch 0.
    pub fn resolve(request: BatchRequest, total: usize) -> Self {
        let size = if request.size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            request.size
        };

        let index = match request.index.checked_mul(size) {
            Some(start) if start < total => request.index,
            _ => 0,
        };

        let start = index * size;
        let end = start.saturating_add(size).min(total);

        Self {
            index,
            size,
            start,
            end,
            total,
        }
    }

    /// Index of the following batch, if any tickers remain
    pub fn next_batch(&self) -> Option<usize> {
        (self.end < self.total).then_some(self.index + 1)
    }

    pub fn batch_count(&self) -> usize {
        self.total.div_ceil(self.size)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end.min(items.len());
        let start = self.start.min(end);
        &items[start..end]
    }
}
