use crate::application::screener::latest_results::LatestResults;
use crate::application::screener::pipeline::SignalPipeline;
use crate::domain::errors::{DataError, ScreenerError};
use crate::domain::market::fundamentals::Fundamentals;
use crate::domain::market::timeframe::{BarInterval, HistoryPeriod};
use crate::domain::ports::{FundamentalsSource, MarketDataSource, Notifier};
use crate::domain::screening::alerts::AlertDigest;
use crate::domain::screening::batch::{BatchRequest, BatchWindow, DEFAULT_BATCH_SIZE};
use crate::domain::screening::types::{
    ResultTable, ScoredTicker, ScreenerRow, SkippedTicker, TickerOutcome,
};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Universe screened when the caller supplies no ticker list
pub const DEFAULT_UNIVERSE: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "TSLA", "AVGO", "AMD", "NFLX", "ADBE",
    "CRM", "ORCL", "INTC", "QCOM", "TXN", "CSCO", "JPM", "V", "MA", "UNH", "LLY", "JNJ", "PG",
    "KO", "PEP", "COST", "WMT", "HD", "XOM", "CVX", "CAT", "DE", "BA", "GE", "DIS",
];

/// Run-level knobs of the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerSettings {
    pub universe: Vec<String>,
    pub batch_size: usize,
    pub period: HistoryPeriod,
    pub interval: BarInterval,
    pub fetch_timeout: Duration,
}

impl Default for ScreenerSettings {
    fn default() -> Self {
        Self {
            universe: DEFAULT_UNIVERSE.iter().map(|t| t.to_string()).collect(),
            batch_size: DEFAULT_BATCH_SIZE,
            period: HistoryPeriod::default(),
            interval: BarInterval::OneDay,
            fetch_timeout: Duration::from_secs(20),
        }
    }
}

/// Drives one screening pass over a ticker universe.
///
/// Every per-ticker failure (fetch error, timeout, short history,
/// degenerate training data, worker panic) becomes an entry of the error
/// list; only an empty universe fails the run.
pub struct Screener {
    market_data: Arc<dyn MarketDataSource>,
    fundamentals: Arc<dyn FundamentalsSource>,
    notifier: Option<Arc<dyn Notifier>>,
    pipeline: Arc<SignalPipeline>,
    settings: ScreenerSettings,
    latest: Arc<LatestResults>,
}

impl Screener {
    pub fn new(
        market_data: Arc<dyn MarketDataSource>,
        fundamentals: Arc<dyn FundamentalsSource>,
        pipeline: SignalPipeline,
        settings: ScreenerSettings,
    ) -> Self {
        Self {
            market_data,
            fundamentals,
            notifier: None,
            pipeline: Arc::new(pipeline),
            settings,
            latest: Arc::new(LatestResults::new()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Share an existing cache instead of the private one
    pub fn with_latest_results(mut self, latest: Arc<LatestResults>) -> Self {
        self.latest = latest;
        self
    }

    pub fn latest_results(&self) -> Arc<LatestResults> {
        Arc::clone(&self.latest)
    }

    pub fn settings(&self) -> &ScreenerSettings {
        &self.settings
    }

    /// Screen `tickers` (or the configured universe), optionally one batch of it.
    pub async fn run(
        &self,
        tickers: Option<Vec<String>>,
        batch: Option<BatchRequest>,
    ) -> Result<ResultTable, ScreenerError> {
        let universe =
            normalize_universe(tickers.unwrap_or_else(|| self.settings.universe.clone()));
        if universe.is_empty() {
            error!("Screener: ticker universe is empty, nothing to screen");
            return Err(ScreenerError::EmptyUniverse);
        }

        let window = batch.map(|request| BatchWindow::resolve(request, universe.len()));
        let selected = match &window {
            Some(w) => w.slice(&universe),
            None => &universe[..],
        };

        let run_id = Uuid::new_v4();
        info!(
            "Screener: run {} over {} of {} tickers via {}{}",
            run_id,
            selected.len(),
            universe.len(),
            self.market_data.name(),
            window
                .map(|w| format!(" (batch {} [{}, {}))", w.index, w.start, w.end))
                .unwrap_or_default()
        );

        let mut outcomes = Vec::with_capacity(selected.len());
        for ticker in selected {
            outcomes.push(self.screen_ticker(ticker).await);
        }

        let table = assemble_table(run_id, outcomes, window);
        info!(
            "Screener: run {} done: {} signals, {} skipped",
            run_id,
            table.signals().count(),
            table.errors.len()
        );

        self.latest.publish(table.clone()).await;
        self.dispatch_alert(&table).await;
        Ok(table)
    }

    /// Screen one ticker, turning every failure into a `Skipped` outcome
    pub async fn screen_ticker(&self, ticker: &str) -> TickerOutcome {
        let secs = self.settings.fetch_timeout.as_secs();
        let fetched = timeout(
            self.settings.fetch_timeout,
            self.market_data
                .fetch(ticker, self.settings.period, self.settings.interval),
        )
        .await;

        let mut series = match fetched {
            Ok(Ok(series)) => series,
            Ok(Err(e)) => {
                return skipped(
                    ticker,
                    DataError::SourceFailure {
                        reason: format!("{:#}", e),
                    }
                    .into(),
                );
            }
            Err(_) => return skipped(ticker, DataError::Timeout { secs }.into()),
        };
        series.ticker = ticker.to_string();

        let required = self.pipeline.min_bars();
        if series.len() < required {
            return skipped(
                ticker,
                DataError::InsufficientData {
                    bars: series.len(),
                    required,
                }
                .into(),
            );
        }

        let fundamentals = self.fetch_fundamentals(ticker).await;

        let pipeline = Arc::clone(&self.pipeline);
        let joined =
            tokio::task::spawn_blocking(move || pipeline.evaluate(&series, fundamentals.as_ref()))
                .await;

        match joined {
            Ok(Ok(outcome)) => {
                if let TickerOutcome::NoSignal { reason, .. } = &outcome {
                    info!("Screener: {} no signal ({})", ticker, reason);
                }
                outcome
            }
            Ok(Err(e)) => skipped(ticker, e),
            Err(e) => skipped(
                ticker,
                ScreenerError::Worker {
                    reason: e.to_string(),
                },
            ),
        }
    }

    /// Fundamentals failures downgrade to "absent"
    async fn fetch_fundamentals(&self, ticker: &str) -> Option<Fundamentals> {
        match timeout(
            self.settings.fetch_timeout,
            self.fundamentals.fundamentals(ticker),
        )
        .await
        {
            Ok(Ok(f)) => f,
            Ok(Err(e)) => {
                let err = ScreenerError::FundamentalsUnavailable {
                    reason: format!("{:#}", e),
                };
                warn!("Screener: {} {}", ticker, err);
                None
            }
            Err(_) => {
                warn!("Screener: {} fundamentals fetch timed out", ticker);
                None
            }
        }
    }

    async fn dispatch_alert(&self, table: &ResultTable) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let Some(digest) = AlertDigest::from_table(table) else {
            return;
        };
        if let Err(e) = notifier.notify(&digest).await {
            warn!("Screener: failed to dispatch Strong Buy alert: {:#}", e);
        }
    }
}

fn skipped(ticker: &str, err: ScreenerError) -> TickerOutcome {
    warn!("Screener: skipping {}: {}", ticker, err);
    TickerOutcome::Skipped(SkippedTicker {
        ticker: ticker.to_string(),
        reason: err.to_string(),
    })
}

/// Trim, upper-case and de-duplicate tickers, keeping first-seen order
pub fn normalize_universe(tickers: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .into_iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Strong Buy before Buy, then probability descending, then ticker
pub fn rank_signals(signals: &mut [ScoredTicker]) {
    signals.sort_by(|a, b| {
        b.label
            .rank()
            .cmp(&a.label.rank())
            .then(b.probability().total_cmp(&a.probability()))
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
}

/// Fold per-ticker outcomes into a ranked table
pub fn assemble_table(
    run_id: Uuid,
    outcomes: Vec<TickerOutcome>,
    window: Option<BatchWindow>,
) -> ResultTable {
    let mut signals = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            TickerOutcome::Signal(s) => signals.push(s),
            TickerOutcome::Skipped(s) => errors.push(s),
            TickerOutcome::NoSignal { .. } => {}
        }
    }

    rank_signals(&mut signals);
    let rows = if signals.is_empty() {
        vec![ScreenerRow::NoMatches]
    } else {
        signals.into_iter().map(ScreenerRow::Signal).collect()
    };

    ResultTable {
        run_id,
        generated_at: Utc::now(),
        rows,
        errors,
        batch: window,
        next_batch: window.and_then(|w| w.next_batch()),
    }
}

/// Tickers labeled Strong Buy, in table order
pub fn strong_buys(table: &ResultTable) -> Vec<String> {
    table
        .strong_buys()
        .into_iter()
        .map(|s| s.ticker.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::screening::types::{EnsembleScore, IndicatorSnapshot, SignalLabel};
    use chrono::NaiveDate;

    fn signal(ticker: &str, label: SignalLabel, p: f64) -> ScoredTicker {
        ScoredTicker {
            ticker: ticker.to_string(),
            as_of_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            score: EnsembleScore::from_parts(p, p, p),
            indicators: IndicatorSnapshot {
                close: 100.0,
                rsi: 55.0,
                macd: 1.0,
                macd_signal: 0.5,
                bb_high: 101.0,
                bb_low: 92.0,
                atr: 2.0,
                sma_50: 96.0,
                sma_200: 90.0,
                rel_volume: 1.8,
                return_1d: 0.01,
            },
            backtest: None,
            fundamentals: None,
            label,
            explanation: "test".to_string(),
        }
    }

    #[test]
    fn test_ranking() {
        let mut signals = vec![
            signal("BBB", SignalLabel::Buy, 0.9),
            signal("AAA", SignalLabel::StrongBuy, 0.65),
            signal("CCC", SignalLabel::StrongBuy, 0.8),
            signal("AAB", SignalLabel::Buy, 0.9),
        ];
        rank_signals(&mut signals);

        let order: Vec<&str> = signals.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(order, vec!["CCC", "AAA", "AAB", "BBB"]);
    }

    #[test]
    fn test_no_qualifying_signal_yields_sentinel_row() {
        let outcomes = vec![
            TickerOutcome::NoSignal {
                ticker: "MSFT".to_string(),
                reason: "RSI 85.0 outside 30-70".to_string(),
            },
            TickerOutcome::Skipped(SkippedTicker {
                ticker: "ZZZZ".to_string(),
                reason: "insufficient data: 0 bars, need at least 200".to_string(),
            }),
        ];
        let table = assemble_table(Uuid::new_v4(), outcomes, None);

        assert_eq!(table.rows, vec![ScreenerRow::NoMatches]);
        assert!(!table.has_matches());
        assert_eq!(table.errors.len(), 1);
        assert!(strong_buys(&table).is_empty());
    }

    #[test]
    fn test_table_carries_next_batch() {
        let window = BatchWindow::resolve(BatchRequest::new(1, 25), 600);
        let table = assemble_table(
            Uuid::new_v4(),
            vec![TickerOutcome::Signal(signal("NVDA", SignalLabel::StrongBuy, 0.8))],
            Some(window),
        );

        assert_eq!(table.next_batch, Some(2));
        assert_eq!(strong_buys(&table), vec!["NVDA".to_string()]);
    }

    #[test]
    fn test_normalize_universe() {
        let tickers = vec![" aapl ".to_string(), "MSFT".to_string(), "AAPL".to_string(), "".to_string()];
        assert_eq!(normalize_universe(tickers), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_default_universe_has_no_duplicates() {
        let universe = normalize_universe(ScreenerSettings::default().universe);
        assert_eq!(universe.len(), DEFAULT_UNIVERSE.len());
    }
}
