mod common;

use common::{
    LOOSE_RULES, config, healthy_fundamentals, rallying_series, screener,
    screener_with_fundamentals, tickers,
};
use std::sync::Arc;
use std::time::Duration;
use swing_screener::domain::errors::ScreenerError;
use swing_screener::domain::market::fundamentals::Fundamentals;
use swing_screener::domain::screening::batch::BatchRequest;
use swing_screener::domain::screening::types::{NO_MATCHES, ScreenerRow};
use swing_screener::infrastructure::mock::{
    InMemoryFundamentals, InMemoryMarketData, synthetic_series,
};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_empty_series_is_reported_and_others_continue() {
    let source = InMemoryMarketData::new();
    source.insert(synthetic_series("AAA", 504, 11)).await;
    source.insert(synthetic_series("BBB", 504, 12)).await;

    let screener = screener(&config(&[]), source, TIMEOUT);
    let table = screener
        .run(Some(tickers(&["AAA", "ZZZZ", "BBB"])), None)
        .await
        .unwrap();

    assert_eq!(table.errors.len(), 1);
    assert_eq!(table.errors[0].ticker, "ZZZZ");
    assert!(table.errors[0].reason.contains("insufficient data"));
    assert!(table.rows.iter().all(|r| r.ticker() != "ZZZZ"));
}

#[tokio::test]
async fn test_no_qualifying_ticker_gives_sentinel_row() {
    let source = InMemoryMarketData::new();
    source.insert(synthetic_series("AAA", 504, 21)).await;

    let screener = screener(&config(&[("MIN_REL_VOLUME", "1000")]), source, TIMEOUT);
    let table = screener.run(Some(tickers(&["AAA"])), None).await.unwrap();

    assert_eq!(table.rows, vec![ScreenerRow::NoMatches]);
    assert_eq!(table.rows[0].ticker(), NO_MATCHES);
    assert!(table.errors.is_empty());
    assert!(!table.has_matches());
}

#[tokio::test]
async fn test_batch_selects_page_of_large_universe() {
    let universe: Vec<String> = (0..600).map(|i| format!("T{:03}", i)).collect();
    let screener = screener(&config(&[]), InMemoryMarketData::new(), TIMEOUT);

    let table = screener
        .run(Some(universe), Some(BatchRequest::new(1, 25)))
        .await
        .unwrap();

    let window = table.batch.expect("batch window reported");
    assert_eq!((window.start, window.end), (25, 50));
    assert_eq!(table.next_batch, Some(2));

    let screened: Vec<&str> = table.errors.iter().map(|s| s.ticker.as_str()).collect();
    assert_eq!(screened.len(), 25);
    assert_eq!(screened.first(), Some(&"T025"));
    assert_eq!(screened.last(), Some(&"T049"));
}

#[tokio::test]
async fn test_fetch_failure_and_timeout_are_isolated() {
    let source = InMemoryMarketData::new();
    source.fail("BAD", "connection reset").await;
    source.hang("SLOW").await;
    source.insert(synthetic_series("GOOD", 504, 31)).await;

    let screener = screener(&config(&[]), source, Duration::from_millis(200));
    let table = screener
        .run(Some(tickers(&["BAD", "SLOW", "GOOD"])), None)
        .await
        .unwrap();

    let reason = |t: &str| {
        table
            .errors
            .iter()
            .find(|s| s.ticker == t)
            .map(|s| s.reason.clone())
    };
    assert!(reason("BAD").unwrap().contains("connection reset"));
    assert!(reason("SLOW").unwrap().contains("timed out"));
    assert_eq!(reason("GOOD"), None);
}

#[tokio::test]
async fn test_run_publishes_latest_results() {
    let screener = screener(&config(&[]), InMemoryMarketData::new(), TIMEOUT);
    let latest = screener.latest_results();
    assert!(latest.latest().await.is_none());

    let first = screener.run(Some(tickers(&["ZZZZ"])), None).await.unwrap();
    screener.run(Some(tickers(&["YYYY"])), None).await.unwrap();

    let snapshot = latest.latest().await.expect("published");
    assert_eq!(snapshot.version, 2);
    assert_ne!(snapshot.table.run_id, first.run_id);
    assert_eq!(snapshot.table.errors[0].ticker, "YYYY");
}

#[tokio::test]
async fn test_empty_universe_fails_run() {
    let screener = screener(&config(&[]), InMemoryMarketData::new(), TIMEOUT);
    let err = screener.run(Some(tickers(&[" ", ""])), None).await.unwrap_err();
    assert!(matches!(err, ScreenerError::EmptyUniverse));
}

#[tokio::test]
async fn test_signals_are_ranked_by_label_then_probability() {
    let source = InMemoryMarketData::new();
    for (i, ticker) in ["AAA", "BBB", "CCC", "DDD"].iter().enumerate() {
        source.insert(rallying_series(ticker, 40 + i as u64)).await;
    }
    let screener = screener(&config(LOOSE_RULES), source, TIMEOUT);
    let table = screener
        .run(Some(tickers(&["AAA", "BBB", "CCC", "DDD"])), None)
        .await
        .unwrap();

    assert!(table.errors.is_empty(), "unexpected errors: {:?}", table.errors);
    let signals: Vec<_> = table.signals().collect();
    assert!(signals.len() >= 2, "expected signals, got {:?}", table.rows);
    for pair in signals.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert!(
            a.label.rank() > b.label.rank()
                || (a.label == b.label && a.probability() >= b.probability())
        );
    }
    for s in &signals {
        assert!((0.0..=1.0).contains(&s.probability()));
        assert!(!s.explanation.is_empty());
    }
}

#[tokio::test]
async fn test_fundamentals_gate_and_failed_lookups() {
    let source = InMemoryMarketData::new();
    for (i, ticker) in ["PASS", "RICH", "DOWN"].iter().enumerate() {
        source.insert(rallying_series(ticker, 60 + i as u64)).await;
    }
    let fundamentals = Arc::new(InMemoryFundamentals::new());
    fundamentals.insert("PASS", healthy_fundamentals()).await;
    fundamentals
        .insert(
            "RICH",
            Fundamentals {
                pe_ratio: Some(200.0),
                ..healthy_fundamentals()
            },
        )
        .await;
    fundamentals.fail("DOWN", "quoteSummary unavailable").await;

    let universe = tickers(&["PASS", "RICH", "DOWN"]);
    let screener = screener_with_fundamentals(
        &config(LOOSE_RULES),
        source,
        fundamentals.clone(),
        TIMEOUT,
    );
    let table = screener.run(Some(universe.clone()), None).await.unwrap();

    // A failed lookup is absent fundamentals, never a skipped ticker
    assert!(table.errors.is_empty(), "unexpected errors: {:?}", table.errors);
    let signalled: Vec<&str> = table.signals().map(|s| s.ticker.as_str()).collect();
    assert!(signalled.contains(&"PASS"));
    assert!(signalled.contains(&"DOWN"));
    assert!(!signalled.contains(&"RICH"));

    let pass = table.signals().find(|s| s.ticker == "PASS").unwrap();
    assert_eq!(pass.fundamentals, Some(healthy_fundamentals()));
    let down = table.signals().find(|s| s.ticker == "DOWN").unwrap();
    assert_eq!(down.fundamentals, None);

    let mut required = LOOSE_RULES.to_vec();
    required.push(("REQUIRE_FUNDAMENTALS", "true"));
    let source = InMemoryMarketData::new();
    for (i, ticker) in ["PASS", "RICH", "DOWN"].iter().enumerate() {
        source.insert(rallying_series(ticker, 60 + i as u64)).await;
    }
    let screener = screener_with_fundamentals(&config(&required), source, fundamentals, TIMEOUT);
    let table = screener.run(Some(universe), None).await.unwrap();

    let signalled: Vec<&str> = table.signals().map(|s| s.ticker.as_str()).collect();
    assert_eq!(signalled, vec!["PASS"]);
    assert!(table.errors.is_empty());
}
