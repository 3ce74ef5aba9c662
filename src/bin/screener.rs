//! Swing Screener CLI
//!
//! Runs one screening pass over the configured universe (or the tickers
//! given on the command line) and prints the ranked table, the skipped
//! tickers and the Strong Buy digest.

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use swing_screener::config::Config;
use swing_screener::domain::screening::alerts::AlertDigest;
use swing_screener::domain::screening::batch::BatchRequest;
use swing_screener::domain::screening::types::{ResultTable, ScreenerRow};
use swing_screener::infrastructure::ServiceFactory;
use swing_screener::infrastructure::observability::init_logging;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Swing trade signal screener", long_about = None)]
struct Cli {
    /// Comma-separated tickers; defaults to SCREENER_TICKERS or the built-in universe
    #[arg(short, long)]
    tickers: Option<String>,

    /// Screen only this page of the universe
    #[arg(short, long)]
    batch: Option<usize>,

    /// Page size used with --batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Signal preset (relaxed, balanced, strict); overrides SIGNAL_PRESET
    #[arg(long)]
    preset: Option<String>,

    /// Data source (yahoo, csv:<dir>, mock); overrides SCREENER_DATA_SOURCE
    #[arg(long)]
    source: Option<String>,

    /// Print the result table as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_lookup(&|key| match key {
        "SIGNAL_PRESET" if cli.preset.is_some() => cli.preset.clone(),
        "SCREENER_DATA_SOURCE" if cli.source.is_some() => cli.source.clone(),
        _ => env::var(key).ok(),
    })
    .context("Failed to load configuration")?;
    init_logging(config.observability.log_format);

    info!(
        "Screener CLI: preset {}, source {}, {} features",
        config.signals.preset,
        config.screener.data_source,
        config.screener.features.len()
    );

    let screener = ServiceFactory::create_screener(&config)?;

    let tickers = cli.tickers.as_deref().map(|raw| {
        raw.split(',')
            .map(str::to_string)
            .collect::<Vec<_>>()
    });
    let batch = cli.batch.map(|index| {
        BatchRequest::new(index, cli.batch_size.unwrap_or(config.screener.batch_size))
    });

    let table = screener.run(tickers, batch).await?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&table).context("Failed to serialize result table")?
        );
    } else {
        print_table(&table);
    }
    Ok(())
}

fn print_table(table: &ResultTable) {
    println!("\nRun {} at {}", table.run_id, table.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("{}", "=".repeat(96));
    println!(
        "{:<8} {:<11} {:>6} {:>6} {:>6} {:>6} {:>7} {:>8} {:>8} {:>7}",
        "Ticker", "Signal", "Prob", "RF", "GB", "LR", "RSI", "RelVol", "WinRate", "Trades"
    );
    println!("{}", "-".repeat(96));

    for row in &table.rows {
        match row {
            ScreenerRow::Signal(s) => {
                let (win_rate, trades) = s
                    .backtest
                    .map(|b| (format!("{:.1}%", b.win_rate), b.signal_count.to_string()))
                    .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
                println!(
                    "{:<8} {:<11} {:>6.3} {:>6.3} {:>6.3} {:>6.3} {:>7.1} {:>8.2} {:>8} {:>7}",
                    s.ticker,
                    s.label.to_string(),
                    s.score.probability,
                    s.score.random_forest,
                    s.score.gradient_boosting,
                    s.score.logistic,
                    s.indicators.rsi,
                    s.indicators.rel_volume,
                    win_rate,
                    trades
                );
                println!("         {}", s.explanation);
            }
            ScreenerRow::NoMatches => println!("{}", row.ticker()),
        }
    }

    if !table.errors.is_empty() {
        println!("\nSkipped ({}):", table.errors.len());
        for skipped in &table.errors {
            println!("  {:<8} {}", skipped.ticker, skipped.reason);
        }
    }

    if let Some(window) = table.batch {
        println!(
            "\nBatch {} covers tickers [{}, {}) of {}",
            window.index, window.start, window.end, window.total
        );
    }
    if let Some(next) = table.next_batch {
        println!("Next batch: {}", next);
    }

    if let Some(digest) = AlertDigest::from_table(table) {
        println!("\n{}", digest.message());
    }
}
