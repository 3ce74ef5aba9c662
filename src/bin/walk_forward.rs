//! Walk-Forward Inspector
//!
//! Fetches one ticker, scores its latest bar with each ensemble member and
//! walks its whole history regardless of the live signal gates.

use anyhow::{Context, Result};
use clap::Parser;
use swing_screener::config::Config;
use swing_screener::infrastructure::ServiceFactory;
use swing_screener::infrastructure::observability::init_logging;
use tokio::time::timeout;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Per-ticker ensemble and walk-forward report", long_about = None)]
struct Cli {
    /// Ticker to inspect
    ticker: String,

    /// Walk the history on a single thread
    #[arg(long)]
    sequential: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    init_logging(config.observability.log_format);
    if cli.sequential {
        config.model.walk_forward.parallel = false;
    }

    let ticker = cli.ticker.trim().to_uppercase();
    let source = ServiceFactory::create_market_data(&config);
    let pipeline = ServiceFactory::create_pipeline(&config)?;
    let settings = config.screener_settings();

    info!("Walk-forward: fetching {} from {}", ticker, source.name());
    let mut series = timeout(
        settings.fetch_timeout,
        source.fetch(&ticker, settings.period, settings.interval),
    )
    .await
    .with_context(|| format!("Timed out fetching {}", ticker))??;
    series.ticker = ticker.clone();

    let report = tokio::task::spawn_blocking(move || pipeline.diagnose(&series))
        .await
        .context("Walk-forward worker panicked")??;

    println!("\n{} as of {} ({} feature rows)", report.ticker, report.as_of_date, report.feature_rows);
    println!("{}", "=".repeat(48));
    println!("Random forest       {:>8.3}", report.score.random_forest);
    println!("Gradient boosting   {:>8.3}", report.score.gradient_boosting);
    println!("Logistic regression {:>8.3}", report.score.logistic);
    println!("Ensemble            {:>8.3}", report.score.probability);
    println!("{}", "-".repeat(48));
    let wf = &report.walk_forward;
    println!("Win rate            {:>7.1}%", wf.summary.win_rate);
    println!("Signals             {:>8}", wf.summary.signal_count);
    println!("Correct             {:>8}", wf.correct);
    println!("Steps evaluated     {:>8}", wf.steps_evaluated);
    println!("Steps skipped       {:>8}", wf.skipped_steps);
    println!(
        "Training window     {:>8}",
        if wf.embargo { "embargo" } else { "full" }
    );
    Ok(())
}
