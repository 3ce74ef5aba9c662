use crate::application::market_data::indicator_engine::IndicatorEngine;
use crate::application::ml::dataset::DatasetBuilder;
use crate::application::ml::ensemble::EnsembleScorer;
use crate::application::ml::walk_forward::WalkForwardBacktester;
use crate::application::screener::orchestrator::Screener;
use crate::application::screener::pipeline::SignalPipeline;
use crate::application::signals::classifier::SignalClassifier;
use crate::config::{Config, DataSourceKind, FundamentalsSourceKind};
use crate::domain::ports::{FundamentalsSource, MarketDataSource};
use crate::infrastructure::csv_source::CsvDirectorySource;
use crate::infrastructure::fundamentals::NoFundamentals;
use crate::infrastructure::mock::InMemoryMarketData;
use crate::infrastructure::notifier::LogNotifier;
use crate::infrastructure::yahoo::{YahooChartSource, YahooFundamentalsSource};
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Wires configured adapters and the scoring pipeline together
pub struct ServiceFactory;

impl ServiceFactory {
    pub fn create_market_data(config: &Config) -> Arc<dyn MarketDataSource> {
        let source: Arc<dyn MarketDataSource> = match &config.screener.data_source {
            DataSourceKind::Yahoo => Arc::new(YahooChartSource::new(
                config.screener.yahoo_base_url.clone(),
                Duration::from_secs(config.screener.fetch_timeout_secs),
            )),
            DataSourceKind::Csv(dir) => Arc::new(CsvDirectorySource::new(dir.clone())),
            DataSourceKind::Mock => Arc::new(InMemoryMarketData::synthetic()),
        };
        info!("ServiceFactory: market data source '{}'", source.name());
        source
    }

    pub fn create_fundamentals(config: &Config) -> Arc<dyn FundamentalsSource> {
        match config.screener.fundamentals_source {
            FundamentalsSourceKind::Yahoo => {
                info!("ServiceFactory: fundamentals from yahoo");
                Arc::new(YahooFundamentalsSource::new(
                    config.screener.yahoo_base_url.clone(),
                    Duration::from_secs(config.screener.fetch_timeout_secs),
                ))
            }
            FundamentalsSourceKind::None => {
                info!("ServiceFactory: no fundamentals source, every ticker is screened without it");
                Arc::new(NoFundamentals)
            }
        }
    }

    pub fn create_pipeline(config: &Config) -> Result<SignalPipeline> {
        let engine = IndicatorEngine::new(config.indicators.indicators.clone())
            .context("Invalid indicator configuration")?;
        let builder = DatasetBuilder::new(config.screener.features.clone(), config.model.target);
        let scorer = EnsembleScorer::new(config.model.ensemble.clone());
        let backtester =
            WalkForwardBacktester::new(scorer.clone(), config.model.walk_forward.clone());
        let classifier = SignalClassifier::new(config.signals.policy.clone());

        Ok(SignalPipeline::new(
            engine, builder, scorer, backtester, classifier,
        ))
    }

    pub fn create_screener(config: &Config) -> Result<Screener> {
        if config.signals.policy.require_fundamentals
            && config.screener.fundamentals_source == FundamentalsSourceKind::None
        {
            bail!(
                "Signal policy requires fundamentals but SCREENER_FUNDAMENTALS_SOURCE is none; \
                 every ticker would be excluded"
            );
        }
        let pipeline = Self::create_pipeline(config)?;
        Ok(Screener::new(
            Self::create_market_data(config),
            Self::create_fundamentals(config),
            pipeline,
            config.screener_settings(),
        )
        .with_notifier(Arc::new(LogNotifier)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(&|key| {
            vars.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[test]
    fn test_selects_configured_source() {
        let yahoo = ServiceFactory::create_market_data(&config(&[]));
        assert_eq!(yahoo.name(), "yahoo");

        let csv = ServiceFactory::create_market_data(&config(&[("SCREENER_DATA_SOURCE", "csv:/tmp")]));
        assert_eq!(csv.name(), "csv");

        let mock = ServiceFactory::create_market_data(&config(&[("SCREENER_DATA_SOURCE", "mock")]));
        assert_eq!(mock.name(), "in-memory");
    }

    #[test]
    fn test_fundamentals_follow_data_source() {
        assert_eq!(
            config(&[]).screener.fundamentals_source,
            FundamentalsSourceKind::Yahoo
        );
        assert_eq!(
            config(&[("SCREENER_DATA_SOURCE", "mock")]).screener.fundamentals_source,
            FundamentalsSourceKind::None
        );
        assert_eq!(
            config(&[
                ("SCREENER_DATA_SOURCE", "mock"),
                ("SCREENER_FUNDAMENTALS_SOURCE", "yahoo"),
            ])
            .screener
            .fundamentals_source,
            FundamentalsSourceKind::Yahoo
        );
    }

    #[test]
    fn test_required_fundamentals_need_a_source() {
        let strict_offline = config(&[
            ("SCREENER_DATA_SOURCE", "mock"),
            ("SIGNAL_PRESET", "strict"),
        ]);
        assert!(strict_offline.signals.policy.require_fundamentals);
        assert!(ServiceFactory::create_screener(&strict_offline).is_err());

        let required_offline = config(&[
            ("SCREENER_DATA_SOURCE", "mock"),
            ("REQUIRE_FUNDAMENTALS", "true"),
        ]);
        assert!(ServiceFactory::create_screener(&required_offline).is_err());

        let strict_online = config(&[
            ("SCREENER_DATA_SOURCE", "mock"),
            ("SCREENER_FUNDAMENTALS_SOURCE", "yahoo"),
            ("SIGNAL_PRESET", "strict"),
        ]);
        assert!(ServiceFactory::create_screener(&strict_online).is_ok());

        assert!(ServiceFactory::create_screener(&config(&[("SCREENER_DATA_SOURCE", "mock")])).is_ok());
    }

    #[test]
    fn test_pipeline_uses_indicator_periods() {
        let pipeline =
            ServiceFactory::create_pipeline(&config(&[("TREND_SMA_PERIOD", "100")])).unwrap();
        assert_eq!(pipeline.min_bars(), 100);
    }

    #[test]
    fn test_invalid_indicator_period_is_rejected() {
        assert!(ServiceFactory::create_pipeline(&config(&[("RSI_PERIOD", "0")])).is_err());
    }
}
