use crate::domain::screening::types::FeatureRow;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single model input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    Rsi,
    Macd,
    MacdSignal,
    BbHigh,
    BbLow,
    Return1d,
    Atr,
    RelVolume,
    Sma20,
    Sma50,
    Sma200,
    VolumeMa,
}

/// Default model input layout.
/// The order is part of the model contract: training and scoring rows must share it.
pub const DEFAULT_FEATURES: &[FeatureKind] = &[
    FeatureKind::Rsi,
    FeatureKind::Macd,
    FeatureKind::MacdSignal,
    FeatureKind::BbHigh,
    FeatureKind::BbLow,
    FeatureKind::Return1d,
    FeatureKind::Atr,
    FeatureKind::RelVolume,
];

impl FeatureKind {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureKind::Rsi => "RSI",
            FeatureKind::Macd => "MACD",
            FeatureKind::MacdSignal => "MACD_Signal",
            FeatureKind::BbHigh => "BB_High",
            FeatureKind::BbLow => "BB_Low",
            FeatureKind::Return1d => "Return_1d",
            FeatureKind::Atr => "ATR",
            FeatureKind::RelVolume => "Rel_Volume",
            FeatureKind::Sma20 => "SMA_20",
            FeatureKind::Sma50 => "SMA_50",
            FeatureKind::Sma200 => "SMA_200",
            FeatureKind::VolumeMa => "Volume_MA",
        }
    }

    pub fn value(&self, row: &FeatureRow) -> f64 {
        match self {
            FeatureKind::Rsi => row.rsi,
            FeatureKind::Macd => row.macd,
            FeatureKind::MacdSignal => row.macd_signal,
            FeatureKind::BbHigh => row.bb_high,
            FeatureKind::BbLow => row.bb_low,
            FeatureKind::Return1d => row.return_1d,
            FeatureKind::Atr => row.atr,
            FeatureKind::RelVolume => row.rel_volume,
            FeatureKind::Sma20 => row.sma_20,
            FeatureKind::Sma50 => row.sma_50,
            FeatureKind::Sma200 => row.sma_200,
            FeatureKind::VolumeMa => row.volume_ma,
        }
    }
}

impl FromStr for FeatureKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rsi" => Ok(FeatureKind::Rsi),
            "macd" => Ok(FeatureKind::Macd),
            "macd_signal" => Ok(FeatureKind::MacdSignal),
            "bb_high" => Ok(FeatureKind::BbHigh),
            "bb_low" => Ok(FeatureKind::BbLow),
            "return_1d" => Ok(FeatureKind::Return1d),
            "atr" => Ok(FeatureKind::Atr),
            "rel_volume" => Ok(FeatureKind::RelVolume),
            "sma_20" => Ok(FeatureKind::Sma20),
            "sma_50" => Ok(FeatureKind::Sma50),
            "sma_200" => Ok(FeatureKind::Sma200),
            "volume_ma" => Ok(FeatureKind::VolumeMa),
            _ => Err(anyhow!("Unknown feature: '{}'", s)),
        }
    }
}

/// Parse a comma-separated feature list, keeping the given order and dropping duplicates
pub fn parse_feature_list(raw: &str) -> Result<Vec<FeatureKind>> {
    let mut kinds = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let kind = FeatureKind::from_str(part)?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        return Err(anyhow!("Feature list is empty"));
    }
    Ok(kinds)
}

/// Converts a row into a model input vector in the order given by `kinds`.
pub fn features_to_vector(row: &FeatureRow, kinds: &[FeatureKind]) -> Vec<f64> {
    kinds.iter().map(|k| k.value(row)).collect()
}

pub fn feature_names(kinds: &[FeatureKind]) -> Vec<&'static str> {
    kinds.iter().map(FeatureKind::name).collect()
}
