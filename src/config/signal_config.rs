//! Signal policy selection: preset, optional TOML file, then per-threshold overrides.

use super::{Lookup, parse_opt, parse_var};
use crate::application::signals::classifier::{PolicyPreset, SignalPolicy};
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SignalEnvConfig {
    pub preset: PolicyPreset,
    pub policy_file: Option<PathBuf>,
    /// Effective policy after file and overrides
    pub policy: SignalPolicy,
}

impl Default for SignalEnvConfig {
    fn default() -> Self {
        Self {
            preset: PolicyPreset::Balanced,
            policy_file: None,
            policy: SignalPolicy::default(),
        }
    }
}

impl SignalEnvConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let preset: PolicyPreset = parse_var(lookup, "SIGNAL_PRESET", PolicyPreset::Balanced)?;
        let policy_file = lookup("SIGNAL_POLICY_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(|p| PathBuf::from(p.trim()));

        let base = match &policy_file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read SIGNAL_POLICY_FILE {:?}", path))?;
                SignalPolicy::from_toml_str(&content)
                    .with_context(|| format!("Invalid signal policy in {:?}", path))?
            }
            None => SignalPolicy::preset(preset),
        };

        let policy = Self::apply_overrides(base, lookup)?;
        policy.validate().context("Signal policy overrides are inconsistent")?;

        Ok(Self {
            preset,
            policy_file,
            policy,
        })
    }

    fn apply_overrides(mut policy: SignalPolicy, lookup: Lookup<'_>) -> Result<SignalPolicy> {
        policy.min_rel_volume = parse_var(lookup, "MIN_REL_VOLUME", policy.min_rel_volume)?;
        if let Some(lo) = parse_opt(lookup, "RSI_MIN")? {
            policy.rsi_band.0 = lo;
        }
        if let Some(hi) = parse_opt(lookup, "RSI_MAX")? {
            policy.rsi_band.1 = hi;
        }
        policy.upper_band_proximity =
            parse_var(lookup, "UPPER_BAND_PROXIMITY", policy.upper_band_proximity)?;
        policy.probability_threshold =
            parse_var(lookup, "PROBABILITY_THRESHOLD", policy.probability_threshold)?;
        policy.min_buy_probability =
            parse_var(lookup, "MIN_BUY_PROBABILITY", policy.min_buy_probability)?;
        policy.win_rate_threshold =
            parse_var(lookup, "WIN_RATE_THRESHOLD", policy.win_rate_threshold)?;
        policy.require_fundamentals =
            parse_var(lookup, "REQUIRE_FUNDAMENTALS", policy.require_fundamentals)?;
        Ok(policy)
    }
}
