use serde::{Deserialize, Serialize};

/// Valuation and growth figures for one ticker.
///
/// Every field is optional: sources report what they have, and the signal
/// policy treats a missing figure as "not checked".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    /// Period-over-period revenue growth as a fraction (0.08 = +8%)
    pub revenue_growth: Option<f64>,
    /// Period-over-period net income growth as a fraction
    pub earnings_growth: Option<f64>,
}

impl Fundamentals {
    /// Build from a quote and the two most recent income statement periods
    pub fn from_statements(
        pe_ratio: Option<f64>,
        eps: Option<f64>,
        revenue: Option<(f64, f64)>,
        net_income: Option<(f64, f64)>,
    ) -> Self {
        Self {
            pe_ratio: pe_ratio.filter(|v| v.is_finite()),
            eps: eps.filter(|v| v.is_finite()),
            revenue_growth: revenue.and_then(|(prev, latest)| growth_between(prev, latest)),
            earnings_growth: net_income.and_then(|(prev, latest)| growth_between(prev, latest)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pe_ratio.is_none()
            && self.eps.is_none()
            && self.revenue_growth.is_none()
            && self.earnings_growth.is_none()
    }
}

/// Relative change from `previous` to `latest`; undefined when `previous` is zero
pub fn growth_between(previous: f64, latest: f64) -> Option<f64> {
    if !previous.is_finite() || !latest.is_finite() || previous == 0.0 {
        return None;
    }
    Some((latest - previous) / previous.abs())
}
