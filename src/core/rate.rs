//! Exchange-rate table abstractions

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Rates for one base currency: how many units of each code one unit of
/// `base` buys.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    pub base: String,
    pub as_of: Option<NaiveDate>,
    pub rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn new(base: &str, rates: HashMap<String, f64>) -> Self {
        RateTable {
            base: base.to_string(),
            as_of: None,
            rates,
        }
    }

    /// Only finite, positive rates count as present.
    pub fn rate_for(&self, code: &str) -> Option<f64> {
        self.rates
            .get(code)
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }
}

#[async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch_rates(&self, base: &str) -> Result<RateTable>;
}
