use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::rate::{RateFetcher, RateTable};

/// Fetches rate tables from the exchangerate-api.com `v4/latest` endpoint.
pub struct ExchangeRateApiFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl ExchangeRateApiFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("xconv/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(ExchangeRateApiFetcher {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    base: Option<String>,
    date: Option<NaiveDate>,
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateFetcher for ExchangeRateApiFetcher {
    #[instrument(
        name = "ExchangeRateFetch",
        skip(self),
        fields(base = %base)
    )]
    async fn fetch_rates(&self, base: &str) -> Result<RateTable> {
        let url = format!("{}/v4/latest/{}", self.base_url, base);
        debug!("Requesting rate table from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for base currency: {}", e, base))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for base currency: {}",
                response.status(),
                base
            ));
        }

        let text = response.text().await?;
        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", base, e))?;
        debug!(rates = data.rates.len(), date = ?data.date, "Received rate table");

        Ok(RateTable {
            base: data.base.unwrap_or_else(|| base.to_string()),
            as_of: data.date,
            rates: data.rates,
        })
    }
}
