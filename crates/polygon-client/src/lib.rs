use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::{MarketError, PriceBar, QuoteSeries, QuoteSource};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const BASE_URL: &str = "https://api.polygon.io";

/// Connection settings for the Polygon REST API.
#[derive(Debug, Clone)]
pub struct PolygonConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl PolygonConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl PolygonClient {
    pub fn new(config: PolygonConfig) -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MarketError::Unknown(format!("Failed to build Polygon HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config.api_key,
            base_url: config.base_url,
            client,
        })
    }

    /// Get aggregates (bars) for a symbol, oldest first.
    ///
    /// Transport errors, non-success statuses and empty result sets all come
    /// back as errors whose `reason()` names the symbol.
    pub async fn get_aggregates(
        &self,
        symbol: &str,
        multiplier: u32,
        timespan: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<QuoteSeries, MarketError> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            self.base_url,
            symbol,
            multiplier,
            timespan,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        tracing::debug!("Fetching {} {} bars for {} ({} to {})", multiplier, timespan, symbol, from, to);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("adjusted", "true"),
                ("sort", "asc"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                MarketError::ApiError(format!(
                    "Failed to fetch data for {}: {}",
                    symbol,
                    // reqwest includes the URL (and with it the API key) in its Display output
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Polygon returned HTTP {} for {}", status, symbol);
            return Err(MarketError::ApiError(format!(
                "Failed to fetch data for {}: {}",
                symbol,
                status.as_u16()
            )));
        }

        let body = response.text().await.map_err(|e| {
            MarketError::ApiError(format!("Failed to fetch data for {}: {}", symbol, e.without_url()))
        })?;

        decode_aggregates(symbol, &body)
    }
}

#[async_trait]
impl QuoteSource for PolygonClient {
    async fn daily_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<QuoteSeries, MarketError> {
        self.get_aggregates(symbol, 1, "day", from, to).await
    }
}

/// Decode an aggregates body into a non-empty, chronologically sorted series.
pub fn decode_aggregates(symbol: &str, body: &str) -> Result<QuoteSeries, MarketError> {
    let agg_response: AggregateResponse = serde_json::from_str(body).map_err(|e| {
        MarketError::ApiError(format!("Failed to fetch data for {}: invalid response ({})", symbol, e))
    })?;

    let mut bars = agg_response.results.unwrap_or_default();
    if bars.is_empty() {
        return Err(MarketError::NoData(format!("No data available for {}", symbol)));
    }

    // Requested with sort=asc, but the series invariant is ours to keep.
    bars.sort_by_key(|b| b.timestamp);

    Ok(QuoteSeries {
        bars,
        status: agg_response.status,
    })
}

// Response structures
#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    results: Option<Vec<PriceBar>>,
}
