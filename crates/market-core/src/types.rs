use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::MarketError;

/// Longest ticker symbol accepted from callers.
pub const MAX_SYMBOL_LEN: usize = 5;

/// A validated request for daily bars across one or more symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRequest {
    symbols: Vec<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl TickerRequest {
    /// Normalizes every symbol (trim + uppercase) and checks the date range.
    pub fn new<I, S>(symbols: I, start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, MarketError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = symbols
            .into_iter()
            .map(|s| normalize_symbol(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if symbols.is_empty() {
            return Err(MarketError::InvalidRequest("no tickers provided".to_string()));
        }

        if start_date > end_date {
            return Err(MarketError::InvalidRequest(format!(
                "start date {} is after end date {}",
                start_date, end_date
            )));
        }

        Ok(Self {
            symbols,
            start_date,
            end_date,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }
}

/// Trim and uppercase a caller-supplied ticker, rejecting anything that is not
/// 1-5 ASCII alphanumerics.
pub fn normalize_symbol(raw: &str) -> Result<String, MarketError> {
    let symbol = raw.trim().to_ascii_uppercase();

    if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN {
        return Err(MarketError::InvalidRequest(format!(
            "ticker '{}' must be 1-{} characters",
            raw.trim(),
            MAX_SYMBOL_LEN
        )));
    }

    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(MarketError::InvalidRequest(format!(
            "ticker '{}' must be alphanumeric",
            raw.trim()
        )));
    }

    Ok(symbol)
}

/// Daily OHLCV bar, serialized with the quote API's short keys.
///
/// Only `o`, `c` and `t` are required when decoding; the report reads nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "h", default)]
    pub high: f64,
    #[serde(rename = "l", default)]
    pub low: f64,
    #[serde(rename = "v", default, deserialize_with = "volume_from_number")]
    pub volume: u64,
    #[serde(rename = "t", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

// Volumes come back as JSON floats for some tickers (e.g. 7.0811e7).
fn volume_from_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw < 0.0 {
        return Err(serde::de::Error::custom(format!("invalid volume: {}", raw)));
    }
    Ok(raw.round() as u64)
}

/// Bars for one symbol as returned by a quote source.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSeries {
    pub bars: Vec<PriceBar>,
    pub status: Option<String>,
}

/// Outcome of fetching one ticker.
///
/// Wire form matches what the front-end sends back to `/api/ai-report`:
/// `{ticker, results, status}` on success and `{ticker, error}` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TickerResult {
    Success {
        #[serde(rename = "ticker")]
        symbol: String,
        #[serde(rename = "results")]
        bars: Vec<PriceBar>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },
    Failure {
        #[serde(rename = "ticker")]
        symbol: String,
        #[serde(rename = "error")]
        reason: String,
    },
}

impl TickerResult {
    pub fn success(symbol: impl Into<String>, series: QuoteSeries) -> Self {
        TickerResult::Success {
            symbol: symbol.into(),
            bars: series.bars,
            status: series.status,
        }
    }

    pub fn failure(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        TickerResult::Failure {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            TickerResult::Success { symbol, .. } | TickerResult::Failure { symbol, .. } => symbol,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TickerResult::Success { .. })
    }
}

/// Where a report's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    Ai,
    Fallback,
}

impl std::fmt::Display for ReportSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportSource::Ai => write!(f, "ai"),
            ReportSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Final report text for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub body: String,
    pub source: ReportSource,
}

impl Report {
    pub fn ai(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            source: ReportSource::Ai,
        }
    }

    pub fn fallback(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            source: ReportSource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_request_normalizes_symbols() {
        let req = TickerRequest::new([" aapl", "Tsla "], date("2024-01-02"), date("2024-01-05")).unwrap();
        assert_eq!(req.symbols(), &["AAPL".to_string(), "TSLA".to_string()]);
    }

    #[test]
    fn test_request_rejects_reversed_range() {
        let err = TickerRequest::new(["AAPL"], date("2024-01-05"), date("2024-01-02")).unwrap_err();
        assert!(matches!(err, MarketError::InvalidRequest(_)));
    }

    #[test]
    fn test_request_allows_single_day() {
        assert!(TickerRequest::new(["AAPL"], date("2024-01-05"), date("2024-01-05")).is_ok());
    }

    #[test]
    fn test_request_rejects_empty_list() {
        let empty: Vec<String> = Vec::new();
        assert!(TickerRequest::new(empty, date("2024-01-02"), date("2024-01-05")).is_err());
    }

    #[test]
    fn test_normalize_symbol_bounds() {
        assert_eq!(normalize_symbol("brk").unwrap(), "BRK");
        assert!(normalize_symbol("").is_err());
        assert!(normalize_symbol("   ").is_err());
        assert!(normalize_symbol("TOOLONG").is_err());
        assert!(normalize_symbol("BRK.B").is_err());
    }

    #[test]
    fn test_bar_decodes_float_volume() {
        let bar: PriceBar = serde_json::from_value(json!({
            "o": 185.0, "c": 186.5, "h": 187.2, "l": 184.1,
            "v": 7.0811e7, "vw": 185.9, "t": 1704171600000i64, "n": 1000
        }))
        .unwrap();

        assert_eq!(bar.volume, 70_811_000);
        assert_eq!(bar.timestamp.timestamp_millis(), 1704171600000);
    }

    #[test]
    fn test_bar_rejects_negative_volume() {
        let res: Result<PriceBar, _> = serde_json::from_value(json!({
            "o": 1.0, "c": 1.0, "h": 1.0, "l": 1.0, "v": -5.0, "t": 0
        }));
        assert!(res.is_err());
    }

    #[test]
    fn test_bar_accepts_open_close_only() {
        let bar: PriceBar = serde_json::from_value(json!({
            "o": 100.0, "c": 103.1, "t": 1704171600000i64
        }))
        .unwrap();

        assert_eq!(bar.open, 100.0);
        assert_eq!(bar.close, 103.1);
        assert_eq!(bar.high, 0.0);
        assert_eq!(bar.volume, 0);
    }

    #[test]
    fn test_ticker_result_wire_shapes() {
        let failure: TickerResult =
            serde_json::from_value(json!({"ticker": "ZZZZ", "error": "No data available for ZZZZ"})).unwrap();
        assert_eq!(failure, TickerResult::failure("ZZZZ", "No data available for ZZZZ"));

        let success: TickerResult = serde_json::from_value(json!({
            "ticker": "AAPL",
            "status": "OK",
            "results": [{"o": 100.0, "c": 103.1, "h": 104.0, "l": 99.5, "v": 1000, "t": 1704171600000i64}]
        }))
        .unwrap();
        assert!(success.is_success());
        assert_eq!(success.symbol(), "AAPL");

        let encoded = serde_json::to_value(&failure).unwrap();
        assert_eq!(encoded, json!({"ticker": "ZZZZ", "error": "No data available for ZZZZ"}));
    }

    #[test]
    fn test_ticker_result_rejects_unknown_shape() {
        let res: Result<TickerResult, _> = serde_json::from_value(json!({"ticker": "AAPL"}));
        assert!(res.is_err());
    }
}
