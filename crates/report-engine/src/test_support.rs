//! In-memory doubles for the quote and generation seams.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use market_core::{MarketError, PriceBar, QuoteSeries, QuoteSource, TextGenerator};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn bar(day: i64, open: f64, close: f64) -> PriceBar {
    PriceBar {
        open,
        close,
        high: open.max(close) + 1.0,
        low: open.min(close) - 1.0,
        volume: 1_000_000,
        timestamp: DateTime::<Utc>::from_timestamp(1_704_153_600 + day * 86_400, 0).unwrap(),
    }
}

/// Two bars whose period change is `(close - open) / open`.
pub fn series(open: f64, close: f64) -> QuoteSeries {
    QuoteSeries {
        bars: vec![bar(0, open, open), bar(1, close, close)],
        status: Some("OK".to_string()),
    }
}

#[derive(Default)]
pub struct StaticQuotes {
    responses: HashMap<String, (Duration, Result<QuoteSeries, MarketError>)>,
    pub calls: AtomicUsize,
}

impl StaticQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: &str, response: Result<QuoteSeries, MarketError>) -> Self {
        self.responses.insert(symbol.to_string(), (Duration::ZERO, response));
        self
    }

    pub fn with_delay(
        mut self,
        symbol: &str,
        delay: Duration,
        response: Result<QuoteSeries, MarketError>,
    ) -> Self {
        self.responses.insert(symbol.to_string(), (delay, response));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for StaticQuotes {
    async fn daily_bars(
        &self,
        symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<QuoteSeries, MarketError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(symbol) {
            Some((delay, response)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                if symbol == "PANIC" {
                    panic!("quote source blew up");
                }
                response.clone()
            }
            None => Err(MarketError::NoData(format!("No data available for {}", symbol))),
        }
    }
}

pub struct ScriptedGenerator {
    response: Result<String, MarketError>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            response: Err(MarketError::GenerationError(reason.to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, MarketError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response.clone()
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}
