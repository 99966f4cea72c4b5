use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{MarketError, QuoteSeries};

/// Source of daily price bars for a single symbol.
///
/// Implementations report transport problems, non-success statuses and empty
/// result sets as errors; the report engine turns those into per-ticker failures.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn daily_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<QuoteSeries, MarketError>;
}

/// Free-text generation backend used for AI-written reports.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, MarketError>;

    fn backend_name(&self) -> &'static str;
}
