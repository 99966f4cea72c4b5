use market_core::{QuoteSource, Report, TextGenerator, TickerRequest, TickerResult};
use std::sync::Arc;

pub mod aggregator;
pub mod ai_reporter;
pub mod fallback;
pub mod fetcher;
pub mod prompt;

#[cfg(test)]
mod test_support;

pub use aggregator::aggregate;
pub use ai_reporter::{AiReporter, MIN_REPORT_CHARS};
pub use fallback::{fallback_report, period_change, Band};
pub use fetcher::fetch_all;
pub use prompt::build_default_prompt;

/// Runs the report pipeline: fetch every ticker, then try the AI writer and
/// fall back to the templated analysis.
#[derive(Clone)]
pub struct ReportOrchestrator {
    quotes: Arc<dyn QuoteSource>,
    ai_reporter: AiReporter,
}

impl ReportOrchestrator {
    pub fn new(quotes: Arc<dyn QuoteSource>, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            quotes,
            ai_reporter: AiReporter::new(generator),
        }
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai_reporter.is_enabled()
    }

    /// Fetch daily bars for every symbol, in request order.
    pub async fn fetch_stock_data(&self, request: &TickerRequest) -> Vec<TickerResult> {
        tracing::info!(
            "Fetching {} tickers from {} to {}",
            request.symbols().len(),
            request.start_date(),
            request.end_date()
        );

        let results = fetch_all(Arc::clone(&self.quotes), request).await;

        let failed = results.iter().filter(|r| !r.is_success()).count();
        if failed > 0 {
            tracing::warn!("{} of {} tickers failed to fetch", failed, results.len());
        }

        results
    }

    /// Produce a report for already-fetched results. Never fails: any AI
    /// problem yields the fallback analysis instead.
    pub async fn generate_report(&self, results: &[TickerResult], prompt: &str) -> Report {
        let report = self
            .ai_reporter
            .try_report(results, prompt)
            .await
            .map(Report::ai)
            .unwrap_or_else(|e| {
                if self.ai_enabled() {
                    tracing::warn!("AI report failed, falling back to local analysis: {}", e);
                } else {
                    tracing::debug!("AI report disabled, using local analysis");
                }
                Report::fallback(fallback_report(results))
            });

        tracing::info!("Generated {} report for {} tickers", report.source, results.len());
        report
    }

    /// Whole pipeline with the default prompt.
    pub async fn run(&self, request: &TickerRequest) -> (Vec<TickerResult>, Report) {
        let results = self.fetch_stock_data(request).await;
        let report = self.generate_report(&results, "").await;
        (results, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, series, ScriptedGenerator, StaticQuotes};
    use market_core::{MarketError, ReportSource};

    const AI_TEXT: &str = "Both names look healthy this week; hold your positions and keep an eye on volume.";

    fn request(symbols: &[&str]) -> TickerRequest {
        TickerRequest::new(symbols.iter().copied(), date("2024-01-02"), date("2024-01-05")).unwrap()
    }

    fn quotes() -> Arc<StaticQuotes> {
        Arc::new(
            StaticQuotes::new()
                .with("AAPL", Ok(series(100.0, 103.1)))
                .with("TSLA", Ok(series(250.0, 249.0))),
        )
    }

    #[tokio::test]
    async fn test_run_without_ai_uses_fallback() {
        let orchestrator = ReportOrchestrator::new(quotes(), None);
        assert!(!orchestrator.ai_enabled());

        let (results, report) = orchestrator.run(&request(&["AAPL", "TSLA"])).await;
        assert_eq!(results.len(), 2);
        assert_eq!(report.source, ReportSource::Fallback);

        let surge = report.body.find("AAPL is on fire with a 3.1% surge").unwrap();
        let dip = report.body.find("TSLA slipped 0.4%").unwrap();
        assert!(surge < dip);
    }

    #[tokio::test]
    async fn test_ai_text_used_when_good() {
        let generator = Arc::new(ScriptedGenerator::replying(AI_TEXT));
        let orchestrator = ReportOrchestrator::new(quotes(), Some(generator.clone()));

        let (_, report) = orchestrator.run(&request(&["AAPL", "TSLA"])).await;
        assert_eq!(report, Report::ai(AI_TEXT));
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_short_ai_text_falls_back() {
        let generator = Arc::new(ScriptedGenerator::replying("Buy."));
        let orchestrator = ReportOrchestrator::new(quotes(), Some(generator));
        let results = vec![TickerResult::success("AAPL", series(100.0, 103.1))];

        let report = orchestrator.generate_report(&results, "custom prompt").await;
        assert_eq!(report, Report::fallback(fallback_report(&results)));
    }

    #[tokio::test]
    async fn test_ai_error_falls_back() {
        let generator = Arc::new(ScriptedGenerator::failing("Status: 503"));
        let orchestrator = ReportOrchestrator::new(quotes(), Some(generator.clone()));
        let results = vec![TickerResult::failure("ZZZZ", "No data available for ZZZZ")];

        let report = orchestrator.generate_report(&results, "custom prompt").await;
        assert_eq!(report.source, ReportSource::Fallback);
        assert!(report.body.contains("ZZZZ - No data available for ZZZZ"));
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_custom_prompt_forwarded_verbatim() {
        let generator = Arc::new(ScriptedGenerator::replying(AI_TEXT));
        let orchestrator = ReportOrchestrator::new(quotes(), Some(generator.clone()));

        orchestrator.generate_report(&[], "custom prompt").await;
        assert_eq!(generator.prompts.lock().unwrap()[0], "custom prompt");
    }

    #[tokio::test]
    async fn test_empty_result_ticker_only_failure_line() {
        let quotes = Arc::new(StaticQuotes::new().with("ZZZZ", Err(MarketError::NoData("No data available for ZZZZ".to_string()))));
        let orchestrator = ReportOrchestrator::new(quotes, None);

        let (results, report) = orchestrator.run(&request(&["ZZZZ"])).await;
        assert_eq!(results, vec![TickerResult::failure("ZZZZ", "No data available for ZZZZ")]);
        assert_eq!(report.body, fallback_report(&results));
        assert_eq!(report.body.matches("\n\n").count(), 2);
    }
}
