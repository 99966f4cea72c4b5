use market_core::{MarketError, TextGenerator, TickerResult};
use std::sync::Arc;

use crate::prompt::build_default_prompt;

/// Generated text must be longer than this (after trimming) to count as a report.
pub const MIN_REPORT_CHARS: usize = 50;

/// Single-shot AI report attempt. Every failure comes back as `Err` so the
/// caller can substitute the fallback; nothing is retried.
#[derive(Clone, Default)]
pub struct AiReporter {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl AiReporter {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Ask the generator for a report. A blank `prompt` is replaced by the
    /// default prompt built from `results`.
    pub async fn try_report(&self, results: &[TickerResult], prompt: &str) -> Result<String, MarketError> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| MarketError::GenerationError("no text generator configured".to_string()))?;

        let prompt = if prompt.trim().is_empty() {
            build_default_prompt(results)
        } else {
            prompt.to_string()
        };

        tracing::debug!(
            "Requesting AI report from {} for {} tickers",
            generator.backend_name(),
            results.len()
        );

        let text = generator.generate(&prompt).await?;
        accept_generated(&text)
    }
}

fn accept_generated(text: &str) -> Result<String, MarketError> {
    let trimmed = text.trim();
    let chars = trimmed.chars().count();

    if chars <= MIN_REPORT_CHARS {
        return Err(MarketError::GenerationError(format!(
            "generated text too short ({} chars)",
            chars
        )));
    }

    Ok(trimmed.to_string())
}
