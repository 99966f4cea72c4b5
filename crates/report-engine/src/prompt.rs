use market_core::TickerResult;

/// Characters of serialized stock data embedded in the default prompt.
pub const STOCK_DATA_PREVIEW_CHARS: usize = 1000;

/// Default instruction prompt for callers that don't bring their own.
pub fn build_default_prompt(results: &[TickerResult]) -> String {
    let data = serde_json::to_string(results).unwrap_or_default();
    let preview: String = data.chars().take(STOCK_DATA_PREVIEW_CHARS).collect();

    format!(
        "You are a high-energy trading guru. Read the stock data below and write a brief, upbeat \
report of about 150 words with a buy, sell or hold call for each ticker. Keep the tone lively, \
like \"this stock is on fire!\" or \"hold tight, we're heading for the moon!\":\n\n\
Stock Data:\n{}...\n\n\
Give a specific recommendation for every stock along with your reasoning.",
        preview
    )
}
