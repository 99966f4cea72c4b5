//! Rule-based report used whenever AI generation is unavailable.
//!
//! Each ticker's period change (first open to last close) falls into exactly
//! one [`Band`]; the band picks the wording. The output depends only on the
//! input slice.

use market_core::{PriceBar, TickerResult};

const INTRO: &str = "Hey there, market mover! 🚀 Here's what your tickers have been up to:";
const CLOSING: &str = "Remember: markets are wild beasts! This is a playful read of recent prices, \
not financial advice - always do your own homework before making moves! 💰🎯";

/// Bands by period change in percent. Upper edges belong to the lower band on
/// the positive side; the minor dip band is closed on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// change > +2%
    Surge,
    /// 0% < change <= +2%
    SteadyGain,
    /// -2% <= change <= 0%
    MinorDip,
    /// change < -2%
    Decline,
}

impl Band {
    pub fn classify(change_pct: f64) -> Self {
        if change_pct > 2.0 {
            Band::Surge
        } else if change_pct > 0.0 {
            Band::SteadyGain
        } else if change_pct >= -2.0 {
            Band::MinorDip
        } else {
            Band::Decline
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Band::Surge => "surge",
            Band::SteadyGain => "steady gain",
            Band::MinorDip => "minor dip",
            Band::Decline => "decline",
        }
    }
}

/// Percentage change from the first bar's open to the last bar's close.
///
/// `None` when there are no bars or the opening price can't anchor a ratio.
pub fn period_change(bars: &[PriceBar]) -> Option<f64> {
    let first = bars.first()?;
    let last = bars.last()?;

    if !first.open.is_finite() || first.open <= 0.0 {
        return None;
    }

    let change = (last.close - first.open) / first.open * 100.0;
    change.is_finite().then_some(change)
}

fn band_line(symbol: &str, change: f64) -> String {
    let band = Band::classify(change);
    tracing::debug!("{} changed {:.2}% over the period ({})", symbol, change, band.label());

    match band {
        Band::Surge => format!(
            "🔥 {} is on fire with a {:.1}% surge! Momentum is on your side - HOLD tight or BUY more if you're feeling bold!",
            symbol, change
        ),
        Band::SteadyGain => format!(
            "📈 {} is climbing steadily, up {:.1}%. Solid work - HOLD your position and let it ride.",
            symbol, change
        ),
        Band::MinorDip => format!(
            "📉 {} slipped {:.1}% - that could be a golden buying opportunity. HOLD or BUY the dip!",
            symbol,
            change.abs()
        ),
        Band::Decline => format!(
            "⚠️ {} took a hit, down {:.1}%. Time to decide: HOLD for the comeback or SELL to protect your portfolio?",
            symbol,
            change.abs()
        ),
    }
}

fn ticker_line(result: &TickerResult) -> Option<String> {
    match result {
        TickerResult::Failure { symbol, reason } => {
            Some(format!("❌ Couldn't pull data for {} - {}", symbol, reason))
        }
        TickerResult::Success { bars, .. } if bars.is_empty() => None,
        TickerResult::Success { symbol, bars, .. } => Some(match period_change(bars) {
            Some(change) => band_line(symbol, change),
            None => format!(
                "❔ {} came back without a usable opening price, so no call on this one.",
                symbol
            ),
        }),
    }
}

/// Build the templated report for `results`, one line per ticker in order.
pub fn fallback_report(results: &[TickerResult]) -> String {
    let mut analysis = String::with_capacity(256 + results.len() * 160);
    analysis.push_str(INTRO);
    analysis.push_str("\n\n");

    for line in results.iter().filter_map(ticker_line) {
        analysis.push_str(&line);
        analysis.push_str("\n\n");
    }

    analysis.push_str(CLOSING);
    analysis
}
