use market_core::TickerResult;

/// Reassemble index-tagged fetch outcomes into the caller's ticker order.
///
/// `outcomes` may arrive in any order. A slot that never received an outcome
/// becomes a failure for its symbol so the output always lines up 1:1 with
/// `symbols`.
pub fn aggregate(symbols: &[String], outcomes: Vec<(usize, TickerResult)>) -> Vec<TickerResult> {
    let mut slots: Vec<Option<TickerResult>> = vec![None; symbols.len()];

    for (index, result) in outcomes {
        match slots.get_mut(index) {
            Some(slot) => *slot = Some(result),
            None => tracing::error!(
                "Dropping fetch outcome for {} with out-of-range index {}",
                result.symbol(),
                index
            ),
        }
    }

    slots
        .into_iter()
        .zip(symbols)
        .map(|(slot, symbol)| {
            slot.unwrap_or_else(|| {
                TickerResult::failure(symbol.as_str(), format!("No result recorded for {}", symbol))
            })
        })
        .collect()
}
