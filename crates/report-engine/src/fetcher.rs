use chrono::NaiveDate;
use futures_util::stream::{FuturesUnordered, StreamExt};
use market_core::{QuoteSource, TickerRequest, TickerResult};
use std::sync::Arc;

use crate::aggregator::aggregate;

/// Fetch every requested symbol concurrently and return results in input order.
///
/// Each symbol runs in its own spawned task, so a slow or failing ticker never
/// holds back the others. Tasks are detached: dropping this future does not
/// cancel fetches already in flight.
pub async fn fetch_all(source: Arc<dyn QuoteSource>, request: &TickerRequest) -> Vec<TickerResult> {
    let from = request.start_date();
    let to = request.end_date();

    let mut pending: FuturesUnordered<_> = request
        .symbols()
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, symbol)| {
            let source = Arc::clone(&source);
            let task_symbol = symbol.clone();
            let handle = tokio::spawn(async move {
                fetch_one(source.as_ref(), &task_symbol, from, to).await
            });

            async move {
                let result = handle.await.unwrap_or_else(|e| {
                    tracing::error!("Fetch task for {} did not complete: {}", symbol, e);
                    TickerResult::failure(
                        symbol.as_str(),
                        format!("Failed to fetch data for {}: internal error", symbol),
                    )
                });
                (index, result)
            }
        })
        .collect();

    let mut outcomes = Vec::with_capacity(request.symbols().len());
    while let Some(outcome) = pending.next().await {
        outcomes.push(outcome);
    }

    aggregate(request.symbols(), outcomes)
}

async fn fetch_one(source: &dyn QuoteSource, symbol: &str, from: NaiveDate, to: NaiveDate) -> TickerResult {
    match source.daily_bars(symbol, from, to).await {
        Ok(series) if !series.bars.is_empty() => {
            tracing::debug!("Fetched {} bars for {}", series.bars.len(), symbol);
            TickerResult::success(symbol, series)
        }
        Ok(_) => {
            tracing::warn!("No data available for {}", symbol);
            TickerResult::failure(symbol, format!("No data available for {}", symbol))
        }
        Err(e) => {
            tracing::warn!("Error fetching data for {}: {}", symbol, e);
            TickerResult::failure(symbol, e.reason())
        }
    }
}
