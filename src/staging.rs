//! Staging writer (spec §4.3): uploads opening ranges and compressed series
//! into their respective broker namespaces, bounded to 100 outstanding
//! writes per batch so a single prep run never exhausts the broker's
//! connection pool.

use std::collections::HashMap;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use redis::AsyncCommands;

use crate::broker::Broker;
use crate::domain::{CompressedSeries, OpeningRange};

/// Matches the batching in the reference preparation stage: stream futures
/// through with bounded concurrency rather than spawning all of them at
/// once.
const MAX_CONCURRENT_WRITES: usize = 100;

/// Write one ticker's full `date -> OpeningRange` map to DB 1 (spec §6.3).
pub async fn stage_opening_ranges(
    broker: &Broker,
    ranges: &HashMap<String, OpeningRange>,
) -> Result<()> {
    stream::iter(ranges.iter().map(|(date, range)| {
        let mut conn = broker.opening_ranges();
        async move {
            let payload =
                serde_json::to_string(range).with_context(|| format!("serializing range for {date}"))?;
            let _: () = conn
                .set(date, payload)
                .await
                .with_context(|| format!("writing opening range for {date}"))?;
            Ok::<(), anyhow::Error>(())
        }
    }))
    .buffer_unordered(MAX_CONCURRENT_WRITES)
    .try_collect()
    .await
}

/// Write one ticker's full `date -> CompressedSeries` map to DB 2 (spec
/// §6.3).
pub async fn stage_series(
    broker: &Broker,
    series_by_date: &HashMap<String, CompressedSeries>,
) -> Result<()> {
    stream::iter(series_by_date.iter().map(|(date, series)| {
        let mut conn = broker.series();
        async move {
            let payload = serde_json::to_string(series)
                .with_context(|| format!("serializing series for {date}"))?;
            let _: () = conn
                .set(date, payload)
                .await
                .with_context(|| format!("writing compressed series for {date}"))?;
            Ok::<(), anyhow::Error>(())
        }
    }))
    .buffer_unordered(MAX_CONCURRENT_WRITES)
    .try_collect()
    .await
}
