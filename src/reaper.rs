//! Reaper (spec §4.6): drains completed results from the cache into the
//! durable store, honoring at-least-once semantics via the durable store's
//! insert-ignore uniqueness on `trade_id`.

use anyhow::{Context, Result};
use redis::AsyncCommands;
use tracing::{error, info, warn};

use crate::broker::Broker;
use crate::durable::{insert_ignore_batch, TradeRow};
use crate::worker::result_wire::ResultEnvelope;

/// Durable-store insert batch size (spec §4.6 step 5).
const INSERT_BATCH_SIZE: usize = 5_000;

fn completion_pattern(runtime: &str) -> String {
    format!("{runtime}-task-meta-*")
}

/// Non-blocking scan of the result keyspace for keys matching the
/// completion prefix (spec §4.6 step 1). `SCAN` is used over `KEYS` so the
/// reaper never blocks the broker on a large keyspace.
async fn scan_result_keys(broker: &Broker, runtime: &str) -> Result<Vec<String>> {
    let mut conn = broker.queue();
    let pattern = completion_pattern(runtime);
    let mut keys = Vec::new();
    let mut iter: redis::AsyncIter<String> = conn
        .scan_match(pattern)
        .await
        .context("scanning result keyspace")?;
    while let Some(key) = iter.next_item().await {
        keys.push(key);
    }
    Ok(keys)
}

/// Parse one cached payload into a durable-store row, filtering out
/// anything that isn't a successful, well-formed result (spec §4.6 step 3).
fn to_trade_row(payload: &str) -> Option<TradeRow> {
    let envelope: ResultEnvelope = match serde_json::from_str(payload) {
        Ok(e) => e,
        Err(e) => {
            warn!(error = %e, "dropping malformed result payload");
            return None;
        }
    };

    if envelope.status != "SUCCESS" {
        return None;
    }

    let result = envelope.result;
    let net_profit = result.get("net_profit")?.as_f64()?;
    let trade_id = result.get("backtest_id")?.as_str()?.to_string();
    let stops_triggered = result.get("stops_triggered").and_then(|v| v.as_i64()).unwrap_or(0);
    let trades_triggered = result.get("trades_triggered").and_then(|v| v.as_i64()).unwrap_or(0);
    let average_holding_period = result
        .get("average_holding_period")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let trade_stats = result.get("trade_stats").cloned().unwrap_or(serde_json::json!({}));

    Some(TradeRow {
        trade_id,
        stops_triggered,
        trades_triggered,
        net_profit,
        average_holding_period,
        trade_stats,
    })
}

/// Run one reaper pass (spec §4.6): scan, bulk-read, filter, batch-insert,
/// then delete drained keys. A SQL error aborts the whole pass and leaves
/// every cache entry in place for the next run (at-least-once, spec §7).
pub async fn run_once(broker: &Broker, pool: &sqlx::MySqlPool, table: &str, runtime: &str) -> Result<usize> {
    let keys = scan_result_keys(broker, runtime).await?;
    if keys.is_empty() {
        return Ok(0);
    }

    let mut conn = broker.queue();
    let payloads: Vec<Option<String>> = conn.mget(&keys).await.context("bulk-reading result keyspace")?;

    let mut drained_keys = Vec::new();
    let mut rows = Vec::new();
    for (key, payload) in keys.into_iter().zip(payloads) {
        let Some(payload) = payload else { continue };
        if let Some(row) = to_trade_row(&payload) {
            drained_keys.push(key);
            rows.push(row);
        }
    }

    let mut total_drained = 0usize;
    for (key_chunk, row_chunk) in drained_keys.chunks(INSERT_BATCH_SIZE).zip(rows.chunks(INSERT_BATCH_SIZE)) {
        match insert_ignore_batch(pool, table, row_chunk).await {
            Ok(()) => {
                let _: () = conn.del(key_chunk).await.context("deleting drained result keys")?;
                total_drained += key_chunk.len();
            }
            Err(err) => {
                error!(error = %err, "aborting reaper batch, leaving cache entries for next run");
                return Err(err);
            }
        }
    }

    info!(total_drained, "reaper pass complete");
    Ok(total_drained)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_payload_with_net_profit_becomes_a_row() {
        let payload = serde_json::json!({
            "status": "SUCCESS",
            "task_id": "t1",
            "result": {
                "backtest_id": "aB3k9",
                "net_profit": 12.5,
                "stops_triggered": 1,
                "trades_triggered": 3,
                "average_holding_period": 45.0,
                "trade_stats": {"2023-04-24": {"st": 1, "tt": 3}},
            }
        })
        .to_string();

        let row = to_trade_row(&payload).unwrap();
        assert_eq!(row.trade_id, "aB3k9");
        assert_eq!(row.net_profit, 12.5);
        assert_eq!(row.stops_triggered, 1);
    }

    #[test]
    fn failure_status_is_dropped() {
        let payload = serde_json::json!({
            "status": "FAILURE",
            "task_id": "t1",
            "result": {"net_profit": 1.0, "backtest_id": "x"}
        })
        .to_string();
        assert!(to_trade_row(&payload).is_none());
    }

    #[test]
    fn missing_net_profit_is_dropped() {
        let payload = serde_json::json!({
            "status": "SUCCESS",
            "task_id": "t1",
            "result": {"backtest_id": "x"}
        })
        .to_string();
        assert!(to_trade_row(&payload).is_none());
    }

    #[test]
    fn malformed_json_is_dropped_not_fatal() {
        assert!(to_trade_row("not json").is_none());
    }
}
