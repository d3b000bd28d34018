//! Durable relational store (spec §6.4): connection pool and the
//! insert-ignore batch write the reaper uses to drain results.

use anyhow::{Context, Result};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;

use crate::config::DurableStoreConfig;

/// One row destined for the durable store (spec §6.4).
#[derive(Debug, Clone)]
pub struct TradeRow {
    pub trade_id: String,
    pub stops_triggered: i64,
    pub trades_triggered: i64,
    pub net_profit: f64,
    pub average_holding_period: f64,
    pub trade_stats: serde_json::Value,
}

/// Connect to the durable store, matching the teacher's pool sizing
/// convention.
pub async fn connect(config: &DurableStoreConfig) -> Result<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .connect(&config.connection_url())
        .await
        .context("connecting to durable store")
}

/// Batch-insert up to 5,000 rows with insert-ignore semantics on the
/// unique `trade_id` key (spec §4.6 step 5). A duplicate `trade_id` is
/// silently skipped, which is what makes the reaper idempotent across
/// crash-and-retry (spec §4.6, invariant 6 of §8).
pub async fn insert_ignore_batch(pool: &MySqlPool, table: &str, rows: &[TradeRow]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await.context("starting reaper insert transaction")?;

    for row in rows {
        let query = format!(
            "INSERT IGNORE INTO {table} \
             (trade_id, stops_triggered, trades_triggered, net_profit, average_holding_period, trade_stats) \
             VALUES (?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&query)
            .bind(&row.trade_id)
            .bind(row.stops_triggered)
            .bind(row.trades_triggered)
            .bind(row.net_profit)
            .bind(row.average_holding_period)
            .bind(&row.trade_stats)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("inserting trade_id {}", row.trade_id))?;
    }

    tx.commit().await.context("committing reaper insert batch")
}
