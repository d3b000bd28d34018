//! Historical warehouse client (spec §6.5). The warehouse itself is an
//! external collaborator with no behavior specified here (spec §1); this
//! module only fixes the shape of the two queries the preparation stage
//! depends on, plus a `sqlx`-backed implementation usable against any store
//! exposing the reference schema for local development and integration
//! tests.

use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::domain::tick::{Tick, TickerTick};

/// Read-only access to historical per-second price data (spec §4.1, §6.5).
/// A warehouse is out of scope as a system (§1); this trait exists so the
/// preparation stage can be exercised against a fake in tests.
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Rows covering `[market_open_epoch, market_open_epoch +
    /// opening_range_duration]` for every ticker on `date`, used by the
    /// opening-range builder (spec §4.1).
    async fn opening_range_rows(
        &self,
        date: &str,
        market_open_epoch: i64,
        opening_range_duration: i64,
    ) -> anyhow::Result<Vec<TickerTick>>;

    /// Full intraday tick stream for a single ticker/date, ordered by
    /// `timestamp_utc`, used by the time-series compressor (spec §4.2).
    async fn intraday_rows(&self, ticker: &str, date: &str) -> anyhow::Result<Vec<Tick>>;
}

/// `sqlx`-backed warehouse client. Non-normative: the spec treats the
/// warehouse's actual schema as an external collaborator (§1); this
/// implementation assumes a single `ticks` table for local development and
/// integration testing against a disposable MySQL instance.
pub struct SqlWarehouseClient {
    pool: MySqlPool,
}

impl SqlWarehouseClient {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WarehouseClient for SqlWarehouseClient {
    async fn opening_range_rows(
        &self,
        date: &str,
        market_open_epoch: i64,
        opening_range_duration: i64,
    ) -> anyhow::Result<Vec<TickerTick>> {
        let window_end = market_open_epoch + opening_range_duration;
        let rows = sqlx::query_as::<_, (i64, String, f64)>(
            "SELECT timestamp_utc, ticker, underlying FROM ticks \
             WHERE date = ? AND timestamp_utc BETWEEN ? AND ? \
             ORDER BY timestamp_utc ASC",
        )
        .bind(date)
        .bind(market_open_epoch)
        .bind(window_end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(timestamp_utc, ticker, underlying)| TickerTick {
                timestamp_utc,
                ticker,
                underlying,
            })
            .collect())
    }

    async fn intraday_rows(&self, ticker: &str, date: &str) -> anyhow::Result<Vec<Tick>> {
        let rows = sqlx::query_as::<_, (i64, f64)>(
            "SELECT timestamp_utc, underlying FROM ticks \
             WHERE ticker = ? AND date = ? ORDER BY timestamp_utc ASC",
        )
        .bind(ticker)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(timestamp_utc, underlying)| Tick {
                timestamp_utc,
                underlying,
            })
            .collect())
    }
}
