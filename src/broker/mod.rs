//! Broker connection handles (spec §6.3) and the task-queue wire format
//! (§6.2).
//!
//! The broker is namespaced by Redis DB index rather than key prefix: DB 0
//! carries the task queue and result keyspace, DB 1 the opening ranges, DB
//! 2 the compressed series. Each gets its own [`redis::aio::ConnectionManager`],
//! which multiplexes and auto-reconnects, so cloning a handle is cheap and
//! safe to hand to every worker task.

pub mod wire;

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;

use crate::config::RedisConfig;

#[derive(Clone)]
pub struct Broker {
    queue: ConnectionManager,
    opening_ranges: ConnectionManager,
    series: ConnectionManager,
}

impl Broker {
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let queue = connect_db(config, 0).await?;
        let opening_ranges = connect_db(config, 1).await?;
        let series = connect_db(config, 2).await?;
        Ok(Self {
            queue,
            opening_ranges,
            series,
        })
    }

    /// DB 0: task queue lists and `<runtime>-task-meta-*` result keys.
    pub fn queue(&self) -> ConnectionManager {
        self.queue.clone()
    }

    /// DB 1: `<YYYY-MM-DD>` -> `OpeningRange`.
    pub fn opening_ranges(&self) -> ConnectionManager {
        self.opening_ranges.clone()
    }

    /// DB 2: `<YYYY-MM-DD>` -> `CompressedSeries`.
    pub fn series(&self) -> ConnectionManager {
        self.series.clone()
    }
}

async fn connect_db(config: &RedisConfig, db: u8) -> Result<ConnectionManager> {
    let client = redis::Client::open(config.url(db))
        .with_context(|| format!("invalid redis connection string for db {db}"))?;
    client
        .get_connection_manager()
        .await
        .with_context(|| format!("failed to connect to redis db {db}"))
}
