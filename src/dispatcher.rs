//! Parameter-sweep dispatcher (spec §4.4): enumerates the strategy grid and
//! pushes one task message per point onto the broker queue.

use anyhow::{Context, Result};
use redis::AsyncCommands;
use tracing::info;

use crate::broker::wire::encode_task;
use crate::broker::Broker;
use crate::domain::StrategyParams;

/// Accumulate this many pushes before flushing a pipelined round trip (spec
/// §4.4).
const FLUSH_BATCH_SIZE: usize = 1000;

/// The reference grid (spec §4.4). Integer counters are multiplied against
/// the step, never accumulated by repeated addition, so the 0.1 step on
/// `stop_distance` can't drift (spec §9).
pub struct Grid {
    pub limit_distance: (i64, i64, i64),
    pub stop_count_limit: (i64, i64, i64),
    pub stop_cooloff_period: (i64, i64, i64),
    pub stop_distance: (i64, i64, i64),
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            limit_distance: (1, 20, 1),
            stop_count_limit: (1, 4, 1),
            stop_cooloff_period: (30, 300, 30),
            stop_distance: (1, 20, 1),
        }
    }
}

fn axis(start: i64, stop_exclusive: i64, step: i64) -> impl Iterator<Item = i64> {
    let count = ((stop_exclusive - start) + step - 1) / step;
    (0..count).map(move |i| start + i * step)
}

/// Enumerate every sweep point in the grid, in `limit_distance ×
/// stop_count_limit × stop_cooloff_period × stop_distance` order (spec
/// §4.4). `stop_distance` is carried as tenths internally and divided by 10
/// on the way out, matching its 0.1 step.
pub fn enumerate_grid(grid: &Grid) -> impl Iterator<Item = StrategyParams> + '_ {
    let (ld0, ld1, lds) = grid.limit_distance;
    let (scl0, scl1, scls) = grid.stop_count_limit;
    let (sco0, sco1, scos) = grid.stop_cooloff_period;
    let (sd0, sd1, sds) = grid.stop_distance;

    axis(ld0, ld1, lds).flat_map(move |limit_distance| {
        axis(scl0, scl1, scls).flat_map(move |stop_count_limit| {
            axis(sco0, sco1, scos).flat_map(move |stop_cooloff_period| {
                axis(sd0, sd1, sds).map(move |stop_distance_tenths| StrategyParams {
                    stop_distance: stop_distance_tenths as f64 / 10.0,
                    stop_count_limit: stop_count_limit as i32,
                    stop_cooloff_period,
                    limit_distance: limit_distance as f64,
                })
            })
        })
    })
}

/// Push every point of `grid` onto `queue` as task messages, flushing a
/// pipeline every [`FLUSH_BATCH_SIZE`] pushes (spec §4.4). Returns the total
/// number of messages enqueued.
pub async fn dispatch(broker: &Broker, grid: &Grid, queue: &str, origin: &str) -> Result<u64> {
    let mut conn = broker.queue();
    let mut pipe = redis::pipe();
    let mut pending = 0usize;
    let mut total = 0u64;

    for params in enumerate_grid(grid) {
        let message = encode_task(&params, queue, origin).context("encoding task message")?;
        let payload = serde_json::to_string(&message).context("serializing task message")?;
        pipe.rpush(queue, payload);
        pending += 1;
        total += 1;

        if pending == FLUSH_BATCH_SIZE {
            let _: () = pipe
                .query_async(&mut conn)
                .await
                .context("flushing task pipeline")?;
            pipe = redis::pipe();
            pending = 0;
            info!(total, "flushed dispatcher batch");
        }
    }

    if pending > 0 {
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .context("flushing final task pipeline")?;
    }

    info!(total, "dispatch complete");
    Ok(total)
}
