//! Backtest worker (spec §4.5): dequeues a sweep point, loads every staged
//! date's inputs, runs the breakout state machine per day, and writes the
//! result back to the results keyspace.

pub mod breakout;
pub mod result_wire;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use redis::AsyncCommands;
use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::broker::wire::{decode_task, TaskMessage};
use crate::broker::Broker;
use crate::domain::{generate_backtest_id, BacktestResult, CompressedSeries, OpeningRange};
use crate::error::PipelineError;

const MAX_CONCURRENT_LOADS: usize = 100;

/// Enumerate every staged date by scanning the series namespace (DB 2),
/// since every staged date has a compressed series entry (spec §4.5).
async fn staged_dates(broker: &Broker) -> Result<Vec<String>> {
    let mut conn = broker.series();
    let keys: Vec<String> = conn.keys("*").await.context("scanning staged dates")?;
    Ok(keys)
}

async fn load_range(broker: &Broker, date: &str) -> Result<OpeningRange> {
    let mut conn = broker.opening_ranges();
    let payload: Option<String> = conn.get(date).await.context("fetching opening range")?;
    let payload = payload.ok_or_else(|| PipelineError::DataAbsent(date.to_string()))?;
    serde_json::from_str(&payload)
        .map_err(|e| PipelineError::Malformed(format!("opening range for {date}: {e}")).into())
}

async fn load_series(broker: &Broker, date: &str) -> Result<CompressedSeries> {
    let mut conn = broker.series();
    let payload: Option<String> = conn.get(date).await.context("fetching compressed series")?;
    let payload = payload.ok_or_else(|| PipelineError::DataAbsent(date.to_string()))?;
    serde_json::from_str(&payload)
        .map_err(|e| PipelineError::Malformed(format!("compressed series for {date}: {e}")).into())
}

/// Run the breakout simulation for one sweep point across every staged
/// date and fold the per-day results into a [`BacktestResult`] (spec §4.5).
/// A missing opening range for a staged date is fatal for the whole task
/// (spec §7): the worker does not fabricate defaults.
pub async fn run_backtest(
    broker: &Broker,
    params: crate::domain::StrategyParams,
) -> Result<BacktestResult> {
    let dates = staged_dates(broker).await?;

    let by_day_pairs: Vec<(String, crate::domain::DayResult)> = stream::iter(dates.into_iter().map(|date| {
        async move {
            let range = load_range(broker, &date).await?;
            let series = load_series(broker, &date).await?;
            let day_result = breakout::simulate_day(&range, &series, &params);
            Ok::<_, anyhow::Error>((date, day_result))
        }
    }))
    .buffer_unordered(MAX_CONCURRENT_LOADS)
    .try_collect()
    .await?;

    let by_day: std::collections::BTreeMap<_, _> = by_day_pairs.into_iter().collect();
    let (backtest_profit, average_holding_period, win_rate_percent) = aggregate(&by_day);

    Ok(BacktestResult {
        backtest_id: generate_backtest_id(),
        params,
        by_day,
        backtest_profit,
        average_holding_period,
        win_rate_percent,
    })
}

/// Pop one task message off `queue`, run it to completion, and write the
/// result into the results keyspace (spec §4.5, §6.3). Returns `false` when
/// the queue was empty so the caller can back off.
pub async fn poll_once(broker: &Broker, queue: &str, runtime: &str) -> Result<bool> {
    let mut conn = broker.queue();
    let payload: Option<String> = conn.lpop(queue, None).await.context("popping task queue")?;
    let Some(payload) = payload else {
        return Ok(false);
    };

    let message: TaskMessage = serde_json::from_str(&payload).context("parsing task message")?;
    let task_id = message.headers["id"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let params = decode_task(&message).context("decoding task kwargs")?;

    match run_backtest(broker, params).await {
        Ok(result) => {
            let envelope = result_wire::success_envelope(&task_id, &result);
            let key = format!("{runtime}-task-meta-{task_id}");
            let mut conn = broker.queue();
            let body = serde_json::to_string(&envelope).context("serializing result envelope")?;
            let _: () = conn.set(&key, body).await.context("writing result")?;
            info!(task_id, backtest_id = %result.backtest_id, "task completed");
        }
        Err(err) => {
            warn!(task_id, error = %err, "task failed");
        }
    }

    Ok(true)
}
