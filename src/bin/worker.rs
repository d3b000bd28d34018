//! Backtest worker pool entrypoint (spec §4.5, §5): pulls tasks from the
//! shared queue until it stays empty for a while, then backs off.

use std::time::Duration;

use anyhow::{Context, Result};
use orsweep::broker::Broker;
use orsweep::config::{init_logging, load_dotenv, RedisConfig};
use orsweep::worker::poll_once;
use tracing::info;

const IDLE_BACKOFF: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    init_logging();

    let redis_config = RedisConfig::from_env().context("loading redis configuration")?;
    let broker = Broker::connect(&redis_config).await?;

    let queue = std::env::var("TASK_QUEUE").unwrap_or_else(|_| "backtest".to_string());
    let runtime = std::env::var("RUNTIME_NAME").unwrap_or_else(|_| "celery".to_string());

    info!(queue, runtime, "worker starting");

    loop {
        match poll_once(&broker, &queue, &runtime).await {
            Ok(true) => {}
            Ok(false) => tokio::time::sleep(IDLE_BACKOFF).await,
            Err(err) => {
                tracing::warn!(error = %err, "worker iteration failed, retrying after backoff");
                tokio::time::sleep(IDLE_BACKOFF).await;
            }
        }
    }
}
