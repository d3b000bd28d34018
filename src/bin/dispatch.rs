//! Task dispatcher entrypoint (spec §4.4): enumerate the strategy grid and
//! push one task message per sweep point onto the broker queue.

use anyhow::{Context, Result};
use orsweep::broker::Broker;
use orsweep::config::{init_logging, load_dotenv, RedisConfig};
use orsweep::dispatcher::{dispatch, Grid};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    init_logging();

    let redis_config = RedisConfig::from_env().context("loading redis configuration")?;
    let broker = Broker::connect(&redis_config).await?;

    let queue = std::env::var("TASK_QUEUE").unwrap_or_else(|_| "backtest".to_string());
    let origin = format!("{}@{}", std::process::id(), hostname());

    let grid = Grid::default();
    let total = dispatch(&broker, &grid, &queue, &origin).await?;

    info!(total, queue, "dispatch run complete");
    Ok(())
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}
