//! Reaper entrypoint (spec §4.6): drains the results keyspace into the
//! durable store on a fixed schedule.

use std::time::Duration;

use anyhow::{Context, Result};
use orsweep::broker::Broker;
use orsweep::config::{init_logging, load_dotenv, DurableStoreConfig, RedisConfig};
use orsweep::durable::connect;
use orsweep::reaper::run_once;
use tracing::{error, info};

const POLL_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    init_logging();

    let redis_config = RedisConfig::from_env().context("loading redis configuration")?;
    let durable_config = DurableStoreConfig::from_env().context("loading durable store configuration")?;

    let broker = Broker::connect(&redis_config).await?;
    let pool = connect(&durable_config).await?;
    let runtime = std::env::var("RUNTIME_NAME").unwrap_or_else(|_| "celery".to_string());

    info!(table = %durable_config.table, "reaper starting");

    loop {
        match run_once(&broker, &pool, &durable_config.table, &runtime).await {
            Ok(drained) => info!(drained, "reaper pass complete"),
            Err(err) => error!(error = %err, "reaper pass aborted"),
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
