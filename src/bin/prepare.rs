//! Data-preparation entrypoint (spec §4.1-§4.3): query the warehouse for a
//! ticker/date range, derive opening ranges and compressed series, stage
//! both in the broker.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use orsweep::broker::Broker;
use orsweep::config::{load_dotenv, init_logging, PrepConfig, RedisConfig, WarehouseConfig};
use orsweep::domain::opening_range::build_opening_ranges;
use orsweep::domain::series::compress;
use orsweep::domain::tick::TickerTick;
use orsweep::error::PipelineError;
use orsweep::staging::{stage_opening_ranges, stage_series};
use orsweep::warehouse::{SqlWarehouseClient, WarehouseClient};
use sqlx::mysql::MySqlPoolOptions;
use tracing::info;

fn env_list(key: &str) -> Result<Vec<String>> {
    std::env::var(key)
        .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
        .map_err(|_| PipelineError::ConfigAbsent(key.to_string()).into())
}

fn market_open_epoch(date: &str, offset_seconds: i64) -> Result<i64> {
    let naive = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("parsing date {date}"))?;
    let midnight = Utc
        .from_utc_datetime(&naive.and_hms_opt(0, 0, 0).expect("valid midnight"));
    Ok(midnight.timestamp() + offset_seconds)
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    init_logging();

    let redis_config = RedisConfig::from_env().context("loading redis configuration")?;
    let warehouse_config = WarehouseConfig::from_env().context("loading warehouse configuration")?;
    let prep_config = PrepConfig::from_env();

    let tickers = env_list("TICKERS")?;
    let dates = env_list("DATES")?;
    // Seconds past midnight UTC that the regular session opens; default
    // 34200 = 09:30:00.
    let market_open_offset = std::env::var("MARKET_OPEN_OFFSET_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(34_200i64);

    let broker = Broker::connect(&redis_config).await?;
    let pool = MySqlPoolOptions::new()
        .max_connections(5)
        .connect(&warehouse_config.url)
        .await
        .context("connecting to warehouse")?;
    let warehouse = SqlWarehouseClient::new(pool);

    let progress = ProgressBar::new((tickers.len() * dates.len()) as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for date in &dates {
        let open_epoch = market_open_epoch(date, market_open_offset)?;
        let rows: Vec<TickerTick> = warehouse
            .opening_range_rows(date, open_epoch, prep_config.opening_range_seconds)
            .await
            .with_context(|| format!("querying opening-range rows for {date}"))?;

        let ranges_by_ticker = build_opening_ranges(&rows, prep_config.opening_range_seconds);

        for ticker in &tickers {
            if let Some(ranges) = ranges_by_ticker.get(ticker) {
                let mut single_date = HashMap::new();
                single_date.insert(date.clone(), ranges[date]);
                stage_opening_ranges(&broker, &single_date).await?;
            }

            let ticks = warehouse
                .intraday_rows(ticker, date)
                .await
                .with_context(|| format!("querying intraday rows for {ticker} on {date}"))?;
            let compressed = compress(&ticks);

            let mut single_date = HashMap::new();
            single_date.insert(date.clone(), compressed);
            stage_series(&broker, &single_date).await?;

            progress.inc(1);
        }
    }

    progress.finish_with_message("done");
    info!(tickers = tickers.len(), dates = dates.len(), "preparation complete");
    Ok(())
}
