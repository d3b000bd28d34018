//! Opening-range builder (spec §4.1) and the `OpeningRange` value it
//! produces.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::tick::TickerTick;

/// Per ticker/day summary of the first `D` seconds of trading (spec §3).
/// Invariant: `low <= open_price <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningRange {
    pub open_price: f64,
    pub high: f64,
    pub low: f64,
    pub count_trades: u32,
    pub trading_start: i64,
}

/// Derive the calendar date (UTC) a timestamp falls on, used as the staging
/// key (spec §4.1: "`date` is derived from `timestamp_utc`").
pub fn date_key(timestamp_utc: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp_utc, 0)
        .map(|dt| dt.date_naive())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
        .format("%Y-%m-%d")
        .to_string()
}

/// Accumulator for a single `(ticker, date)` bucket. Tracks `first_seen_ts`
/// separately from `trading_start` because `trading_start` advances as rows
/// fold in, while the sub-window cutoff (spec §4.1) is anchored to the row
/// that first initialized the bucket.
struct Bucket {
    open_price: f64,
    high: f64,
    low: f64,
    count_trades: u32,
    trading_start: i64,
    first_seen_ts: i64,
}

/// Build `ticker -> date -> OpeningRange` from a flat, possibly
/// multi-ticker, multi-day row set (spec §4.1).
///
/// Single pass: the first row seen for a `(ticker, date)` initializes the
/// bucket; later rows within `first_seen_ts + range_duration` fold in by
/// updating `high`/`low`, incrementing `count_trades`, and advancing
/// `trading_start` to the maximum timestamp seen. Rows past the sub-window
/// are ignored. An empty row set for a date simply produces no entry — no
/// error (weekends, holidays).
pub fn build_opening_ranges(
    rows: &[TickerTick],
    range_duration: i64,
) -> HashMap<String, HashMap<String, OpeningRange>> {
    let mut buckets: HashMap<(String, String), Bucket> = HashMap::new();

    for row in rows {
        let date = date_key(row.timestamp_utc);
        let key = (row.ticker.clone(), date);

        match buckets.get_mut(&key) {
            None => {
                buckets.insert(
                    key,
                    Bucket {
                        open_price: row.underlying,
                        high: row.underlying,
                        low: row.underlying,
                        count_trades: 1,
                        trading_start: row.timestamp_utc,
                        first_seen_ts: row.timestamp_utc,
                    },
                );
            }
            Some(bucket) => {
                if row.timestamp_utc > bucket.first_seen_ts + range_duration {
                    continue;
                }
                bucket.count_trades += 1;
                bucket.high = bucket.high.max(row.underlying);
                bucket.low = bucket.low.min(row.underlying);
                bucket.trading_start = bucket.trading_start.max(row.timestamp_utc);
            }
        }
    }

    let mut out: HashMap<String, HashMap<String, OpeningRange>> = HashMap::new();
    for ((ticker, date), bucket) in buckets {
        out.entry(ticker).or_default().insert(
            date,
            OpeningRange {
                open_price: bucket.open_price,
                high: bucket.high,
                low: bucket.low,
                count_trades: bucket.count_trades,
                trading_start: bucket.trading_start,
            },
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ts: i64, ticker: &str, price: f64) -> TickerTick {
        TickerTick {
            timestamp_utc: ts,
            ticker: ticker.to_string(),
            underlying: price,
        }
    }

    #[test]
    fn single_ticker_single_day() {
        let rows = [
            row(1_700_000_000, "MSFT", 316.88),
            row(1_700_000_010, "MSFT", 317.50),
            row(1_700_000_020, "MSFT", 316.00),
        ];
        let out = build_opening_ranges(&rows, 30);
        let date = date_key(1_700_000_000);
        let range = out["MSFT"][&date];
        assert_eq!(range.open_price, 316.88);
        assert_eq!(range.high, 317.50);
        assert_eq!(range.low, 316.00);
        assert_eq!(range.count_trades, 3);
        assert!(range.low <= range.open_price && range.open_price <= range.high);
    }

    #[test]
    fn mixed_tickers_do_not_interfere() {
        let rows = [row(1_700_000_000, "MSFT", 100.0), row(1_700_000_000, "AAPL", 200.0)];
        let out = build_opening_ranges(&rows, 30);
        assert_eq!(out.len(), 2);
        assert!(out.contains_key("MSFT"));
        assert!(out.contains_key("AAPL"));
    }

    #[test]
    fn rows_past_sub_window_are_ignored() {
        let rows = [
            row(1_700_000_000, "MSFT", 100.0),
            row(1_700_000_010, "MSFT", 150.0), // within 30s sub-window
            row(1_700_000_040, "MSFT", 999.0), // outside 30s sub-window
        ];
        let out = build_opening_ranges(&rows, 30);
        let date = date_key(1_700_000_000);
        let range = out["MSFT"][&date];
        assert_eq!(range.high, 150.0);
        assert_eq!(range.count_trades, 2);
    }

    #[test]
    fn empty_row_set_produces_no_entries() {
        let out = build_opening_ranges(&[], 30);
        assert!(out.is_empty());
    }

    #[test]
    fn sub_window_is_anchored_to_first_seen_not_advancing_start() {
        // trading_start advances to 1_700_000_025 after the second row, but
        // the cutoff must stay anchored to the bucket's first timestamp.
        let rows = [
            row(1_700_000_000, "MSFT", 100.0),
            row(1_700_000_025, "MSFT", 105.0), // within 30s of first_seen
            row(1_700_000_029, "MSFT", 999.0), // still within 30s of first_seen
            row(1_700_000_031, "MSFT", 1000.0), // outside 30s of first_seen
        ];
        let out = build_opening_ranges(&rows, 30);
        let date = date_key(1_700_000_000);
        let range = out["MSFT"][&date];
        assert_eq!(range.count_trades, 3);
        assert_eq!(range.high, 999.0);
    }
}
