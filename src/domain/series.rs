//! Time-series compressor (spec §4.2) and the `CompressedSeries` value it
//! produces.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::tick::Tick;

/// Ordered `timestamp -> price` mapping with no two adjacent entries equal
/// in price (spec §3). `BTreeMap<i64, f64>` round-trips through JSON with
/// string keys, matching the wire layout in spec §6.3 (db 2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompressedSeries(pub BTreeMap<i64, f64>);

impl CompressedSeries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.0.iter().map(|(ts, price)| (*ts, *price))
    }

    /// Last timestamp key, i.e. `end_of_day_ts` in the breakout state
    /// machine (spec §4.5).
    pub fn last_timestamp(&self) -> Option<i64> {
        self.0.keys().next_back().copied()
    }
}

/// Compress a single ticker/date's raw tick stream, ordered by
/// `timestamp_utc`, into its sparse representation (spec §4.2).
///
/// The first tick is always emitted. Subsequent ticks are emitted iff their
/// price differs from the most recently emitted price **and** their
/// timestamp is `>=` the most recently emitted timestamp — the reference
/// sources disagree on `>=` vs `>`; this crate follows `>=` to preserve
/// simultaneous-second price changes (spec §9, open question).
pub fn compress(raw: &[Tick]) -> CompressedSeries {
    let mut out: BTreeMap<i64, f64> = BTreeMap::new();
    let mut last_timestamp: Option<i64> = None;
    let mut last_price: Option<f64> = None;

    for tick in raw {
        match (last_timestamp, last_price) {
            (None, _) => {
                out.insert(tick.timestamp_utc, tick.underlying);
                last_timestamp = Some(tick.timestamp_utc);
                last_price = Some(tick.underlying);
            }
            (Some(lt), Some(lp)) => {
                if tick.timestamp_utc >= lt && tick.underlying != lp {
                    out.insert(tick.timestamp_utc, tick.underlying);
                    last_timestamp = Some(tick.timestamp_utc);
                    last_price = Some(tick.underlying);
                }
            }
            _ => unreachable!("last_timestamp and last_price are set together"),
        }
    }

    CompressedSeries(out)
}
