use serde::{Deserialize, Serialize};

/// A single raw price observation produced by the warehouse (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp_utc: i64,
    pub underlying: f64,
}

/// A [`Tick`] annotated with the ticker it belongs to, as returned by the
/// opening-range builder's query (spec §4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerTick {
    pub timestamp_utc: i64,
    pub ticker: String,
    pub underlying: f64,
}
