use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

/// A closed position (spec §3). Immutable once built: `close_ts >=
/// open_ts`; `profit = close_price - open_price` for long,
/// `open_price - close_price` for short.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub open_price: f64,
    pub open_ts: i64,
    pub close_price: f64,
    pub close_ts: i64,
    pub direction: Direction,
    pub profit: f64,
    pub holding_period: i64,
}

impl Trade {
    /// Close a trade opened at `(open_price, open_ts)` in `direction` at
    /// `(close_price, close_ts)`, computing the direction-sensitive profit
    /// sign (spec §3, invariant 4 of §8).
    pub fn close(
        open_price: f64,
        open_ts: i64,
        direction: Direction,
        close_price: f64,
        close_ts: i64,
    ) -> Self {
        debug_assert!(close_ts >= open_ts);
        let profit = match direction {
            Direction::Long => close_price - open_price,
            Direction::Short => open_price - close_price,
        };
        Self {
            open_price,
            open_ts,
            close_price,
            close_ts,
            direction,
            profit,
            holding_period: close_ts - open_ts,
        }
    }
}
