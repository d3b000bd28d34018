use serde::{Deserialize, Serialize};

/// Strategy axes for a single sweep point (spec §3). All fields are
/// strictly positive; this is enforced by the dispatcher's grid
/// enumeration (spec §4.4), not re-validated here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub stop_distance: f64,
    pub stop_count_limit: i32,
    pub stop_cooloff_period: i64,
    pub limit_distance: f64,
}
