//! Closed error taxonomy for the sweep pipeline (spec §7 / §9.1).
//!
//! Every stage (prep, dispatch, worker, reaper) wraps `PipelineError` in
//! `anyhow::Result` so operator-facing messages get call-site context via
//! `anyhow::Context`, while call sites that need to branch on error kind
//! (the reaper deciding "drop and continue" vs. "abort the batch") downcast
//! to this enum instead of matching on strings.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Broker disconnect, warehouse timeout, durable-store deadlock: the
    /// task runtime decides on retry, no in-process retry is attempted.
    #[error("transient infrastructure failure: {0}")]
    Transient(String),

    /// A staged date is missing for a work item. Fatal for that task; the
    /// worker must not fabricate defaults.
    #[error("missing staged data for date {0}")]
    DataAbsent(String),

    /// A required environment variable was not set. Fatal at startup.
    #[error("missing required configuration: {0}")]
    ConfigAbsent(String),

    /// A result payload in the cache did not parse or was missing expected
    /// fields. The reaper filters these out rather than failing the batch.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl PipelineError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::Transient(_))
    }

    pub fn is_data_absent(&self) -> bool {
        matches!(self, PipelineError::DataAbsent(_))
    }
}
