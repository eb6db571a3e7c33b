//! Configuration-boundary errors.
//!
//! Protocol-level outcomes (corruption, integrity failure, backpressure) are
//! not modeled as `Result` — they are return values and statistics, per the
//! engine's error-handling design. The only place a `Result` appears in this
//! crate is at construction, where a caller can hand the engine a window or
//! payload size outside the fixed experiment grid.

use thiserror::Error;

/// Error constructing an [`crate::config::EngineConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("window size {0} is not one of the allowed values {1:?}")]
    InvalidWindow(u32, &'static [u32]),

    #[error("payload length {0} is not one of the allowed values {1:?}")]
    InvalidPayloadLen(usize, &'static [usize]),

    #[error("workload_bytes must be nonzero")]
    EmptyWorkload,

    #[error("buffer_capacity must be at least one payload length (got {capacity}, payload_len {payload_len})")]
    BufferTooSmall { capacity: usize, payload_len: usize },
}
