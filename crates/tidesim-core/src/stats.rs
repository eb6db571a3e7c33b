//! Output statistics accumulated over a single engine run.

/// Counters observable once [`crate::engine::Engine::run`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Timeout- and fast-retransmit-induced retransmissions, combined.
    pub retransmissions: u64,
    /// Receive rejections: integrity failures plus backpressure rejections.
    pub buffer_events: u64,
    /// ACKs deferred under the 10 ms delayed-ACK policy.
    pub delayed_acks: u64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }
}
