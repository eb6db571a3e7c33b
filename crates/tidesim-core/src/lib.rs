//! # tidesim-core
//!
//! Discrete-event simulator of a reliable point-to-point data transfer:
//! Selective-Repeat ARQ over a Gilbert-Elliott channel, with an adaptive
//! Jacobson/Karn retransmission timer and a capacity-bounded receive
//! buffer feeding a rate-limited application sink.
//!
//! A single [`engine::Engine`] run answers one question: given a window
//! size and payload size, how long does it take to move a fixed workload
//! end to end, and what did it cost in retransmissions and buffer events
//! along the way?
//!
//! ## Crate structure
//!
//! - [`config`] — validated per-run parameters (window, payload length, seed)
//! - [`wire`] — segment type and header-size accounting
//! - [`phy`] — Gilbert-Elliott channel model: delay and corruption
//! - [`rto`] — Jacobson/Karn adaptive retransmission timeout
//! - [`link`] — Selective-Repeat send/receive windows
//! - [`transport`] — segmentation, receive buffer, backpressure, app sink
//! - [`event`] — the event queue driving the virtual clock
//! - [`stats`] — output counters for a completed run
//! - [`engine`] — orchestrates the above into one `run()`
//! - [`error`] — configuration-boundary errors

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod link;
pub mod phy;
pub mod rto;
pub mod stats;
pub mod transport;
pub mod wire;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::ConfigError;
pub use stats::EngineStats;
