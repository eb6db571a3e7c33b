//! Sweep-grid construction and per-cell execution for the tidesim
//! experiment driver, split out of the binary so it's testable directly.

use serde::Serialize;

use tidesim_core::config::{EngineConfig, L_VALUES, W_VALUES};
use tidesim_core::engine::Engine;

/// Seeds swept per (window, payload_len) cell. Fixed, not a CLI flag —
/// the driver has exactly one configurable surface, the output path.
pub const SEEDS_PER_CELL: u64 = 10;

/// One row of the sweep's output CSV.
#[derive(Debug, Serialize)]
pub struct RunRecord {
    pub w: u32,
    pub l: usize,
    pub seed: u64,
    pub goodput: f64,
    pub goodput_mbps: f64,
    pub total_time: f64,
    pub retransmissions: u64,
    pub buffer_events: u64,
    pub delayed_acks: u64,
}

/// The full `W × L × seed` grid, in sweep order.
pub fn grid() -> Vec<(u32, usize, u64)> {
    let mut cells = Vec::with_capacity(W_VALUES.len() * L_VALUES.len() * SEEDS_PER_CELL as usize);
    for &window in W_VALUES {
        for &payload_len in L_VALUES {
            for seed in 0..SEEDS_PER_CELL {
                cells.push((window, payload_len, seed));
            }
        }
    }
    cells
}

/// Run one grid cell to completion and collect its output statistics.
pub fn run_cell(window: u32, payload_len: usize, seed: u64) -> RunRecord {
    let config = EngineConfig::new(window, payload_len, seed)
        .expect("driver only constructs configs from the fixed grid");
    let workload_bytes = config.workload_bytes;
    let mut engine = Engine::new(config);
    let total_time = engine.run();
    let stats = engine.stats();

    let goodput = 8.0 * workload_bytes as f64 / total_time;
    RunRecord {
        w: window,
        l: payload_len,
        seed,
        goodput,
        goodput_mbps: goodput / 1_000_000.0,
        total_time,
        retransmissions: stats.retransmissions,
        buffer_events: stats.buffer_events,
        delayed_acks: stats.delayed_acks,
    }
}
