//! Physical channel model: delay accounting and a Gilbert-Elliott two-state
//! Markov channel for bursty corruption.

use rand::rngs::StdRng;
use rand::RngExt as _;
use rand::SeedableRng;

use crate::wire::Direction;

pub const BIT_RATE_BPS: f64 = 10.0 * 10_f64.powi(6);
pub const FORWARD_PROP_DELAY: f64 = 0.040;
pub const REVERSE_PROP_DELAY: f64 = 0.010;
pub const PROCESSING_DELAY: f64 = 0.002;

const P_GOOD_TO_BAD: f64 = 0.002;
const P_BAD_TO_GOOD: f64 = 0.05;
const BER_GOOD: f64 = 1e-6;
const BER_BAD: f64 = 5e-3;

/// Current state of the Gilbert-Elliott Markov chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Good,
    Bad,
}

/// Stateful physical-layer channel: delay calculation plus a seeded
/// Gilbert-Elliott corruption model.
///
/// The RNG is seeded once at construction and never reseeded mid-run —
/// reproducibility depends on every draw being consumed in a fixed order:
/// the state-transition draw always precedes the corruption draw.
pub struct PhyChannel {
    mode: ChannelMode,
    rng: StdRng,
}

impl PhyChannel {
    pub fn new(seed: u64) -> Self {
        Self {
            mode: ChannelMode::Good,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    /// Transmission + propagation + processing delay for a frame of
    /// `wire_size` bytes traveling in `direction`, in seconds.
    pub fn delay_seconds(&self, wire_size: usize, direction: Direction) -> f64 {
        let tx = 8.0 * wire_size as f64 / BIT_RATE_BPS;
        let prop = match direction {
            Direction::Forward => FORWARD_PROP_DELAY,
            Direction::Reverse => REVERSE_PROP_DELAY,
        };
        tx + prop + PROCESSING_DELAY
    }

    /// Advance the Markov chain one step, then decide whether a frame of
    /// `wire_size` bytes is corrupted under the resulting state's BER.
    ///
    /// Always draws the state transition first, then the corruption
    /// decision, regardless of whether the transition changed anything —
    /// this fixed draw order is required for run-to-run determinism.
    pub fn check_corruption(&mut self, wire_size: usize) -> bool {
        self.transition();
        let ber = match self.mode {
            ChannelMode::Good => BER_GOOD,
            ChannelMode::Bad => BER_BAD,
        };
        let bits = 8.0 * wire_size as f64;
        let p_success = (1.0 - ber).powf(bits);
        let draw: f64 = self.rng.random();
        draw > p_success
    }

    fn transition(&mut self) {
        let draw: f64 = self.rng.random();
        self.mode = match self.mode {
            ChannelMode::Good if draw < P_GOOD_TO_BAD => ChannelMode::Bad,
            ChannelMode::Bad if draw < P_BAD_TO_GOOD => ChannelMode::Good,
            other => other,
        };
    }
}
