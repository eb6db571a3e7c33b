//! The simulation engine: orchestrates the physical, link, and transport
//! layers over a shared event queue and virtual clock.

use bytes::Bytes;
use tracing::trace;

use crate::config::EngineConfig;
use crate::event::{EventKind, EventQueue};
use crate::link::{ReceiveWindow, SendWindow};
use crate::phy::PhyChannel;
use crate::rto::RtoEstimator;
use crate::stats::EngineStats;
use crate::transport::{self, AdmitOutcome, TransportReceiver, APP_DRAIN_BYTES_PER_TICK};
use crate::wire::{Direction, Segment, LINK_HEADER_SIZE, TRANSPORT_HEADER_SIZE};

/// Delay before a deferred ACK is actually sent, once the receive buffer
/// crosses the delayed-ACK usage threshold.
const DELAYED_ACK_DELAY: f64 = 0.010;

/// Application sink drain period.
const APP_CONSUME_PERIOD: f64 = 0.001;

/// When the event queue runs dry before the run has terminated (every
/// outstanding frame is lost and waiting on its own timer), advance the
/// clock by this much and retry rather than spin.
const IDLE_STEP: f64 = 0.001;

/// One discrete-event run of the simulated stack for a fixed `EngineConfig`.
///
/// Construct with [`Engine::new`] and drive to completion with
/// [`Engine::run`].
pub struct Engine {
    config: EngineConfig,
    segments: Vec<Segment>,
    phy: PhyChannel,
    send_window: SendWindow,
    recv_window: ReceiveWindow,
    rto: RtoEstimator,
    transport_rx: TransportReceiver,
    events: EventQueue,
    link_free_time: f64,
    stats: EngineStats,
}

impl Engine {
    /// Build an engine for `config`, filling the workload with
    /// deterministic pseudo-random bytes seeded from `config.seed`.
    pub fn new(config: EngineConfig) -> Self {
        let workload = Self::generate_workload(&config);
        Self::with_workload(config, workload)
    }

    /// Build an engine for `config` over an explicit workload, for tests
    /// that need to check delivery exactness against known bytes.
    pub fn with_workload(config: EngineConfig, workload: Bytes) -> Self {
        let segments = transport::segmentize(&workload, config.payload_len);
        let window = config.window;
        let phy = PhyChannel::new(config.seed);
        let transport_rx = TransportReceiver::new(config.buffer_capacity);
        let mut events = EventQueue::new();
        events.schedule(APP_CONSUME_PERIOD, EventKind::AppConsume);

        Self {
            config,
            segments,
            phy,
            send_window: SendWindow::new(window),
            recv_window: ReceiveWindow::new(window),
            rto: RtoEstimator::new(),
            transport_rx,
            events,
            link_free_time: 0.0,
            stats: EngineStats::new(),
        }
    }

    fn generate_workload(config: &EngineConfig) -> Bytes {
        use rand::rngs::StdRng;
        use rand::RngExt as _;
        use rand::SeedableRng;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let bytes: Vec<u8> = (0..config.workload_bytes).map(|_| rng.random::<u8>()).collect();
        Bytes::from(bytes)
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Bytes delivered to the application sink so far, in order.
    pub fn delivered(&self) -> &[u8] {
        self.transport_rx.delivered()
    }

    /// Bytes currently held in the transport receive buffer, undelivered.
    pub fn receive_buffer_usage(&self) -> usize {
        self.transport_rx.current_usage()
    }

    /// Number of segments the link layer has accepted from the sender so
    /// far (`recv_base`), the quantity `run` terminates on.
    pub fn accepted_segments(&self) -> u64 {
        self.recv_window.recv_base()
    }

    /// Force-drain any bytes already accepted into the transport buffer
    /// but not yet released to the application sink, ignoring the fixed
    /// drain rate.
    ///
    /// `run` terminates once every segment has been accepted
    /// (`recv_base == total_segments`), which can precede the rate-
    /// limited sink catching up on the last buffered bytes. Callers that
    /// need the full reconstructed workload (rather than just the
    /// completion time) should call this afterward.
    pub fn drain_remaining(&mut self) -> usize {
        self.transport_rx.drain(usize::MAX)
    }

    fn total_segments(&self) -> u64 {
        self.segments.len() as u64
    }

    fn combined_receiver_usage(&self) -> usize {
        self.transport_rx.current_usage() + self.recv_window.buffered_bytes()
    }

    fn reverse_ack_delay(&self) -> f64 {
        self.phy.delay_seconds(LINK_HEADER_SIZE, Direction::Reverse)
    }

    /// Run the simulation to completion and return the total elapsed
    /// simulated time, in seconds.
    ///
    /// Completion is the link layer accepting every segment
    /// (`recv_base == total_segments`). The rate-limited application sink
    /// may still hold the last accepted bytes when this returns; call
    /// [`Self::drain_remaining`] to force them through if the full
    /// reconstructed workload is needed.
    pub fn run(&mut self) -> f64 {
        let mut now = 0.0;
        while self.recv_window.recv_base() < self.total_segments() {
            self.transmit_ready(now);
            self.retransmit_timed_out(now);

            match self.events.pop() {
                Some((time, kind)) => {
                    now = time;
                    self.dispatch(now, kind);
                }
                None => {
                    now += IDLE_STEP;
                }
            }
        }
        now
    }

    /// Step 1 of the main loop: transmit new frames while the send window,
    /// total segment count, and combined receiver buffer usage allow it.
    fn transmit_ready(&mut self, now: f64) {
        while self.send_window.next_seq() < self.total_segments()
            && self.send_window.can_send()
            && self.combined_receiver_usage() + self.config.payload_len <= self.config.buffer_capacity
        {
            let seq = self.send_window.next_seq() as usize;
            let segment = self.segments[seq].clone();
            self.send_window.register(segment.clone(), now);
            self.schedule_data_frame(segment, now);
        }
    }

    /// Schedule transmission of `segment`, serialized against the forward
    /// channel's busy watermark and drawing its corruption decision now
    /// (not at arrival) so the PHY's draw order stays fixed.
    fn schedule_data_frame(&mut self, segment: Segment, now: f64) {
        let wire_size = LINK_HEADER_SIZE + TRANSPORT_HEADER_SIZE + segment.data.len();
        let tx_start = now.max(self.link_free_time);
        let tx_delay = 8.0 * wire_size as f64 / crate::phy::BIT_RATE_BPS;
        self.link_free_time = tx_start + tx_delay;

        let corrupted = self.phy.check_corruption(wire_size);
        let total_delay = self.phy.delay_seconds(wire_size, Direction::Forward);
        self.events.schedule(
            tx_start + total_delay,
            EventKind::DataArrive { segment, corrupted },
        );
    }

    /// Step 2 of the main loop: retransmit any frame whose timer has
    /// expired under the shared RTO.
    fn retransmit_timed_out(&mut self, now: f64) {
        let timed_out = self.send_window.timed_out(now, self.rto.rto());
        for seq in timed_out {
            if let Some(segment) = self.send_window.prepare_retransmit(seq, now) {
                self.stats.retransmissions += 1;
                self.schedule_data_frame(segment, now);
            }
        }
    }

    fn dispatch(&mut self, now: f64, kind: EventKind) {
        match kind {
            EventKind::DataArrive { segment, corrupted } => {
                self.on_data_arrive(now, segment, corrupted)
            }
            EventKind::DelayedAck { seq } => self.schedule_ack(now, seq),
            EventKind::AckArrive { seq } => self.on_ack_arrive(now, seq),
            EventKind::AppConsume => self.on_app_consume(now),
        }
    }

    fn on_data_arrive(&mut self, now: f64, segment: Segment, corrupted: bool) {
        if corrupted {
            trace!(seq = segment.seq, "frame corrupted in transit, dropped");
            return;
        }
        let trigger_seq = segment.seq;
        let (emitted, in_window) = self.recv_window.receive(segment);
        if !in_window {
            return;
        }
        if emitted.is_empty() {
            // Buffered out of order at the link layer; nothing reached
            // transport yet, but the frame itself is acknowledged.
            self.schedule_ack(now, trigger_seq);
            return;
        }

        let mut delayed = false;
        let mut rejected_at = None;
        for (i, delivered) in emitted.iter().enumerate() {
            match self.transport_rx.receive_segment(delivered) {
                AdmitOutcome::Accepted { ack_now } => delayed |= !ack_now,
                AdmitOutcome::IntegrityFailure | AdmitOutcome::Backpressure => {
                    rejected_at = Some(i);
                    break;
                }
            }
        }

        if let Some(i) = rejected_at {
            // The link layer must not treat the rejected segment (or any
            // after it) as delivered: a later retransmission has to find
            // it still within the receive window.
            self.recv_window.restore(&emitted[i..]);
            self.stats.buffer_events += 1;
            return;
        }
        if delayed {
            self.stats.delayed_acks += 1;
            self.events
                .schedule(now + DELAYED_ACK_DELAY, EventKind::DelayedAck { seq: trigger_seq });
        } else {
            self.schedule_ack(now, trigger_seq);
        }
    }

    fn schedule_ack(&mut self, now: f64, seq: u64) {
        let delay = self.reverse_ack_delay();
        self.events
            .schedule(now + delay, EventKind::AckArrive { seq });
    }

    fn on_ack_arrive(&mut self, now: f64, seq: u64) {
        let fast_retransmit = self.send_window.process_ack(seq, now, &mut self.rto);
        if !fast_retransmit {
            return;
        }
        let Some(base_seq) = self.send_window.base_segment().map(|s| s.seq) else {
            return;
        };
        if let Some(segment) = self.send_window.prepare_retransmit(base_seq, now) {
            self.stats.retransmissions += 1;
            self.schedule_data_frame(segment, now);
        }
    }

    fn on_app_consume(&mut self, now: f64) {
        self.transport_rx.drain(APP_DRAIN_BYTES_PER_TICK);
        self.events
            .schedule(now + APP_CONSUME_PERIOD, EventKind::AppConsume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn random_bytes(len: usize, seed: u64) -> Bytes {
        use rand::rngs::StdRng;
        use rand::RngExt as _;
        use rand::SeedableRng;
        let mut rng = StdRng::seed_from_u64(seed);
        let bytes: Vec<u8> = (0..len).map(|_| rng.random::<u8>()).collect();
        Bytes::from(bytes)
    }

    // ─── Delivery exactness ──────────────────────────────────────────────

    #[test]
    fn delivers_exact_bytes_for_small_workload() {
        let workload = random_bytes(5000, 1);
        let config = EngineConfig::builder(8, 512, 1)
            .workload_bytes(workload.len())
            .build()
            .unwrap();
        let mut engine = Engine::with_workload(config, workload.clone());
        let total_time = engine.run();
        assert!(total_time > 0.0);
        assert_eq!(engine.accepted_segments(), engine.total_segments());
        engine.drain_remaining();
        assert_eq!(engine.delivered(), workload.as_ref());
        assert_eq!(engine.stats().buffer_events, 0);
    }

    #[test]
    fn final_short_segment_is_delivered() {
        let workload = random_bytes(1000, 2);
        let config = EngineConfig::builder(4, 300, 2)
            .workload_bytes(workload.len())
            .build()
            .unwrap();
        let mut engine = Engine::with_workload(config, workload.clone());
        engine.run();
        engine.drain_remaining();
        assert_eq!(engine.delivered(), workload.as_ref());
    }

    // ─── Determinism ──────────────────────────────────────────────────────

    #[test]
    fn same_seed_same_config_is_deterministic() {
        let cfg_a = EngineConfig::builder(8, 1024, 7)
            .workload_bytes(20_000)
            .build()
            .unwrap();
        let cfg_b = cfg_a.clone();

        let time_a = Engine::new(cfg_a).run();
        let time_b = Engine::new(cfg_b).run();
        assert_eq!(time_a, time_b);
    }

    #[test]
    fn different_seeds_both_complete_delivery() {
        let cfg_a = EngineConfig::builder(32, 1024, 0)
            .workload_bytes(500_000)
            .build()
            .unwrap();
        let cfg_b = EngineConfig::builder(32, 1024, 1)
            .workload_bytes(500_000)
            .build()
            .unwrap();

        let mut engine_a = Engine::new(cfg_a);
        let mut engine_b = Engine::new(cfg_b);
        let time_a = engine_a.run();
        let time_b = engine_b.run();
        engine_a.drain_remaining();
        engine_b.drain_remaining();
        assert_eq!(engine_a.delivered().len(), 500_000);
        assert_eq!(engine_b.delivered().len(), 500_000);
        assert!(time_a > 0.0 && time_b > 0.0);
    }

    // ─── Boundary scenarios ────────────────────────────────────────────────

    #[test]
    fn stop_and_wait_window_still_terminates() {
        let config = EngineConfig::builder(2, 256, 0)
            .workload_bytes(2_000)
            .build()
            .unwrap();
        let mut engine = Engine::new(config);
        let total_time = engine.run();
        engine.drain_remaining();
        assert!(total_time > 0.0);
        assert_eq!(engine.delivered().len(), 2_000);
    }

    #[test]
    fn reduced_buffer_capacity_produces_delayed_acks() {
        let config = EngineConfig::builder(16, 2048, 3)
            .workload_bytes(200_000)
            .buffer_capacity(2 * 2048)
            .build()
            .unwrap();
        let mut engine = Engine::new(config);
        engine.run();
        engine.drain_remaining();
        assert!(engine.stats().delayed_acks > 0);
        assert_eq!(engine.delivered().len(), 200_000);
    }
}
