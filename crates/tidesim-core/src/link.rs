//! Link layer: Selective-Repeat ARQ with per-frame timers, adaptive RTO,
//! and fast retransmit on duplicate ACKs.
//!
//! Both the send window and the receive buffer are implemented as a fixed
//! arena of `window` slots indexed by `seq % window`, since any seq that
//! can legally be in flight is always within one window of `send_base` /
//! `recv_base`.

use crate::rto::RtoEstimator;
use crate::wire::Segment;

const DUP_ACK_FAST_RETRANSMIT_THRESHOLD: u32 = 3;

struct SendSlot {
    seq: u64,
    segment: Segment,
    send_time: f64,
    acked: bool,
    retransmitted: bool,
}

/// Sender-side Selective-Repeat window.
pub struct SendWindow {
    window: u64,
    send_base: u64,
    next_seq: u64,
    slots: Vec<Option<SendSlot>>,
    last_ack_received: Option<u64>,
    dup_ack_count: u32,
}

impl SendWindow {
    pub fn new(window: u32) -> Self {
        Self {
            window: window as u64,
            send_base: 0,
            next_seq: 0,
            slots: (0..window).map(|_| None).collect(),
            last_ack_received: None,
            dup_ack_count: 0,
        }
    }

    pub fn send_base(&self) -> u64 {
        self.send_base
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn can_send(&self) -> bool {
        self.next_seq < self.send_base + self.window
    }

    fn slot_index(&self, seq: u64) -> usize {
        (seq % self.window) as usize
    }

    /// Register a freshly built segment for transmission, advancing
    /// `next_seq`. Caller must have already checked [`Self::can_send`].
    pub fn register(&mut self, segment: Segment, now: f64) -> u64 {
        debug_assert!(self.can_send());
        let seq = self.next_seq;
        let idx = self.slot_index(seq);
        self.slots[idx] = Some(SendSlot {
            seq,
            segment,
            send_time: now,
            acked: false,
            retransmitted: false,
        });
        self.next_seq += 1;
        seq
    }

    /// Outcome of processing an ACK: whether fast retransmit of the window
    /// base should fire now.
    pub fn process_ack(&mut self, seq: u64, now: f64, rto: &mut RtoEstimator) -> bool {
        match self.last_ack_received {
            Some(last) if last == seq => self.dup_ack_count += 1,
            _ => {
                self.last_ack_received = Some(seq);
                self.dup_ack_count = 0;
            }
        }

        if seq < self.send_base || seq >= self.next_seq {
            return false;
        }

        let idx = self.slot_index(seq);
        if let Some(slot) = &mut self.slots[idx] {
            if slot.seq == seq && !slot.acked {
                if !slot.retransmitted {
                    rto.sample(now - slot.send_time);
                }
                slot.acked = true;
            }
        }

        while self.send_base < self.next_seq {
            let idx = self.slot_index(self.send_base);
            let slide = matches!(&self.slots[idx], Some(slot) if slot.seq == self.send_base && slot.acked);
            if !slide {
                break;
            }
            self.slots[idx] = None;
            self.send_base += 1;
        }

        self.dup_ack_count >= DUP_ACK_FAST_RETRANSMIT_THRESHOLD
    }

    /// Sequence numbers whose timer has expired as of `now`.
    pub fn timed_out(&self, now: f64, rto: f64) -> Vec<u64> {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| !slot.acked && now - slot.send_time > rto)
            .map(|slot| slot.seq)
            .collect()
    }

    /// Mark `seq` retransmitted at `now`, returning the segment to resend.
    /// Resets duplicate-ACK tracking, mirroring a fresh transmission.
    pub fn prepare_retransmit(&mut self, seq: u64, now: f64) -> Option<Segment> {
        let idx = self.slot_index(seq);
        let slot = self.slots[idx].as_mut()?;
        if slot.seq != seq || slot.acked {
            return None;
        }
        slot.send_time = now;
        slot.retransmitted = true;
        self.dup_ack_count = 0;
        Some(slot.segment.clone())
    }

    /// The segment currently at `send_base`, used by fast retransmit.
    pub fn base_segment(&self) -> Option<&Segment> {
        let idx = self.slot_index(self.send_base);
        self.slots[idx]
            .as_ref()
            .filter(|slot| slot.seq == self.send_base)
            .map(|slot| &slot.segment)
    }
}

/// Receiver-side Selective-Repeat window. Buffers out-of-order arrivals
/// within `[recv_base, recv_base + window)` and drains contiguous runs.
pub struct ReceiveWindow {
    window: u64,
    recv_base: u64,
    slots: Vec<Option<Segment>>,
}

impl ReceiveWindow {
    pub fn new(window: u32) -> Self {
        Self {
            window: window as u64,
            recv_base: 0,
            slots: (0..window).map(|_| None).collect(),
        }
    }

    pub fn recv_base(&self) -> u64 {
        self.recv_base
    }

    fn slot_index(&self, seq: u64) -> usize {
        (seq % self.window) as usize
    }

    /// Total bytes currently held in out-of-order slots, not yet drained
    /// to the transport layer. Used for the combined-usage backpressure
    /// check at transmit time.
    pub fn buffered_bytes(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .map(|segment| segment.data.len())
            .sum()
    }

    /// Accept `segment` if it falls within the current window, then drain
    /// every contiguous run starting at `recv_base`.
    ///
    /// Returns the segments newly promoted in order, and `true` if the
    /// frame carrying `segment.seq` should be ACKed (frames outside the
    /// window are silently discarded: no buffering, no ACK).
    pub fn receive(&mut self, segment: Segment) -> (Vec<Segment>, bool) {
        let seq = segment.seq;
        if seq < self.recv_base || seq >= self.recv_base + self.window {
            return (Vec::new(), false);
        }
        let idx = self.slot_index(seq);
        if self.slots[idx].is_none() {
            self.slots[idx] = Some(segment);
        }

        let mut emitted = Vec::new();
        loop {
            let idx = self.slot_index(self.recv_base);
            match self.slots[idx].take() {
                Some(seg) if seg.seq == self.recv_base => {
                    emitted.push(seg);
                    self.recv_base += 1;
                }
                other => {
                    self.slots[idx] = other;
                    break;
                }
            }
        }
        (emitted, true)
    }

    /// Put previously-drained `segments` back into the window and roll
    /// `recv_base` back to their first seq.
    ///
    /// Used when a segment handed off to the transport layer is rejected
    /// (integrity failure or backpressure): the link layer must not treat
    /// it as delivered, so a later retransmission of the same seq is
    /// still recognized as within-window rather than silently discarded.
    pub fn restore(&mut self, segments: &[Segment]) {
        let Some(first) = segments.first() else {
            return;
        };
        for segment in segments {
            let idx = self.slot_index(segment.seq);
            self.slots[idx] = Some(segment.clone());
        }
        self.recv_base = first.seq;
    }
}
