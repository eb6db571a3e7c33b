//! Transport layer: segmentation of the workload, the finite receive
//! buffer with its admission policy, delayed-ACK policy, and the
//! application sink that drains accepted bytes at a fixed rate.

use std::collections::BTreeMap;

use bytes::{Bytes, BytesMut};

use crate::wire::Segment;

/// Application sink drain rate: one byte of `BIT_RATE` per 8 bits,
/// applied every 1 ms tick (`crate::phy::BIT_RATE_BPS / 8 / 1000`).
pub const APP_DRAIN_BYTES_PER_TICK: usize = 1250;

/// Buffer usage threshold, as a fraction of capacity, above which ACKs
/// are deferred rather than sent immediately.
const DELAYED_ACK_USAGE_THRESHOLD: f64 = 0.80;

/// Split `workload` into segments of at most `payload_len` bytes each,
/// numbered densely from zero. The final segment may be shorter.
pub fn segmentize(workload: &Bytes, payload_len: usize) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(workload.len().div_ceil(payload_len));
    let mut offset = 0;
    let mut seq = 0u64;
    while offset < workload.len() {
        let end = (offset + payload_len).min(workload.len());
        segments.push(Segment::new(seq, workload.slice(offset..end)));
        offset = end;
        seq += 1;
    }
    segments
}

/// Outcome of attempting to admit a segment into the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// Accepted (or already buffered); caller should ACK now or defer.
    Accepted { ack_now: bool },
    /// CRC mismatch; no ACK.
    IntegrityFailure,
    /// Buffer has no room; no ACK.
    Backpressure,
}

struct Pending {
    data: Bytes,
    offset: usize,
}

/// The transport-layer receive side: a capacity-bounded buffer of
/// accepted-but-undelivered segments, plus an application sink draining
/// contiguous in-order bytes at a fixed rate.
pub struct TransportReceiver {
    capacity: usize,
    current_usage: usize,
    next_expected_seq: u64,
    buffer: BTreeMap<u64, Pending>,
    delivered: BytesMut,
}

impl TransportReceiver {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            current_usage: 0,
            next_expected_seq: 0,
            buffer: BTreeMap::new(),
            delivered: BytesMut::new(),
        }
    }

    pub fn current_usage(&self) -> usize {
        self.current_usage
    }

    fn usage_fraction(&self) -> f64 {
        self.current_usage as f64 / self.capacity as f64
    }

    /// Bytes delivered to the application so far, in order.
    pub fn delivered(&self) -> &[u8] {
        &self.delivered
    }

    /// Admit a segment arriving from the link layer.
    pub fn receive_segment(&mut self, segment: &Segment) -> AdmitOutcome {
        if !segment.verify() {
            return AdmitOutcome::IntegrityFailure;
        }
        if segment.seq < self.next_expected_seq || self.buffer.contains_key(&segment.seq) {
            // Already delivered or already buffered: idempotent accept.
            return AdmitOutcome::Accepted {
                ack_now: self.usage_fraction() <= DELAYED_ACK_USAGE_THRESHOLD,
            };
        }
        if self.current_usage + segment.data.len() > self.capacity {
            return AdmitOutcome::Backpressure;
        }
        self.current_usage += segment.data.len();
        self.buffer.insert(
            segment.seq,
            Pending {
                data: segment.data.clone(),
                offset: 0,
            },
        );
        AdmitOutcome::Accepted {
            ack_now: self.usage_fraction() <= DELAYED_ACK_USAGE_THRESHOLD,
        }
    }

    /// Drain up to `max_bytes` from contiguous in-order segments into the
    /// application sink. Returns the number of bytes actually consumed.
    pub fn drain(&mut self, max_bytes: usize) -> usize {
        let mut remaining = max_bytes;
        while remaining > 0 {
            let Some(entry) = self.buffer.get_mut(&self.next_expected_seq) else {
                break;
            };
            let available = entry.data.len() - entry.offset;
            let take = available.min(remaining);
            self.delivered
                .extend_from_slice(&entry.data[entry.offset..entry.offset + take]);
            entry.offset += take;
            self.current_usage -= take;
            remaining -= take;
            if entry.offset == entry.data.len() {
                self.buffer.remove(&self.next_expected_seq);
                self.next_expected_seq += 1;
            }
        }
        max_bytes - remaining
    }

    pub fn next_expected_seq(&self) -> u64 {
        self.next_expected_seq
    }
}
