//! Event scheduler: a min-heap priority queue ordered by
//! `(simulated_time, insertion_order)`, driving the engine's virtual clock.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::wire::Segment;

/// What kind of event fired, carrying just enough data for the engine to
/// dispatch it.
#[derive(Debug, Clone)]
pub enum EventKind {
    /// A data frame finishes propagating and arrives at the receiver.
    /// `corrupted` was decided at transmission time, consuming the PHY's
    /// draw then so the draw order stays fixed regardless of how many
    /// frames are in flight when this event is dispatched.
    DataArrive { segment: Segment, corrupted: bool },
    /// An ACK frame finishes propagating and arrives at the sender.
    AckArrive { seq: u64 },
    /// The application sink is due to drain another tick's worth of bytes.
    AppConsume,
    /// A deferred ACK is due to actually be sent (after the 10 ms delay).
    DelayedAck { seq: u64 },
}

#[derive(Debug, Clone)]
struct ScheduledEvent {
    time: f64,
    tiebreak: u64,
    kind: EventKind,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.tiebreak == other.tiebreak
    }
}
impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    /// Reversed so `BinaryHeap` (a max-heap) behaves as a min-heap over
    /// `(time, tiebreak)`.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .partial_cmp(&self.time)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.tiebreak.cmp(&self.tiebreak))
    }
}

/// A scoped event queue: the `tiebreak` counter is per-instance, never a
/// process-wide singleton, so two independent engines never observe each
/// other's insertion order.
#[derive(Default)]
pub struct EventQueue {
    heap: BinaryHeap<ScheduledEvent>,
    next_tiebreak: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, time: f64, kind: EventKind) {
        let tiebreak = self.next_tiebreak;
        self.next_tiebreak += 1;
        self.heap.push(ScheduledEvent {
            time,
            tiebreak,
            kind,
        });
    }

    /// Pop the earliest event, returning its time and kind.
    pub fn pop(&mut self) -> Option<(f64, EventKind)> {
        self.heap.pop().map(|e| (e.time, e.kind))
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Earliest scheduled time, if any, without removing it.
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_order() {
        let mut q = EventQueue::new();
        q.schedule(3.0, EventKind::AppConsume);
        q.schedule(1.0, EventKind::AppConsume);
        q.schedule(2.0, EventKind::AppConsume);
        let times: Vec<f64> = std::iter::from_fn(|| q.pop().map(|(t, _)| t)).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn same_time_events_pop_in_insertion_order() {
        let mut q = EventQueue::new();
        q.schedule(1.0, EventKind::AckArrive { seq: 0 });
        q.schedule(1.0, EventKind::AckArrive { seq: 1 });
        q.schedule(1.0, EventKind::AckArrive { seq: 2 });
        let seqs: Vec<u64> = std::iter::from_fn(|| q.pop())
            .map(|(_, kind)| match kind {
                EventKind::AckArrive { seq } => seq,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn empty_queue_pops_none() {
        let mut q = EventQueue::new();
        assert!(q.is_empty());
        assert!(q.pop().is_none());
    }

    #[test]
    fn independent_queues_have_independent_tiebreaks() {
        let mut a = EventQueue::new();
        let mut b = EventQueue::new();
        a.schedule(5.0, EventKind::AppConsume);
        b.schedule(5.0, EventKind::AppConsume);
        // Both should still pop fine independently; no shared counter state.
        assert!(a.pop().is_some());
        assert!(b.pop().is_some());
    }
}
