//! Wire-level types: segments and the header-size accounting used to
//! compute on-channel frame sizes. This crate does not materialize a real
//! byte-level wire format (no bit-packing) — only the sizes and checksums
//! that the physical and transport layers need to account for.

/// Transport-layer header overhead, accounted for but not materialized.
pub const TRANSPORT_HEADER_SIZE: usize = 8;

/// Link-layer header overhead, accounted for but not materialized.
pub const LINK_HEADER_SIZE: usize = 24;

/// A unit produced by the transport layer's segmentation of the workload.
#[derive(Debug, Clone)]
pub struct Segment {
    pub seq: u64,
    pub data: bytes::Bytes,
    pub checksum: u32,
}

impl Segment {
    pub fn new(seq: u64, data: bytes::Bytes) -> Self {
        let checksum = crc32fast::hash(&data);
        Self { seq, data, checksum }
    }

    pub fn verify(&self) -> bool {
        crc32fast::hash(&self.data) == self.checksum
    }
}

/// Direction a frame travels, used to pick the propagation delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_round_trips_checksum() {
        let seg = Segment::new(0, bytes::Bytes::from_static(b"hello world"));
        assert!(seg.verify());
    }

    #[test]
    fn corrupted_segment_fails_verify() {
        let mut seg = Segment::new(0, bytes::Bytes::from_static(b"hello world"));
        seg.checksum ^= 1;
        assert!(!seg.verify());
    }

}
