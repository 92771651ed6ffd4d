//! Host-side vertex stream and the rotating pool of GPU vertex buffers.

use super::vertex::{Quad, QUAD_BYTES};

/// Growable host array of quads awaiting upload.
///
/// Capacity is always a power of two and never shrinks within a session.
/// Clearing only resets the queued count; the storage is kept.
pub struct VertexStream {
    quads: Vec<Quad>,
    len: usize,
}

impl VertexStream {
    pub fn new() -> Self {
        Self {
            quads: Vec::new(),
            len: 0,
        }
    }

    /// Reserve `n` quads at the end of the stream and return them for writing.
    ///
    /// Grows the backing store to the smallest power of two that fits. Never
    /// flushes.
    pub fn request_slots(&mut self, n: usize) -> &mut [Quad] {
        let needed = self.len + n;
        if needed > self.quads.len() {
            let capacity = needed.next_power_of_two();
            self.quads.resize(capacity, Quad::default());
        }
        let start = self.len;
        self.len = needed;
        &mut self.quads[start..needed]
    }

    /// Append a single quad.
    pub fn push(&mut self, quad: Quad) {
        self.request_slots(1)[0] = quad;
    }

    /// Queued quads in submission order.
    pub fn pending(&self) -> &[Quad] {
        &self.quads[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current storage capacity in quads.
    pub fn capacity(&self) -> usize {
        self.quads.len()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

/// Upload instruction for one flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingUpload {
    /// Ring slot to upload into.
    pub slot: usize,
    /// New buffer size in bytes when the slot must be reallocated.
    pub reallocate: Option<u64>,
}

/// Round-robin selection over a fixed pool of GPU vertex buffers.
///
/// Consecutive flushes never write into the buffer the GPU may still be
/// reading from the previous flush. Each slot remembers its capacity and is
/// only reallocated when the host stream has outgrown it.
pub struct VertexRing {
    capacities: Vec<usize>,
    next: usize,
}

impl VertexRing {
    pub fn new(slots: usize) -> Self {
        Self {
            capacities: vec![0; slots.max(1)],
            next: 0,
        }
    }

    pub fn slots(&self) -> usize {
        self.capacities.len()
    }

    /// Pick the next slot for a stream of `stream_capacity` quads.
    pub fn select(&mut self, stream_capacity: usize) -> RingUpload {
        let slot = self.next;
        self.next = (self.next + 1) % self.capacities.len();

        let reallocate = if stream_capacity > self.capacities[slot] {
            self.capacities[slot] = stream_capacity;
            Some(stream_capacity as u64 * QUAD_BYTES)
        } else {
            None
        };

        RingUpload { slot, reallocate }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_is_power_of_two() {
        let mut s = VertexStream::new();
        s.request_slots(1);
        assert_eq!(s.capacity(), 1);
        s.request_slots(2);
        assert_eq!(s.capacity(), 4);
        s.request_slots(2);
        assert_eq!(s.capacity(), 8);
        assert_eq!(s.len(), 5);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut s = VertexStream::new();
        s.request_slots(100);
        let cap = s.capacity();
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.capacity(), cap);
        s.request_slots(3);
        assert_eq!(s.capacity(), cap);
    }

    #[test]
    fn pending_preserves_order() {
        let mut s = VertexStream::new();
        for i in 0..5 {
            let mut q = Quad::default();
            q[0].position[0] = i as f32;
            s.push(q);
        }
        let xs: Vec<f32> = s.pending().iter().map(|q| q[0].position[0]).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn ring_rotates_and_wraps() {
        let mut ring = VertexRing::new(3);
        let slots: Vec<usize> = (0..7).map(|_| ring.select(1).slot).collect();
        assert_eq!(slots, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn ring_reallocates_only_on_growth() {
        let mut ring = VertexRing::new(2);
        assert_eq!(ring.select(4).reallocate, Some(4 * QUAD_BYTES));
        assert_eq!(ring.select(4).reallocate, Some(4 * QUAD_BYTES));
        // Both slots now hold 4 quads.
        assert_eq!(ring.select(4).reallocate, None);
        assert_eq!(ring.select(2).reallocate, None);
        assert_eq!(ring.select(8).reallocate, Some(8 * QUAD_BYTES));
    }

    #[test]
    fn ring_has_at_least_one_slot() {
        let mut ring = VertexRing::new(0);
        assert_eq!(ring.slots(), 1);
        assert_eq!(ring.select(1).slot, 0);
        assert_eq!(ring.select(1).slot, 0);
    }
}
