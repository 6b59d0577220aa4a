use std::collections::HashMap;

use crate::foundation::core::{PIXEL_ZERO, Pixel, Size2};

/// Free-list of pixel storage keyed by exact size.
///
/// Buffers released after their last consumer are parked here and handed back
/// to same-size allocations within the frame. The counters double as the
/// engine's allocation accounting: tests assert on them to prove fast paths
/// never touch pixel memory.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: HashMap<Size2, Vec<Vec<Pixel>>>,
    allocations: u64,
    pool_hits: u64,
}

impl BufferPool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out storage for `size` pixels, reusing a parked buffer when one
    /// matches. Contents are unspecified; callers overwrite every pixel.
    pub fn acquire(&mut self, size: Size2) -> Vec<Pixel> {
        if let Some(mut data) = self.free.get_mut(&size).and_then(Vec::pop) {
            self.pool_hits += 1;
            debug_assert_eq!(data.len(), size.num_pixels());
            data.fill(PIXEL_ZERO);
            return data;
        }
        self.allocations += 1;
        vec![PIXEL_ZERO; size.num_pixels()]
    }

    /// Park storage for reuse. `data.len()` must match `size`.
    pub fn release(&mut self, size: Size2, data: Vec<Pixel>) {
        if data.len() != size.num_pixels() {
            return;
        }
        self.free.entry(size).or_default().push(data);
    }

    /// Number of fresh allocations served since construction (or last reset).
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Number of acquisitions served from the free-list.
    pub fn pool_hits(&self) -> u64 {
        self.pool_hits
    }

    /// Drop parked buffers and zero the counters.
    pub fn clear(&mut self) {
        self.free.clear();
        self.allocations = 0;
        self.pool_hits = 0;
    }
}
