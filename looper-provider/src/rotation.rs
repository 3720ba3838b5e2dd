use std::sync::atomic::{AtomicU64, Ordering};

/// Round-robin cursor shared by concurrent callers.
///
/// The count only grows; the index it yields is taken modulo the size of
/// the set being rotated at the time of the call.
#[derive(Debug, Default)]
pub struct RotationCounter {
    count: AtomicU64,
}

impl RotationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(count: u64) -> Self {
        Self {
            count: AtomicU64::new(count),
        }
    }

    /// Increments the counter and maps the new value onto `0..len`.
    /// Returns `None` for an empty set, without touching the counter.
    pub fn next_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let count = self.count.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        Some((count % len as u64) as usize)
    }

    /// Selections made so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}
