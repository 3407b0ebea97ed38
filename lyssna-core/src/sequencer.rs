//! Per-packet ids handed out on the drain path.
//!
//! Ids identify packets and order them; they are not capture timestamps.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct Sequencer {
    last: AtomicU64,
    turn: Mutex<()>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id. The first call returns 1.
    #[inline]
    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Exclusive right to number a batch. While the guard is held no other
    /// drain sharing this sequencer can draw ids, so each batch gets a
    /// contiguous range.
    pub fn turn(&self) -> MutexGuard<'_, ()> {
        self.turn.lock()
    }

    /// Most recently issued id, 0 if none yet.
    #[inline]
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one() {
        let seq = Sequencer::new();
        assert_eq!(seq.last(), 0);
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.next(), 2);
        assert_eq!(seq.last(), 2);
    }
}
