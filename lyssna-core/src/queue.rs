//! ## lyssna-core::queue
//! **Unbounded FIFO shared by the capture thread and the consumer**
//!
//! One `parking_lot` mutex guards a `VecDeque`. Enqueue is a push under the
//! lock; drain swaps the whole deque out under the lock and converts it after
//! the lock is released, so both critical sections are O(1).

use std::collections::VecDeque;

use lyssna_capture::Packet;
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct PacketQueue {
    packets: Mutex<VecDeque<Packet>>,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `packet` and returns the depth after the append.
    #[inline]
    pub fn enqueue(&self, packet: Packet) -> usize {
        let mut packets = self.packets.lock();
        packets.push_back(packet);
        packets.len()
    }

    /// Removes everything currently queued, oldest first.
    pub fn drain_all(&self) -> Vec<Packet> {
        let drained = std::mem::take(&mut *self.packets.lock());
        Vec::from(drained)
    }

    pub fn len(&self) -> usize {
        self.packets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    fn packet(size: u32) -> Packet {
        Packet::new(6, size, "10.0.0.1:1", "10.0.0.2:2", b"")
    }

    #[test]
    fn enqueue_reports_depth() {
        let queue = PacketQueue::new();
        assert_eq!(queue.enqueue(packet(1)), 1);
        assert_eq!(queue.enqueue(packet(2)), 2);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn drain_takes_everything_in_order() {
        let queue = PacketQueue::new();
        for size in 1..=3 {
            queue.enqueue(packet(size));
        }

        let sizes: Vec<u32> = queue.drain_all().iter().map(|p| p.data_size).collect();
        assert_eq!(sizes, vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_of_empty_queue_is_empty() {
        let queue = PacketQueue::new();
        assert!(queue.drain_all().is_empty());
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn concurrent_producers_keep_per_thread_order() {
        let queue = Arc::new(PacketQueue::new());
        let producers: Vec<_> = (0..4u32)
            .map(|t| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..1000u32 {
                        queue.enqueue(packet(t * 10_000 + i));
                    }
                })
            })
            .collect();

        let mut drained = Vec::new();
        while drained.len() < 4000 {
            drained.extend(queue.drain_all());
            thread::yield_now();
        }
        for producer in producers {
            producer.join().unwrap();
        }
        drained.extend(queue.drain_all());

        assert_eq!(drained.len(), 4000);
        for t in 0..4u32 {
            let seen: Vec<u32> = drained
                .iter()
                .map(|p| p.data_size)
                .filter(|s| s / 10_000 == t)
                .collect();
            let expected: Vec<u32> = (0..1000).map(|i| t * 10_000 + i).collect();
            assert_eq!(seen, expected);
        }
    }

    proptest! {
        // `true` enqueues the next packet, `false` drains.
        #[test]
        fn interleaved_drains_preserve_fifo(ops in proptest::collection::vec(any::<bool>(), 0..200)) {
            let queue = PacketQueue::new();
            let mut next = 0u32;
            let mut delivered = Vec::new();

            for op in ops {
                if op {
                    queue.enqueue(packet(next));
                    next += 1;
                } else {
                    delivered.extend(queue.drain_all().into_iter().map(|p| p.data_size));
                }
            }
            delivered.extend(queue.drain_all().into_iter().map(|p| p.data_size));

            prop_assert_eq!(delivered, (0..next).collect::<Vec<_>>());
        }
    }
}
