//! ## lyssna-core::bridge
//! **Coalescing wakeup from capture threads to one consumer task**
//!
//! `signal` may be called from any thread any number of times and never
//! blocks. Signals raised while a wakeup is already pending are folded into
//! it, so a burst of captures costs the consumer one wakeup.
//!
//! The `pending` flag is cleared by the consumer *before* it drains. A signal
//! that races with the drain therefore either finds its packet already taken
//! or arms a fresh wakeup; it is never lost.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::Notify;

/// Why [`NotificationBridge::wait`] returned.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Wakeup {
    /// At least one signal arrived since the previous wakeup.
    Pending,
    /// The bridge was closed; the consumer should exit.
    Closed,
}

#[derive(Debug, Default)]
pub struct NotificationBridge {
    notify: Notify,
    pending: AtomicBool,
    closed: AtomicBool,
    signals: AtomicU64,
    coalesced: AtomicU64,
    wakeups: AtomicU64,
}

impl NotificationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a wakeup unless one is already pending.
    #[inline]
    pub fn signal(&self) {
        self.signals.fetch_add(1, Ordering::Relaxed);
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if self.pending.swap(true, Ordering::AcqRel) {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
        } else {
            self.notify.notify_one();
        }
    }

    /// Waits for the next wakeup. Only one task may wait on a bridge.
    pub async fn wait(&self) -> Wakeup {
        if self.is_closed() {
            return Wakeup::Closed;
        }
        self.notify.notified().await;
        if self.is_closed() {
            return Wakeup::Closed;
        }
        self.pending.store(false, Ordering::Release);
        self.wakeups.fetch_add(1, Ordering::Relaxed);
        Wakeup::Pending
    }

    /// Wakes the consumer for the last time. Later signals are ignored.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Total `signal` calls, including ignored ones.
    pub fn signals(&self) -> u64 {
        self.signals.load(Ordering::Relaxed)
    }

    /// Signals that were folded into an already pending wakeup.
    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }

    /// Wakeups handed to the consumer.
    pub fn wakeups(&self) -> u64 {
        self.wakeups.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn burst_of_signals_wakes_once() {
        let bridge = NotificationBridge::new();
        for _ in 0..5 {
            bridge.signal();
        }

        assert_eq!(bridge.wait().await, Wakeup::Pending);
        assert!(timeout(Duration::from_millis(20), bridge.wait())
            .await
            .is_err());

        assert_eq!(bridge.signals(), 5);
        assert_eq!(bridge.coalesced(), 4);
        assert_eq!(bridge.wakeups(), 1);
    }

    #[tokio::test]
    async fn signal_after_wakeup_rearms() {
        let bridge = NotificationBridge::new();
        bridge.signal();
        assert_eq!(bridge.wait().await, Wakeup::Pending);

        bridge.signal();
        assert_eq!(bridge.wait().await, Wakeup::Pending);
        assert_eq!(bridge.wakeups(), 2);
        assert_eq!(bridge.coalesced(), 0);
    }

    #[tokio::test]
    async fn close_releases_waiter() {
        let bridge = Arc::new(NotificationBridge::new());
        let waiter = tokio::spawn({
            let bridge = bridge.clone();
            async move { bridge.wait().await }
        });

        tokio::task::yield_now().await;
        bridge.close();

        assert_eq!(waiter.await.unwrap(), Wakeup::Closed);
        assert_eq!(bridge.wait().await, Wakeup::Closed);
    }

    #[tokio::test]
    async fn signals_after_close_are_ignored() {
        let bridge = NotificationBridge::new();
        bridge.close();
        bridge.signal();

        assert_eq!(bridge.wait().await, Wakeup::Closed);
        assert_eq!(bridge.signals(), 1);
        assert_eq!(bridge.wakeups(), 0);
    }

    #[test]
    fn signal_from_many_threads_never_blocks() {
        let bridge = Arc::new(NotificationBridge::new());
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let bridge = bridge.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        bridge.signal();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(bridge.signals(), 4000);
        assert_eq!(bridge.coalesced(), 3999);
    }
}
