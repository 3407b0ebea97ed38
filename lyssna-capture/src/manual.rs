//! An engine driven by its embedder: packets are pushed in through a
//! [`ManualHandle`] from any thread. Host bindings that already own a capture
//! loop use it, and so do the lifecycle tests.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::engine::{CaptureEngine, PacketCallback};
use crate::error::CaptureError;
use crate::packet::Packet;

#[derive(Default)]
struct Shared {
    /// Held for the duration of every injection, so `stop` waits for an
    /// in-flight callback and nothing is delivered after it returns.
    callback: Mutex<Option<PacketCallback>>,
    starts: Mutex<Vec<Ipv4Addr>>,
    stops: AtomicUsize,
    fail_next_start: Mutex<Option<CaptureError>>,
}

pub struct ManualEngine {
    shared: Arc<Shared>,
}

/// Producer side of a [`ManualEngine`]. Cheap to clone and `Send`.
#[derive(Clone)]
pub struct ManualHandle {
    shared: Arc<Shared>,
}

impl ManualEngine {
    pub fn new() -> (Self, ManualHandle) {
        let shared = Arc::new(Shared::default());
        (
            Self {
                shared: shared.clone(),
            },
            ManualHandle { shared },
        )
    }
}

impl CaptureEngine for ManualEngine {
    fn start(&mut self, address: Ipv4Addr, on_packet: PacketCallback) -> Result<(), CaptureError> {
        if let Some(err) = self.shared.fail_next_start.lock().take() {
            return Err(err);
        }

        let mut callback = self.shared.callback.lock();
        if callback.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }
        *callback = Some(on_packet);
        self.shared.starts.lock().push(address);
        debug!("Manual engine started for {address}");
        Ok(())
    }

    fn stop(&mut self) {
        if self.shared.callback.lock().take().is_some() {
            self.shared.stops.fetch_add(1, Ordering::Relaxed);
            debug!("Manual engine stopped");
        }
    }

    fn name(&self) -> &str {
        "manual"
    }
}

impl ManualHandle {
    /// Delivers `packet` through the running callback on the calling thread.
    /// Returns `false` (and drops the packet) when the engine is stopped.
    pub fn inject(&self, packet: Packet) -> bool {
        let callback = self.shared.callback.lock();
        match callback.as_ref() {
            Some(on_packet) => {
                on_packet(packet);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.callback.lock().is_some()
    }

    /// Addresses passed to every successful `start`, oldest first.
    pub fn starts(&self) -> Vec<Ipv4Addr> {
        self.shared.starts.lock().clone()
    }

    /// Number of `stop` calls that actually stopped a running engine.
    pub fn stops(&self) -> usize {
        self.shared.stops.load(Ordering::Relaxed)
    }

    /// Makes the next `start` fail with `err`.
    pub fn fail_next_start(&self, err: CaptureError) {
        *self.shared.fail_next_start.lock() = Some(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(protocol: u8) -> Packet {
        Packet::new(protocol, 40, "10.0.0.1", "10.0.0.2", b"")
    }

    #[test]
    fn injects_only_while_running() {
        let (mut engine, handle) = ManualEngine::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        assert!(!handle.inject(sample(6)));

        let sink = seen.clone();
        engine
            .start(Ipv4Addr::LOCALHOST, Arc::new(move |p| sink.lock().push(p)))
            .unwrap();
        assert!(handle.inject(sample(6)));
        assert!(handle.inject(sample(17)));

        engine.stop();
        assert!(!handle.inject(sample(1)));

        let protocols: Vec<u8> = seen.lock().iter().map(|p| p.protocol).collect();
        assert_eq!(protocols, vec![6, 17]);
        assert_eq!(handle.starts(), vec![Ipv4Addr::LOCALHOST]);
        assert_eq!(handle.stops(), 1);
    }

    #[test]
    fn primed_failure_applies_once() {
        let (mut engine, handle) = ManualEngine::new();
        handle.fail_next_start(CaptureError::InsufficientPermissions);

        let err = engine
            .start(Ipv4Addr::LOCALHOST, Arc::new(|_| {}))
            .unwrap_err();
        assert!(matches!(err, CaptureError::InsufficientPermissions));
        assert!(!handle.is_running());

        engine.start(Ipv4Addr::LOCALHOST, Arc::new(|_| {})).unwrap();
        assert!(handle.is_running());
    }

    #[test]
    fn double_start_is_rejected() {
        let (mut engine, _handle) = ManualEngine::new();
        engine.start(Ipv4Addr::LOCALHOST, Arc::new(|_| {})).unwrap();
        assert!(matches!(
            engine.start(Ipv4Addr::LOCALHOST, Arc::new(|_| {})),
            Err(CaptureError::AlreadyRunning)
        ));
    }
}
