//! Capture read loop shared by the live and replay engines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use lyssna_protocols::{decode_frame, LinkLayer};
use pcap::{Activated, Capture};
use tracing::{debug, trace, warn};

use crate::engine::PacketCallback;
use crate::error::CaptureError;
use crate::packet::Packet;

/// A running capture thread plus the flag that ends it.
pub(crate) struct CaptureWorker {
    terminate: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureWorker {
    /// Moves `cap` onto a dedicated thread and starts reading.
    pub(crate) fn spawn<T>(cap: Capture<T>, on_packet: PacketCallback) -> Result<Self, CaptureError>
    where
        T: Activated + 'static,
        Capture<T>: Send,
    {
        let datalink = cap.get_datalink();
        let link = LinkLayer::from_dlt(datalink.0).ok_or(CaptureError::UnsupportedLink(datalink.0))?;

        let terminate = Arc::new(AtomicBool::new(false));
        let handle = thread::Builder::new().name("lyssna-capture".into()).spawn({
            let terminate = terminate.clone();
            move || run_capture_loop(cap, link, &terminate, &on_packet)
        })?;

        Ok(Self {
            terminate,
            handle: Some(handle),
        })
    }

    /// Raises the terminate flag and joins the thread. The loop notices the
    /// flag within one read timeout.
    pub(crate) fn stop(&mut self) {
        self.terminate.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Capture thread panicked");
            }
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_capture_loop<T: Activated>(
    mut cap: Capture<T>,
    link: LinkLayer,
    terminate: &AtomicBool,
    on_packet: &PacketCallback,
) {
    debug!("Capture loop started ({:?})", link);
    let mut captured = 0u64;

    while !terminate.load(Ordering::Acquire) {
        match cap.next_packet() {
            Ok(frame) => match decode_frame(link, frame.data) {
                Ok(ipv4) => {
                    captured += 1;
                    trace!("Captured packet: {} bytes", frame.data.len());
                    on_packet(Packet::from_frame(&ipv4));
                }
                Err(e) => trace!("Skipping frame: {e}"),
            },
            Err(pcap::Error::TimeoutExpired) => continue,
            Err(pcap::Error::NoMorePackets) => {
                debug!("End of capture source");
                break;
            }
            Err(e) => {
                warn!("Error capturing packet: {e}");
                break;
            }
        }
    }

    debug!("Capture loop finished after {captured} packets");
}
