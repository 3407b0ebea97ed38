//! Offline replay of a pcap savefile through the same read loop as live
//! capture. Useful without capture privileges and for reproducing traffic.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use pcap::Capture;
use tracing::{debug, info};

use crate::engine::{CaptureEngine, PacketCallback};
use crate::error::CaptureError;
use crate::live::host_filter;
use crate::worker::CaptureWorker;

pub struct ReplayEngine {
    path: PathBuf,
    worker: Option<CaptureWorker>,
}

impl ReplayEngine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            worker: None,
        }
    }
}

impl CaptureEngine for ReplayEngine {
    fn start(&mut self, address: Ipv4Addr, on_packet: PacketCallback) -> Result<(), CaptureError> {
        if self.worker.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }
        if !self.path.exists() {
            return Err(CaptureError::DeviceNotFound(
                self.path.to_string_lossy().into_owned(),
            ));
        }

        info!("Replaying {} for {address}", self.path.display());
        let mut cap = Capture::from_file(&self.path)?;
        if let Some(program) = host_filter(address) {
            debug!("Applying replay filter '{program}'");
            cap.filter(&program, true)?;
        }

        self.worker = Some(CaptureWorker::spawn(cap, on_packet)?);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
            info!("Replay stopped");
        }
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::packet::Packet;

    fn udp_frame(dst: [u8; 4], payload: &[u8]) -> Vec<u8> {
        let total = (20 + 8 + payload.len()) as u16;
        let mut frame = vec![0u8; 12];
        frame.extend_from_slice(&[0x08, 0x00]);
        frame.extend_from_slice(&[0x45, 0x00]);
        frame.extend_from_slice(&total.to_be_bytes());
        frame.extend_from_slice(&[0, 0, 0, 0, 64, 17, 0, 0, 10, 0, 0, 1]);
        frame.extend_from_slice(&dst);
        frame.extend_from_slice(&[0x30, 0x39, 0x00, 0x35]);
        frame.extend_from_slice(&((8 + payload.len()) as u16).to_be_bytes());
        frame.extend_from_slice(&[0, 0]);
        frame.extend_from_slice(payload);
        frame
    }

    fn write_savefile(path: &std::path::Path, frames: &[Vec<u8>]) {
        let mut out = Vec::new();
        out.extend_from_slice(&0xa1b2c3d4u32.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&4u16.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&65535u32.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes()); // LINKTYPE_ETHERNET
        for (i, frame) in frames.iter().enumerate() {
            out.extend_from_slice(&(i as u32).to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
            out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
            out.extend_from_slice(frame);
        }
        std::fs::write(path, out).unwrap();
    }

    #[test]
    fn replays_only_traffic_for_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.pcap");
        write_savefile(
            &path,
            &[
                udp_frame([10, 0, 0, 2], b"one"),
                udp_frame([10, 9, 9, 9], b"other"),
                udp_frame([10, 0, 0, 2], b"two"),
            ],
        );

        let (tx, rx) = mpsc::channel::<Packet>();
        let mut engine = ReplayEngine::new(&path);
        engine
            .start(
                Ipv4Addr::new(10, 0, 0, 2),
                Arc::new(move |packet| {
                    let _ = tx.send(packet);
                }),
            )
            .unwrap();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        engine.stop();

        assert_eq!(first.readable_data, "one");
        assert_eq!(first.to, "10.0.0.2:53");
        assert_eq!(first.from, "10.0.0.1:12345");
        assert_eq!(second.readable_data, "two");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn missing_file_fails_to_start() {
        let mut engine = ReplayEngine::new("/nonexistent/trace.pcap");
        let result = engine.start(Ipv4Addr::LOCALHOST, Arc::new(|_| {}));
        assert!(matches!(result, Err(CaptureError::DeviceNotFound(_))));
    }
}
