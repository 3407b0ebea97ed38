//! Live capture through libpcap.

use std::net::{IpAddr, Ipv4Addr};

use pcap::{Capture, Device};
use tracing::{debug, info};

use crate::engine::{CaptureEngine, PacketCallback};
use crate::error::CaptureError;
use crate::worker::CaptureWorker;

/// Device and read parameters for [`PcapEngine`].
#[derive(Debug, Clone)]
pub struct PcapOptions {
    /// Explicit device; when `None` the device owning the listen address is used.
    pub interface: Option<String>,
    pub promiscuous: bool,
    pub snaplen: i32,
    /// Read timeout, also the upper bound on how long `stop` waits.
    pub read_timeout_ms: i32,
}

impl Default for PcapOptions {
    fn default() -> Self {
        Self {
            interface: None,
            promiscuous: false,
            snaplen: 65535,
            read_timeout_ms: 100,
        }
    }
}

/// Captures live traffic to and from one local address.
pub struct PcapEngine {
    options: PcapOptions,
    worker: Option<CaptureWorker>,
}

impl PcapEngine {
    pub fn new(options: PcapOptions) -> Self {
        Self {
            options,
            worker: None,
        }
    }

    fn resolve_device(&self, address: Ipv4Addr) -> Result<Device, CaptureError> {
        if let Some(name) = &self.options.interface {
            return Device::list()?
                .into_iter()
                .find(|d| &d.name == name)
                .ok_or_else(|| CaptureError::DeviceNotFound(name.clone()));
        }

        if address.is_unspecified() {
            return Device::lookup()?
                .ok_or_else(|| CaptureError::DeviceNotFound("no default device".into()));
        }

        Device::list()?
            .into_iter()
            .find(|d| d.addresses.iter().any(|a| a.addr == IpAddr::V4(address)))
            .ok_or(CaptureError::AddressNotFound(address))
    }
}

impl CaptureEngine for PcapEngine {
    fn start(&mut self, address: Ipv4Addr, on_packet: PacketCallback) -> Result<(), CaptureError> {
        if self.worker.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }

        let device = self.resolve_device(address)?;
        info!("Opening capture on {} for {address}", device.name);

        let mut cap = Capture::from_device(device)?
            .promisc(self.options.promiscuous)
            .snaplen(self.options.snaplen)
            .timeout(self.options.read_timeout_ms)
            .immediate_mode(true)
            .open()?;

        if let Some(program) = host_filter(address) {
            debug!("Applying capture filter '{program}'");
            cap.filter(&program, true)?;
        }

        self.worker = Some(CaptureWorker::spawn(cap, on_packet)?);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
            info!("Live capture stopped");
        }
    }

    fn name(&self) -> &str {
        "pcap"
    }
}

/// BPF program restricting capture to one host; `None` for the wildcard address.
pub(crate) fn host_filter(address: Ipv4Addr) -> Option<String> {
    (!address.is_unspecified()).then(|| format!("ip host {address}"))
}
