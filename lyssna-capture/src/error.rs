use std::net::Ipv4Addr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture device not found: {0}")]
    DeviceNotFound(String),

    #[error("No capture device owns address {0}")]
    AddressNotFound(Ipv4Addr),

    #[error("Insufficient permissions for packet capture (try running as root)")]
    InsufficientPermissions,

    #[error("Unsupported datalink type: {0}")]
    UnsupportedLink(i32),

    #[error("Capture engine already running")]
    AlreadyRunning,

    #[error("PCAP error: {0}")]
    Pcap(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<pcap::Error> for CaptureError {
    fn from(err: pcap::Error) -> Self {
        let msg = err.to_string();
        if msg.contains("permission") || msg.contains("Operation not permitted") {
            CaptureError::InsufficientPermissions
        } else {
            CaptureError::Pcap(msg)
        }
    }
}
