//! The seam between the delivery pipeline and whatever produces packets.

use std::net::Ipv4Addr;
use std::sync::Arc;

use crate::error::CaptureError;
use crate::packet::Packet;

/// Invoked once per captured packet, from the engine's own thread.
pub type PacketCallback = Arc<dyn Fn(Packet) + Send + Sync>;

/// A packet source bound to a local IPv4 address.
pub trait CaptureEngine: Send {
    /// Starts delivering packets seen on `address` to `on_packet`.
    ///
    /// Errors are final: nothing is running when this returns `Err`.
    fn start(&mut self, address: Ipv4Addr, on_packet: PacketCallback) -> Result<(), CaptureError>;

    /// Stops the engine. Once this returns, `on_packet` is never called
    /// again. Calling it while stopped is a no-op.
    fn stop(&mut self);

    /// Short label used in logs.
    fn name(&self) -> &str;
}
