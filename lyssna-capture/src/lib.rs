//! lyssna‑capture
//!
//! Capture engines that feed the delivery pipeline. Every engine implements
//! [`CaptureEngine`]: it is started with a local IPv4 address and a callback,
//! and invokes that callback once per decoded IPv4 packet from its own thread
//! until stopped.
//!
//! - [`PcapEngine`]: live capture through libpcap
//! - [`ReplayEngine`]: offline replay of a pcap file
//! - [`ManualEngine`]: packets injected by the embedder (tests, bindings)

pub mod engine;
pub mod error;
pub mod host;
pub mod live;
pub mod manual;
pub mod packet;
pub mod replay;

mod worker;

pub use engine::{CaptureEngine, PacketCallback};
pub use error::CaptureError;
pub use host::{get_hostname, get_interface_addresses, InterfaceAddress};
pub use live::{PcapEngine, PcapOptions};
pub use manual::{ManualEngine, ManualHandle};
pub use packet::Packet;
pub use replay::ReplayEngine;
