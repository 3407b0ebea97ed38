//! # lyssna-core
//!
//! The cross-thread half of the delivery pipeline: what runs between a
//! capture engine's callback and the consumer's sink.
//!
//! ### Data flow
//! capture thread → [`PacketQueue::enqueue`] → [`NotificationBridge::signal`]
//! → consumer wakes → [`DrainHandler::drain`] (ids from [`Sequencer`])
//! → one [`BatchSink::deliver`] per batch.
//!
//! ### Key Submodules:
//! - `queue`: unbounded FIFO behind a single `parking_lot` mutex
//! - `bridge`: coalescing wakeup built on `tokio::sync::Notify`
//! - `sequencer`: per-packet ids assigned at drain time
//! - `drain`: batch assembly
//! - `sink`: delivered record type and the sink seam
//! - `address`: parsing of numeric host identifiers
//!
//! The queue has no upper bound. A consumer that falls behind a busy
//! capture source makes it grow until memory runs out; callers that care
//! watch [`PacketQueue::len`].

pub mod address;
pub mod bridge;
pub mod drain;
pub mod queue;
pub mod sequencer;
pub mod sink;

pub mod prelude {
    pub use crate::address::parse_host_address;
    pub use crate::bridge::{NotificationBridge, Wakeup};
    pub use crate::drain::DrainHandler;
    pub use crate::queue::PacketQueue;
    pub use crate::sequencer::Sequencer;
    pub use crate::sink::{Batch, BatchSink, DeliveredPacket, RecordingSink};
}

pub use prelude::*;
