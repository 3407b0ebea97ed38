//! Batch assembly on the consumer side.

use std::sync::Arc;

use tracing::trace;

use crate::queue::PacketQueue;
use crate::sequencer::Sequencer;
use crate::sink::{Batch, DeliveredPacket};

/// Drains one session's queue, numbering packets as they come out.
///
/// The handler is bound to exactly one queue for its whole life. The
/// sequencer may be shared across sessions so ids keep increasing; the
/// queue is emptied and numbered under the sequencer's turn, so a packet
/// drained later never gets a smaller id.
#[derive(Debug, Clone)]
pub struct DrainHandler {
    queue: Arc<PacketQueue>,
    sequencer: Arc<Sequencer>,
}

impl DrainHandler {
    pub fn new(queue: Arc<PacketQueue>, sequencer: Arc<Sequencer>) -> Self {
        Self { queue, sequencer }
    }

    /// Takes everything queued so far. Ids are assigned after the queue lock
    /// is released.
    pub fn drain(&self) -> Batch {
        let _turn = self.sequencer.turn();
        let packets = self.queue.drain_all();
        let batch: Batch = packets
            .into_iter()
            .map(|packet| DeliveredPacket::new(self.sequencer.next(), packet))
            .collect();
        if let (Some(first), Some(last)) = (batch.first(), batch.last()) {
            trace!("Drained ids {}..={}", first.id, last.id);
        }
        batch
    }

    /// Empties the queue without drawing ids. Returns how many packets
    /// were dropped.
    pub fn discard(&self) -> usize {
        let _turn = self.sequencer.turn();
        self.queue.drain_all().len()
    }

    pub fn queue(&self) -> &Arc<PacketQueue> {
        &self.queue
    }
}
