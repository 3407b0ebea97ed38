//! Delivered records and the sink seam.

use std::sync::Arc;

use lyssna_capture::Packet;
use parking_lot::Mutex;
use serde::Serialize;

/// A packet as the consumer sees it, tagged with its drain-time id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveredPacket {
    pub protocol: u8,
    pub id: u64,
    pub size: u32,
    pub from: String,
    pub to: String,
    pub data: String,
    pub hex: String,
}

impl DeliveredPacket {
    pub fn new(id: u64, packet: Packet) -> Self {
        Self {
            protocol: packet.protocol,
            id,
            size: packet.data_size,
            from: packet.from,
            to: packet.to,
            data: packet.readable_data,
            hex: packet.hex_data,
        }
    }
}

/// One drained batch, in capture order.
pub type Batch = Vec<DeliveredPacket>;

/// Receives drained batches on the consumer task.
pub trait BatchSink: Send + Sync {
    fn deliver(&self, batch: Batch);
}

impl<F> BatchSink for F
where
    F: Fn(Batch) + Send + Sync,
{
    fn deliver(&self, batch: Batch) {
        self(batch)
    }
}

/// Sink that keeps every batch it is given. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    batches: Arc<Mutex<Vec<Batch>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Batch> {
        self.batches.lock().clone()
    }

    /// All delivered packets, flattened across batches.
    pub fn packets(&self) -> Vec<DeliveredPacket> {
        self.batches.lock().iter().flatten().cloned().collect()
    }
}

impl BatchSink for RecordingSink {
    fn deliver(&self, batch: Batch) {
        self.batches.lock().push(batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_sinks() {
        let seen = Arc::new(Mutex::new(0usize));
        let counter = seen.clone();
        let sink = move |batch: Batch| *counter.lock() += batch.len();

        let packet = Packet::new(17, 60, "a", "b", b"x");
        sink.deliver(vec![DeliveredPacket::new(1, packet)]);
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn record_keeps_packet_fields() {
        let packet = Packet::new(6, 40, "10.0.0.1:80", "10.0.0.2:5000", b"hi");
        let record = DeliveredPacket::new(7, packet);
        assert_eq!(record.id, 7);
        assert_eq!(record.protocol, 6);
        assert_eq!(record.size, 40);
        assert_eq!(record.data, "hi");
        assert_eq!(record.hex, "6869");
    }
}
