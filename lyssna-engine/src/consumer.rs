//! The consumer task: one per listen, waits on the bridge and hands every
//! drained batch to the sink.

use std::sync::Arc;

use lyssna_core::{Batch, BatchSink, DrainHandler, NotificationBridge, Wakeup};
use lyssna_telemetry::MetricsRecorder;
use tokio::sync::oneshot;
use tracing::{debug, trace};

/// What a finished consumer task did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    pub batches: u64,
    pub delivered: u64,
    /// Packets still queued at stop and dropped (`flush_on_stop = false`).
    pub discarded: u64,
}

/// The last drain of a listen, taken by the session when it stops.
#[derive(Debug, Default)]
pub(crate) struct Retirement {
    /// Already numbered; empty unless `flush_on_stop` is set.
    pub(crate) flushed: Batch,
    pub(crate) discarded: usize,
}

pub(crate) struct Consumer {
    pub(crate) handler: DrainHandler,
    pub(crate) bridge: Arc<NotificationBridge>,
    pub(crate) sink: Box<dyn BatchSink>,
    pub(crate) metrics: Arc<MetricsRecorder>,
    pub(crate) retired: oneshot::Receiver<Retirement>,
}

impl Consumer {
    pub(crate) async fn run(mut self) -> ConsumerReport {
        let mut report = ConsumerReport::default();
        debug!("Consumer started");

        while let Wakeup::Pending = self.bridge.wait().await {
            let batch = self.handler.drain();
            self.deliver(batch, &mut report);
        }

        match (&mut self.retired).await {
            Ok(Retirement { flushed, discarded }) => {
                self.deliver(flushed, &mut report);
                report.discarded = discarded as u64;
            }
            Err(_) => debug!("Session went away without a final drain"),
        }

        debug!(
            "Consumer finished: {} batches, {} packets",
            report.batches, report.delivered
        );
        report
    }

    fn deliver(&self, batch: Batch, report: &mut ConsumerReport) {
        if batch.is_empty() {
            trace!("Wakeup with nothing queued");
            return;
        }

        let size = batch.len();
        debug!("Delivering batch of {size} packets");
        self.sink.deliver(batch);
        self.metrics.record_batch(size);
        report.batches += 1;
        report.delivered += size as u64;
    }
}
