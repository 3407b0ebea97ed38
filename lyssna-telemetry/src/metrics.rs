//! ## lyssna-telemetry::metrics
//! **Prometheus counters for the delivery pipeline**

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub packets_enqueued: IntCounter,
    pub packets_delivered: IntCounter,
    pub packets_discarded: IntCounter,
    pub batches_delivered: IntCounter,
    pub sessions_started: IntCounter,
    pub queue_depth: IntGauge,
    pub batch_size: Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::try_new().expect("metric definitions are static and valid")
    }

    fn try_new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let packets_enqueued =
            IntCounter::new("lyssna_packets_enqueued_total", "Packets queued by capture")?;
        let packets_delivered =
            IntCounter::new("lyssna_packets_delivered_total", "Packets handed to sinks")?;
        let packets_discarded = IntCounter::new(
            "lyssna_packets_discarded_total",
            "Queued packets dropped when a session stopped",
        )?;
        let batches_delivered =
            IntCounter::new("lyssna_batches_delivered_total", "Non-empty batches delivered")?;
        let sessions_started =
            IntCounter::new("lyssna_sessions_started_total", "Successful listen calls")?;
        let queue_depth = IntGauge::new("lyssna_queue_depth", "Packets waiting to be drained")?;
        let batch_size = Histogram::with_opts(
            HistogramOpts::new("lyssna_batch_size", "Packets per delivered batch")
                .buckets(vec![1.0, 4.0, 16.0, 64.0, 256.0, 1024.0, 4096.0]),
        )?;

        registry.register(Box::new(packets_enqueued.clone()))?;
        registry.register(Box::new(packets_delivered.clone()))?;
        registry.register(Box::new(packets_discarded.clone()))?;
        registry.register(Box::new(batches_delivered.clone()))?;
        registry.register(Box::new(sessions_started.clone()))?;
        registry.register(Box::new(queue_depth.clone()))?;
        registry.register(Box::new(batch_size.clone()))?;

        Ok(Self {
            registry,
            packets_enqueued,
            packets_delivered,
            packets_discarded,
            batches_delivered,
            sessions_started,
            queue_depth,
            batch_size,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Called by capture before the packet is queued, so the depth gauge
    /// never dips below the packets actually waiting.
    #[inline]
    pub fn record_enqueued(&self) {
        self.packets_enqueued.inc();
        self.queue_depth.inc();
    }

    pub fn record_batch(&self, size: usize) {
        self.batches_delivered.inc();
        self.packets_delivered.inc_by(size as u64);
        self.batch_size.observe(size as f64);
        self.queue_depth.sub(size as i64);
    }

    pub fn record_discarded(&self, count: usize) {
        self.packets_discarded.inc_by(count as u64);
        self.queue_depth.sub(count as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_updates_counters() {
        let metrics = MetricsRecorder::new();
        metrics.record_enqueued();
        metrics.record_enqueued();
        assert_eq!(metrics.queue_depth.get(), 2);

        metrics.record_batch(2);
        assert_eq!(metrics.packets_enqueued.get(), 2);
        assert_eq!(metrics.packets_delivered.get(), 2);
        assert_eq!(metrics.batches_delivered.get(), 1);
        assert_eq!(metrics.queue_depth.get(), 0);
    }

    #[test]
    fn depth_tracks_packets_across_sessions() {
        let metrics = MetricsRecorder::new();
        for _ in 0..3 {
            metrics.record_enqueued();
        }
        // A second session starts queueing before the first one is drained.
        metrics.record_enqueued();
        metrics.record_batch(2);
        assert_eq!(metrics.queue_depth.get(), 2);

        metrics.record_discarded(1);
        assert_eq!(metrics.queue_depth.get(), 1);
        metrics.record_batch(1);
        assert_eq!(metrics.queue_depth.get(), 0);
    }

    #[test]
    fn exposition_names_all_metrics() {
        let metrics = MetricsRecorder::new();
        for _ in 0..3 {
            metrics.record_enqueued();
        }
        metrics.record_discarded(3);
        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("lyssna_packets_discarded_total 3"));
        assert!(text.contains("lyssna_batch_size"));
        assert!(text.contains("lyssna_sessions_started_total 0"));
    }
}
