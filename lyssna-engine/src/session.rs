//! Delivery session lifecycle.
//!
//! ```text
//! Idle ──listen──▶ Starting ──engine up──▶ Active ──stop/listen──▶ Stopping ──▶ Idle
//!                     └──engine error──▶ Idle
//! ```
//!
//! Every listen gets its own queue, bridge and consumer task. The previous
//! engine is stopped before any of them exist, so a stale capture callback
//! can never feed a queue that a newer session drains.
//!
//! Stopping takes the old queue's final drain on the caller's thread, before
//! the next listen can draw ids; only the delivery of that batch is left to
//! the old consumer. Ids therefore follow capture order across restarts.

use std::net::Ipv4Addr;
use std::sync::Arc;

use lyssna_capture::{CaptureEngine, PacketCallback};
use lyssna_config::DeliveryConfig;
use lyssna_core::{parse_host_address, BatchSink, DrainHandler, NotificationBridge, PacketQueue, Sequencer};
use lyssna_telemetry::{EventLogger, MetricsRecorder};
use opentelemetry::KeyValue;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn, Instrument};

use crate::consumer::{Consumer, ConsumerReport, Retirement};
use crate::error::SessionError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Active,
    Stopping,
}

struct ActiveListen {
    address: Ipv4Addr,
    handler: DrainHandler,
    bridge: Arc<NotificationBridge>,
    retired: oneshot::Sender<Retirement>,
    consumer: JoinHandle<ConsumerReport>,
}

/// Owns one capture engine and at most one live listen on it.
///
/// Packet ids come from a sequencer owned by the session value and keep
/// increasing across restarts.
pub struct DeliverySession {
    engine: Box<dyn CaptureEngine>,
    runtime: Handle,
    sequencer: Arc<Sequencer>,
    metrics: Arc<MetricsRecorder>,
    options: DeliveryConfig,
    state: SessionState,
    active: Option<ActiveListen>,
    generation: u64,
}

impl DeliverySession {
    /// Consumer tasks are spawned on `runtime`.
    pub fn new(engine: Box<dyn CaptureEngine>, runtime: Handle) -> Self {
        Self {
            engine,
            runtime,
            sequencer: Arc::new(Sequencer::new()),
            metrics: Arc::new(MetricsRecorder::new()),
            options: DeliveryConfig::default(),
            state: SessionState::Idle,
            active: None,
            generation: 0,
        }
    }

    pub fn with_options(mut self, options: DeliveryConfig) -> Self {
        self.options = options;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Starts listening on a numeric host address (`2130706433`,
    /// `0x7F000001` or `127.0.0.1`).
    ///
    /// Input that is not a numeric address is ignored: `Ok(None)` is returned
    /// and the current session, if any, keeps running.
    pub fn listen<S>(&mut self, address: &str, sink: S) -> Result<Option<Ipv4Addr>, SessionError>
    where
        S: BatchSink + 'static,
    {
        match parse_host_address(address) {
            Some(address) => self.listen_on(address, sink).map(Some),
            None => {
                debug!("Ignoring listen on non-numeric address {address:?}");
                Ok(None)
            }
        }
    }

    /// Stops any running listen, then starts a new one on `address`.
    #[instrument(level = "info", skip(self, sink), fields(engine = self.engine.name()))]
    pub fn listen_on<S>(&mut self, address: Ipv4Addr, sink: S) -> Result<Ipv4Addr, SessionError>
    where
        S: BatchSink + 'static,
    {
        self.stop();
        self.state = SessionState::Starting;

        let queue = Arc::new(PacketQueue::new());
        let bridge = Arc::new(NotificationBridge::new());

        let on_packet = self.capture_callback(&queue, &bridge);
        if let Err(e) = self.engine.start(address, on_packet) {
            error!("Capture engine failed to start: {e}");
            EventLogger::log_event(
                "capture_start_failed",
                vec![
                    KeyValue::new("address", address.to_string()),
                    KeyValue::new("error", e.to_string()),
                ],
            );
            self.state = SessionState::Idle;
            return Err(SessionError::CaptureStart(e));
        }

        self.generation += 1;
        let handler = DrainHandler::new(queue, self.sequencer.clone());
        let (retired, retired_rx) = oneshot::channel();
        let consumer = Consumer {
            handler: handler.clone(),
            bridge: bridge.clone(),
            sink: Box::new(sink),
            metrics: self.metrics.clone(),
            retired: retired_rx,
        };
        let span = tracing::info_span!("consumer", generation = self.generation);
        let consumer = self.runtime.spawn(consumer.run().instrument(span));

        self.active = Some(ActiveListen {
            address,
            handler,
            bridge,
            retired,
            consumer,
        });
        self.state = SessionState::Active;
        self.metrics.sessions_started.inc();

        info!("Listening on {address}");
        EventLogger::log_event(
            "session_started",
            vec![
                KeyValue::new("address", address.to_string()),
                KeyValue::new("generation", self.generation as i64),
            ],
        );
        Ok(address)
    }

    /// Stops the engine and retires the consumer. Idempotent. Packets still
    /// queued are discarded unless `flush_on_stop` is set.
    ///
    /// Stopping a live engine joins its capture thread, which can take up to
    /// the configured read timeout. On a multi-threaded runtime the join runs
    /// under [`tokio::task::block_in_place`]; on a current-thread runtime it
    /// blocks the runtime for that long.
    pub fn stop(&mut self) {
        drop(self.retire());
    }

    /// Like [`stop`](Self::stop), but waits for the consumer task to finish
    /// its last delivery. Returns `None` when nothing was running.
    pub async fn stop_and_wait(&mut self) -> Option<ConsumerReport> {
        let consumer = self.retire()?;
        match consumer.await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Consumer task ended abnormally: {e}");
                None
            }
        }
    }

    fn retire(&mut self) -> Option<JoinHandle<ConsumerReport>> {
        let active = self.active.take()?;
        self.state = SessionState::Stopping;

        // After this returns the engine makes no further callbacks, so the
        // drain below is the queue's last.
        self.stop_engine();

        let retirement = if self.options.flush_on_stop {
            Retirement {
                flushed: active.handler.drain(),
                discarded: 0,
            }
        } else {
            let discarded = active.handler.discard();
            if discarded > 0 {
                debug!("Discarding {discarded} undelivered packets");
                self.metrics.record_discarded(discarded);
            }
            Retirement {
                flushed: Vec::new(),
                discarded,
            }
        };
        let flushed = retirement.flushed.len();
        let discarded = retirement.discarded;

        if active.retired.send(retirement).is_err() {
            warn!("Consumer ended before its final batch");
        }
        active.bridge.close();
        self.state = SessionState::Idle;

        info!(
            "Stopped listening on {} ({flushed} flushed, {discarded} discarded)",
            active.address
        );
        EventLogger::log_event(
            "session_stopped",
            vec![KeyValue::new("address", active.address.to_string())],
        );
        Some(active.consumer)
    }

    fn stop_engine(&mut self) {
        let engine = &mut self.engine;
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| engine.stop())
            }
            _ => engine.stop(),
        }
    }

    fn capture_callback(
        &self,
        queue: &Arc<PacketQueue>,
        bridge: &Arc<NotificationBridge>,
    ) -> PacketCallback {
        let queue = queue.clone();
        let bridge = bridge.clone();
        let metrics = self.metrics.clone();
        let high_water_mark = self.options.high_water_mark;

        Arc::new(move |packet| {
            metrics.record_enqueued();
            let depth = queue.enqueue(packet);
            if high_water_mark > 0 && depth == high_water_mark {
                warn!("Packet queue reached {depth} entries; consumer is falling behind");
            }
            bridge.signal();
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Address of the running listen.
    pub fn address(&self) -> Option<Ipv4Addr> {
        self.active.as_ref().map(|a| a.address)
    }

    /// Number of successful listens so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Packets captured but not yet drained by the running listen.
    pub fn pending(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.handler.queue().len())
    }

    /// Last packet id handed out.
    pub fn last_id(&self) -> u64 {
        self.sequencer.last()
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }
}

impl Drop for DeliverySession {
    fn drop(&mut self) {
        self.stop();
    }
}
