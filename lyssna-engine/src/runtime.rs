/*!
# Runtime

Builds capture engines from configuration and runs a single listen until a
shutdown future resolves. Frontends (the CLI, host bindings) share this path
so they log, meter and tear down the same way.
*/

use std::future::Future;
use std::sync::Arc;

use lyssna_capture::{CaptureEngine, PcapEngine, PcapOptions, ReplayEngine};
use lyssna_config::{CaptureConfig, LyssnaConfig};
use lyssna_core::BatchSink;
use lyssna_telemetry::MetricsRecorder;
use tokio::runtime::Handle;
use tracing::{info, instrument};

use crate::consumer::ConsumerReport;
use crate::error::SessionError;
use crate::session::DeliverySession;

/// Picks the engine named by `capture.mode`.
pub fn engine_from_config(capture: &CaptureConfig) -> Result<Box<dyn CaptureEngine>, SessionError> {
    match capture.mode.as_str() {
        "pcap" => Ok(Box::new(PcapEngine::new(PcapOptions {
            interface: capture.interface.clone(),
            promiscuous: capture.promiscuous,
            snaplen: i32::try_from(capture.snaplen).unwrap_or(i32::MAX),
            read_timeout_ms: i32::try_from(capture.read_timeout_ms).unwrap_or(i32::MAX),
        }))),
        "replay" => match &capture.replay_file {
            Some(path) => Ok(Box::new(ReplayEngine::new(path.clone()))),
            None => Err(SessionError::UnsupportedMode(
                "replay mode without replay_file".into(),
            )),
        },
        other => Err(SessionError::UnsupportedMode(other.to_string())),
    }
}

/// Listens on `address` with the configured engine until `shutdown`
/// resolves, then stops and waits for the last delivery.
///
/// Unlike [`DeliverySession::listen`], a non-numeric address is an error
/// here: there is no running session for it to leave untouched.
#[instrument(level = "info", name = "run_listener", skip(config, sink, metrics, shutdown))]
pub async fn run_listener<S, F>(
    config: &LyssnaConfig,
    address: &str,
    sink: S,
    metrics: Arc<MetricsRecorder>,
    shutdown: F,
) -> Result<ConsumerReport, SessionError>
where
    S: BatchSink + 'static,
    F: Future<Output = ()>,
{
    let engine = engine_from_config(&config.capture)?;
    let mut session = DeliverySession::new(engine, Handle::current())
        .with_options(config.delivery.clone())
        .with_metrics(metrics);

    if session.listen(address, sink)?.is_none() {
        return Err(SessionError::InvalidAddress(address.to_string()));
    }

    shutdown.await;
    info!("Shutdown requested");

    let report = session.stop_and_wait().await.unwrap_or_default();
    info!(
        "Delivered {} packets in {} batches ({} discarded)",
        report.delivered, report.batches, report.discarded
    );
    Ok(report)
}
