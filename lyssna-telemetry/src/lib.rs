//! # Lyssna Telemetry
//!
//! Structured logging setup and the Prometheus metrics the delivery
//! pipeline reports into.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
