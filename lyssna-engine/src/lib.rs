//! # lyssna-engine
//!
//! Owns the listen lifecycle: wires a capture engine to a fresh queue and
//! bridge, runs the consumer task that drains batches into the caller's
//! sink, and tears it all down again on stop or restart.

mod consumer;
pub mod error;
pub mod runtime;
pub mod session;

pub use consumer::ConsumerReport;
pub use error::SessionError;
pub use runtime::{engine_from_config, run_listener};
pub use session::{DeliverySession, SessionState};
