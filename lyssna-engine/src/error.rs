use lyssna_capture::CaptureError;
use lyssna_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The capture engine refused to start; carried verbatim, never retried.
    #[error("Capture engine failed to start: {0}")]
    CaptureStart(#[from] CaptureError),

    #[error("Not a numeric host address: {0:?}")]
    InvalidAddress(String),

    #[error("Unsupported capture mode: {0}")]
    UnsupportedMode(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
