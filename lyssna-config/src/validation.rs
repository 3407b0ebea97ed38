// lyssna-config/src/validation.rs
//! Custom validation functions for configuration.

use validator::ValidationError;

use crate::CaptureConfig;

/// Validate that an interface name follows Linux naming conventions.
pub fn validate_interface(name: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^[a-zA-Z0-9_.:-]{1,15}$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;

    if re.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_interface"))
    }
}

/// Validate log level.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

/// Validate capture mode.
pub fn validate_mode(mode: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^(pcap|replay)$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(mode) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_capture_mode"))
    }
}

/// Replay mode needs a file to replay.
pub fn validate_capture_source(config: &CaptureConfig) -> Result<(), ValidationError> {
    if config.mode == "replay" && config.replay_file.is_none() {
        return Err(ValidationError::new("replay_file_required"));
    }
    Ok(())
}
