// lyssna-config/src/capture.rs
//! Packet capture configuration.
//!
//! Selects the capture engine and its read parameters:
//! - Live capture through libpcap (`pcap`)
//! - Offline replay of a savefile (`replay`)

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Packet capture configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
#[validate(schema(function = validation::validate_capture_source))]
pub struct CaptureConfig {
    /// Capture mode (pcap, replay).
    #[validate(custom(function = validation::validate_mode))]
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Network interface for live capture. When unset, the interface that
    /// owns the listen address is used.
    #[validate(custom(function = validation::validate_interface))]
    #[serde(default)]
    pub interface: Option<String>,

    /// Run in promiscuous mode?
    #[serde(default)]
    pub promiscuous: bool,

    /// Bytes captured per frame.
    #[validate(range(min = 64, max = 262144))]
    #[serde(default = "default_snaplen", deserialize_with = "deserialize_size")]
    pub snaplen: usize,

    /// Capture read timeout (milliseconds); also bounds how long a stop waits
    /// for the capture thread.
    #[validate(range(min = 1, max = 5000))]
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u32,

    /// Savefile replayed when `mode` is `replay`.
    #[serde(default)]
    pub replay_file: Option<PathBuf>,
}

fn default_mode() -> String {
    "pcap".into()
}

fn default_snaplen() -> usize {
    65535
}

fn default_read_timeout() -> u32 {
    100
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Num(usize),
    Str(String),
}

/// Custom deserializer to allow human‑friendly sizes (e.g. "64KiB") or direct numbers.
fn deserialize_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let sv = SizeValue::deserialize(deserializer)?;
    match sv {
        SizeValue::Num(n) => Ok(n),
        SizeValue::Str(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}

fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num_part, unit_part) = s.split_at(split);
    let number: f64 = num_part.parse().map_err(|e| format!("{e}"))?;
    let multiplier = match unit_part.trim().to_lowercase().as_str() {
        "kb" | "kib" => 1024.0,
        "mb" | "mib" => 1024.0 * 1024.0,
        "b" | "" => 1.0,
        _ => return Err("Unknown size unit".into()),
    };
    Ok((number * multiplier) as usize)
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            interface: None,
            promiscuous: false,
            snaplen: default_snaplen(),
            read_timeout_ms: default_read_timeout(),
            replay_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_human_sizes() {
        assert_eq!(parse_size("64KiB"), Ok(65536));
        assert_eq!(parse_size("1500"), Ok(1500));
        assert_eq!(parse_size("0.5 kb"), Ok(512));
        assert!(parse_size("12 parsecs").is_err());
    }

    #[test]
    fn replay_mode_requires_file() {
        let config = CaptureConfig {
            mode: "replay".into(),
            ..CaptureConfig::default()
        };
        assert!(config.validate().is_err());

        let config = CaptureConfig {
            replay_file: Some("trace.pcap".into()),
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_mode_and_bad_interface() {
        let config = CaptureConfig {
            mode: "xdp".into(),
            ..CaptureConfig::default()
        };
        assert!(config.validate().is_err());

        let config = CaptureConfig {
            interface: Some("eth0; rm -rf".into()),
            ..CaptureConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
