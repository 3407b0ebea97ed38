//! Sink that prints delivered batches.

use std::io::{self, Write};

use lyssna_core::{Batch, BatchSink, DeliveredPacket};
use parking_lot::Mutex;
use tracing::warn;

use crate::commands::OutputFormat;

pub struct ConsoleSink {
    format: OutputFormat,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn stdout(format: OutputFormat) -> Self {
        Self {
            format,
            out: Mutex::new(Box::new(io::stdout())),
        }
    }
}

impl BatchSink for ConsoleSink {
    fn deliver(&self, batch: Batch) {
        let text = match render(self.format, &batch) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to render batch: {e}");
                return;
            }
        };
        let mut out = self.out.lock();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            warn!("Failed to write batch: {e}");
        }
    }
}

pub fn render(format: OutputFormat, batch: &[DeliveredPacket]) -> Result<String, serde_yaml::Error> {
    match format {
        OutputFormat::Text => Ok(batch.iter().map(|p| format!("{}\n", text_line(p))).collect()),
        OutputFormat::Yaml => Ok(format!("---\n{}", serde_yaml::to_string(batch)?)),
    }
}

fn text_line(packet: &DeliveredPacket) -> String {
    format!(
        "#{:<6} {:<5} {} -> {} {} bytes  {}",
        packet.id,
        protocol_name(packet.protocol),
        packet.from,
        packet.to,
        packet.size,
        packet.data
    )
}

fn protocol_name(protocol: u8) -> String {
    match protocol {
        1 => "icmp".into(),
        6 => "tcp".into(),
        17 => "udp".into(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyssna_capture::Packet;

    fn batch() -> Vec<DeliveredPacket> {
        vec![
            DeliveredPacket::new(
                1,
                Packet::new(6, 44, "10.0.0.1:5000", "10.0.0.2:80", b"GET"),
            ),
            DeliveredPacket::new(2, Packet::new(47, 60, "10.0.0.1", "10.0.0.2", b"")),
        ]
    }

    #[test]
    fn text_prints_one_line_per_packet() {
        let text = render(OutputFormat::Text, &batch()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("#1"));
        assert!(lines[0].contains("tcp"));
        assert!(lines[0].contains("10.0.0.1:5000 -> 10.0.0.2:80 44 bytes"));
        assert!(lines[0].ends_with("GET"));
        assert!(lines[1].contains(" 47 "));
    }

    #[test]
    fn yaml_is_a_document_per_batch() {
        let text = render(OutputFormat::Yaml, &batch()).unwrap();
        assert!(text.starts_with("---\n"));

        let parsed: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
        let items = parsed.as_sequence().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["id"].as_u64(), Some(1));
        assert_eq!(items[0]["hex"].as_str(), Some("474554"));
        assert_eq!(items[1]["protocol"].as_u64(), Some(47));
    }
}
