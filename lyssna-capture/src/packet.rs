//! The packet record handed from a capture engine to the delivery pipeline.

use lyssna_protocols::{render_hex, render_readable, Ipv4Frame};

/// One captured IPv4 packet, fully rendered before it leaves the capture
/// thread. Ownership moves into the queue, so nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// IANA protocol number (6 = TCP, 17 = UDP, ...).
    pub protocol: u8,
    /// Total datagram length as seen on the wire.
    pub data_size: u32,
    pub from: String,
    pub to: String,
    /// Captured payload with non-printable bytes replaced by `.`.
    pub readable_data: String,
    /// Captured payload as lowercase hex; may be shorter than `2 * data_size`
    /// when the snap length truncated the frame.
    pub hex_data: String,
}

impl Packet {
    /// Builds a packet and renders `payload` both ways.
    pub fn new(
        protocol: u8,
        data_size: u32,
        from: impl Into<String>,
        to: impl Into<String>,
        payload: &[u8],
    ) -> Self {
        Self {
            protocol,
            data_size,
            from: from.into(),
            to: to.into(),
            readable_data: render_readable(payload),
            hex_data: render_hex(payload),
        }
    }

    pub fn from_frame(frame: &Ipv4Frame<'_>) -> Self {
        Self::new(
            frame.protocol,
            u32::from(frame.total_length),
            frame.source_endpoint(),
            frame.destination_endpoint(),
            frame.payload(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyssna_protocols::{decode_frame, LinkLayer};

    #[test]
    fn renders_payload_on_construction() {
        let packet = Packet::new(17, 60, "10.0.0.1:53", "10.0.0.2:5353", b"ab\x01");
        assert_eq!(packet.readable_data, "ab.");
        assert_eq!(packet.hex_data, "616201");
        assert_eq!(packet.data_size, 60);
    }

    #[test]
    fn builds_from_decoded_frame() {
        let datagram = [
            0x45, 0x00, 0x00, 0x1e, 0x00, 0x00, 0x00, 0x00, 0x40, 0x11, 0x00, 0x00, 127, 0, 0,
            1, 127, 0, 0, 1, 0x1f, 0x90, 0x1f, 0x91, 0x00, 0x0a, 0x00, 0x00, b'h', b'i',
        ];
        let frame = decode_frame(LinkLayer::Raw, &datagram).unwrap();
        let packet = Packet::from_frame(&frame);

        assert_eq!(packet.protocol, 17);
        assert_eq!(packet.data_size, 30);
        assert_eq!(packet.from, "127.0.0.1:8080");
        assert_eq!(packet.to, "127.0.0.1:8081");
        assert_eq!(packet.readable_data, "hi");
        assert_eq!(packet.hex_data.len(), 2 * 2);
    }
}
