//! ## lyssna-protocols::ipv4
//! Zero-copy IPv4 datagram view with the TCP/UDP ports pulled out when the
//! transport header was captured.

use std::net::Ipv4Addr;

use thiserror::Error;

use crate::link::{read_u16, LinkLayer};

const IPV4_MIN_HEADER_LEN: usize = 20;
const TCP_MIN_HEADER_LEN: usize = 20;
const UDP_HEADER_LEN: usize = 8;
const FRAGMENT_OFFSET_MASK: u16 = 0x1fff;

pub const PROTO_TCP: u8 = 6;
pub const PROTO_UDP: u8 = 17;

/// Errors that can occur while decoding a captured frame.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Frame shorter than its headers")]
    Truncated,
    #[error("Frame does not carry an IPv4 datagram")]
    NotIpv4,
    #[error("Malformed IPv4 header")]
    Malformed,
}

/// Transport-layer addressing extracted from the datagram.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transport {
    Tcp { src_port: u16, dst_port: u16 },
    Udp { src_port: u16, dst_port: u16 },
    /// Any other protocol, a non-initial fragment, or a transport header that
    /// was cut off by the snap length.
    Other,
}

/// An IPv4 datagram borrowed from the captured frame.
#[derive(Debug, Copy, Clone)]
pub struct Ipv4Frame<'a> {
    pub protocol: u8,
    /// Total length as announced by the IP header, not the captured length.
    pub total_length: u16,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub transport: Transport,
    payload: &'a [u8],
}

impl<'a> Ipv4Frame<'a> {
    /// Captured bytes following the IP and transport headers.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// `a.b.c.d:port` for TCP/UDP, bare `a.b.c.d` otherwise.
    pub fn source_endpoint(&self) -> String {
        match self.transport {
            Transport::Tcp { src_port, .. } | Transport::Udp { src_port, .. } => {
                format!("{}:{}", self.source, src_port)
            }
            Transport::Other => self.source.to_string(),
        }
    }

    pub fn destination_endpoint(&self) -> String {
        match self.transport {
            Transport::Tcp { dst_port, .. } | Transport::Udp { dst_port, .. } => {
                format!("{}:{}", self.destination, dst_port)
            }
            Transport::Other => self.destination.to_string(),
        }
    }
}

/// Decodes a link-layer frame into an IPv4 view.
pub fn decode_frame(link: LinkLayer, frame: &[u8]) -> Result<Ipv4Frame<'_>, FrameError> {
    let ip = link.network_payload(frame)?;
    if ip.is_empty() {
        return Err(FrameError::Truncated);
    }
    if ip[0] >> 4 != 4 {
        return Err(FrameError::NotIpv4);
    }
    if ip.len() < IPV4_MIN_HEADER_LEN {
        return Err(FrameError::Truncated);
    }

    let header_len = usize::from(ip[0] & 0x0f) * 4;
    if header_len < IPV4_MIN_HEADER_LEN {
        return Err(FrameError::Malformed);
    }
    if ip.len() < header_len {
        return Err(FrameError::Truncated);
    }

    let total_length = read_u16(ip, 2);
    if usize::from(total_length) < header_len {
        return Err(FrameError::Malformed);
    }
    let protocol = ip[9];
    let source = Ipv4Addr::new(ip[12], ip[13], ip[14], ip[15]);
    let destination = Ipv4Addr::new(ip[16], ip[17], ip[18], ip[19]);

    // Ethernet pads short frames; never read past what the header announces.
    let end = usize::from(total_length).min(ip.len());
    let body = &ip[header_len..end];

    let first_fragment = read_u16(ip, 6) & FRAGMENT_OFFSET_MASK == 0;
    let (transport, payload) = if first_fragment {
        split_transport(protocol, body)
    } else {
        (Transport::Other, body)
    };

    Ok(Ipv4Frame {
        protocol,
        total_length,
        source,
        destination,
        transport,
        payload,
    })
}

fn split_transport(protocol: u8, body: &[u8]) -> (Transport, &[u8]) {
    match protocol {
        PROTO_TCP if body.len() >= TCP_MIN_HEADER_LEN => {
            let data_offset = usize::from(body[12] >> 4) * 4;
            if data_offset < TCP_MIN_HEADER_LEN || body.len() < data_offset {
                return (Transport::Other, body);
            }
            let transport = Transport::Tcp {
                src_port: read_u16(body, 0),
                dst_port: read_u16(body, 2),
            };
            (transport, &body[data_offset..])
        }
        PROTO_UDP if body.len() >= UDP_HEADER_LEN => {
            let transport = Transport::Udp {
                src_port: read_u16(body, 0),
                dst_port: read_u16(body, 2),
            };
            (transport, &body[UDP_HEADER_LEN..])
        }
        _ => (Transport::Other, body),
    }
}
