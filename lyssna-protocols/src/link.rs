//! ## lyssna-protocols::link
//! Link-layer framing for the datalink types libpcap hands us on the
//! interfaces we bind to (Ethernet, loopback, raw IP, Linux cooked).

use crate::ipv4::FrameError;

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_VLAN: u16 = 0x8100;
const ETHERNET_HEADER_LEN: usize = 14;
const VLAN_TAG_LEN: usize = 4;
const NULL_HEADER_LEN: usize = 4;
const SLL_HEADER_LEN: usize = 16;
/// `AF_INET` as written by BSD loopback headers.
const NULL_FAMILY_INET: u32 = 2;

/// Supported link-layer header formats, keyed by their DLT/LINKTYPE value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinkLayer {
    /// DLT_EN10MB.
    Ethernet,
    /// DLT_NULL / DLT_LOOP: 4-byte address family header.
    Null,
    /// Raw IP with no link header at all.
    Raw,
    /// DLT_LINUX_SLL ("any" device and some tunnels).
    LinuxSll,
}

impl LinkLayer {
    /// Maps a libpcap datalink value onto a supported framing.
    pub fn from_dlt(dlt: i32) -> Option<Self> {
        match dlt {
            1 => Some(Self::Ethernet),
            0 | 108 => Some(Self::Null),
            12 | 14 | 101 | 228 => Some(Self::Raw),
            113 => Some(Self::LinuxSll),
            _ => None,
        }
    }

    /// Strips the link header and returns the IPv4 datagram bytes.
    pub fn network_payload<'a>(&self, frame: &'a [u8]) -> Result<&'a [u8], FrameError> {
        match self {
            Self::Ethernet => {
                if frame.len() < ETHERNET_HEADER_LEN {
                    return Err(FrameError::Truncated);
                }
                let mut ethertype = read_u16(frame, 12);
                let mut offset = ETHERNET_HEADER_LEN;
                if ethertype == ETHERTYPE_VLAN {
                    if frame.len() < offset + VLAN_TAG_LEN {
                        return Err(FrameError::Truncated);
                    }
                    ethertype = read_u16(frame, offset + 2);
                    offset += VLAN_TAG_LEN;
                }
                if ethertype != ETHERTYPE_IPV4 {
                    return Err(FrameError::NotIpv4);
                }
                Ok(&frame[offset..])
            }
            Self::Null => {
                if frame.len() < NULL_HEADER_LEN {
                    return Err(FrameError::Truncated);
                }
                // The family is written in host order by the capturing kernel,
                // DLT_LOOP uses network order. Accept either.
                let raw = [frame[0], frame[1], frame[2], frame[3]];
                let family_le = u32::from_le_bytes(raw);
                let family_be = u32::from_be_bytes(raw);
                if family_le != NULL_FAMILY_INET && family_be != NULL_FAMILY_INET {
                    return Err(FrameError::NotIpv4);
                }
                Ok(&frame[NULL_HEADER_LEN..])
            }
            Self::Raw => Ok(frame),
            Self::LinuxSll => {
                if frame.len() < SLL_HEADER_LEN {
                    return Err(FrameError::Truncated);
                }
                if read_u16(frame, 14) != ETHERTYPE_IPV4 {
                    return Err(FrameError::NotIpv4);
                }
                Ok(&frame[SLL_HEADER_LEN..])
            }
        }
    }
}

#[inline]
pub(crate) fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}
