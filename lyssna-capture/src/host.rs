//! Stateless host queries: the local hostname and the IPv4 addresses a
//! session can be bound to.

use std::net::{IpAddr, Ipv4Addr};

use pcap::Device;

use crate::error::CaptureError;

/// One bindable IPv4 address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    /// Device the address belongs to.
    pub interface: String,
    /// Dotted-quad rendering.
    pub string: String,
    /// Numeric form accepted by `listen`, `u32::from(Ipv4Addr)`.
    pub key: u32,
}

impl InterfaceAddress {
    pub fn new(interface: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            interface: interface.into(),
            string: address.to_string(),
            key: u32::from(address),
        }
    }
}

#[cfg(unix)]
pub fn get_hostname() -> Result<String, CaptureError> {
    let mut buf = [0u8; 256];
    // SAFETY: the pointer and length describe `buf`, which outlives the call.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast::<libc::c_char>(), buf.len()) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

#[cfg(not(unix))]
pub fn get_hostname() -> Result<String, CaptureError> {
    std::env::var("COMPUTERNAME").map_err(|e| {
        CaptureError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, e))
    })
}

/// Every IPv4 address of every capture device, in device order.
pub fn get_interface_addresses() -> Result<Vec<InterfaceAddress>, CaptureError> {
    let devices = Device::list()?;
    Ok(collect_ipv4(devices.into_iter().flat_map(|d| {
        let name = d.name;
        d.addresses
            .into_iter()
            .map(move |a| (name.clone(), a.addr))
    })))
}

fn collect_ipv4(entries: impl IntoIterator<Item = (String, IpAddr)>) -> Vec<InterfaceAddress> {
    let mut out: Vec<InterfaceAddress> = Vec::new();
    for (interface, addr) in entries {
        if let IpAddr::V4(v4) = addr {
            if !out.iter().any(|a| a.key == u32::from(v4)) {
                out.push(InterfaceAddress::new(interface, v4));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn key_is_big_endian_numeric_address() {
        let addr = InterfaceAddress::new("lo", Ipv4Addr::LOCALHOST);
        assert_eq!(addr.key, 0x7F00_0001);
        assert_eq!(addr.string, "127.0.0.1");
    }

    #[test]
    fn keeps_ipv4_and_drops_duplicates() {
        let entries = vec![
            ("lo".to_string(), IpAddr::V4(Ipv4Addr::LOCALHOST)),
            ("lo".to_string(), IpAddr::V6(Ipv6Addr::LOCALHOST)),
            ("eth0".to_string(), IpAddr::V4(Ipv4Addr::new(192, 168, 1, 4))),
            ("any".to_string(), IpAddr::V4(Ipv4Addr::LOCALHOST)),
        ];
        let addresses = collect_ipv4(entries);
        assert_eq!(
            addresses,
            vec![
                InterfaceAddress::new("lo", Ipv4Addr::LOCALHOST),
                InterfaceAddress::new("eth0", Ipv4Addr::new(192, 168, 1, 4)),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn hostname_is_not_empty() {
        assert!(!get_hostname().unwrap().is_empty());
    }
}
