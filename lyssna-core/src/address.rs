//! Numeric host identifiers as accepted by `listen`.

use std::net::Ipv4Addr;

/// Parses a numeric IPv4 host identifier.
///
/// Accepted forms: decimal `u32` (`2130706433`), `0x`-prefixed hex
/// (`0x7F000001`) and dotted quad (`127.0.0.1`). Hostnames and anything
/// else yield `None`.
pub fn parse_host_address(input: &str) -> Option<Ipv4Addr> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some(hex) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        return u32::from_str_radix(hex, 16).ok().map(Ipv4Addr::from);
    }

    if input.bytes().all(|b| b.is_ascii_digit()) {
        return input.parse::<u32>().ok().map(Ipv4Addr::from);
    }

    input.parse::<Ipv4Addr>().ok()
}
