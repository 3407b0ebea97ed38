//! Text renderings of payload bytes for display at the consumer.

/// Printable ASCII (space through `~`) is kept, every other byte becomes `.`.
pub fn render_readable(payload: &[u8]) -> String {
    payload
        .iter()
        .map(|&b| if (0x20..=0x7e).contains(&b) { b as char } else { '.' })
        .collect()
}

/// Lowercase hex, two digits per captured byte.
pub fn render_hex(payload: &[u8]) -> String {
    hex::encode(payload)
}
