//! # Lyssna Frame Decoding
//!
//! Turns raw link-layer frames into IPv4 datagram views and renders payload
//! bytes as text. Only IPv4 is decoded; everything else is reported as
//! [`FrameError::NotIpv4`] and skipped by the capture engines.

pub mod ipv4;
pub mod link;
pub mod render;

pub use ipv4::{decode_frame, FrameError, Ipv4Frame, Transport};
pub use link::LinkLayer;
pub use render::{render_hex, render_readable};
