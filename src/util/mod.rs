//! # Utility Modules
//!
//! Common helpers used throughout the dlms-rs crate: hex capture handling
//! and rate-limited logging.

pub mod hex;
pub mod logging;

pub use hex::{decode_capture, decode_hex, encode_hex, format_hex_compact, pretty_hex, read_capture};
pub use logging::{log_frame_hex, LogThrottle};
