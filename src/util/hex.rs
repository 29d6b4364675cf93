//! # Hex Capture Utilities
//!
//! Meter captures are usually exchanged as hex dumps taken from a logic
//! analyser or a serial terminal. This module turns such dumps into bytes for
//! the decoder and renders scratch buffers back into readable hex for logs.
//!
//! ## Capture format
//!
//! - Whitespace (including newlines) between bytes is ignored
//! - `#` starts a comment that runs to the end of the line
//! - An optional `0x` prefix per byte is accepted
//!
//! ```rust
//! use dlms_rs::util::hex::{decode_capture, format_hex_compact};
//!
//! let bytes = decode_capture("7E A0 # flag and format\n0x2B 21").unwrap();
//! assert_eq!(bytes, vec![0x7E, 0xA0, 0x2B, 0x21]);
//! assert_eq!(format_hex_compact(&bytes), "7e a0 2b 21");
//! ```

use std::path::Path;
use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Encode bytes to lowercase hex string
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Encode bytes to uppercase hex string
pub fn encode_hex_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decode a plain hex string; whitespace is stripped.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    let cleaned: String = hex_str.chars().filter(|c| !c.is_whitespace()).collect();
    decode_cleaned(&cleaned)
}

/// Decode a capture dump with comments and `0x` prefixes.
pub fn decode_capture(capture: &str) -> Result<Vec<u8>, HexError> {
    let mut cleaned = String::with_capacity(capture.len());
    for line in capture.lines() {
        let line = match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        };
        for token in line.split_whitespace() {
            let token = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            cleaned.push_str(token);
        }
    }
    decode_cleaned(&cleaned)
}

/// Read and decode a capture file.
pub fn read_capture(path: impl AsRef<Path>) -> Result<Vec<u8>, crate::DlmsError> {
    let text = std::fs::read_to_string(path)?;
    Ok(decode_capture(&text)?)
}

fn decode_cleaned(cleaned: &str) -> Result<Vec<u8>, HexError> {
    if cleaned.is_empty() {
        return Err(HexError::EmptyString);
    }
    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }
    hex::decode(cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Format hex data for compact display, "7e a0 2b".
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hex dump with offsets and an ASCII column, `bytes_per_line` bytes per row.
pub fn pretty_hex(data: &[u8], bytes_per_line: usize) -> String {
    let width = bytes_per_line.max(1);
    data.chunks(width)
        .enumerate()
        .map(|(row, chunk)| {
            let hex = format_hex_compact(chunk);
            let ascii: String = chunk
                .iter()
                .map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!("{:04x}: {:<pad$} |{}|", row * width, hex, ascii, pad = width * 3 - 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
