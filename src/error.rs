//! # DLMS Error Handling
//!
//! This module defines the DlmsError enum, which represents the different error
//! types that can occur in the dlms-rs crate.

use crate::util::hex::HexError;
use thiserror::Error;

/// Represents the different error types that can occur in the DLMS crate.
#[derive(Debug, Error)]
pub enum DlmsError {
    /// The byte in the frame end position was not the HDLC end flag.
    #[error("Expected end marker 0x7E, found 0x{found:02X}")]
    FrameEnd { found: u8 },

    /// Header check sequence did not match the computed CRC.
    #[error("Header check sequence mismatch: expected 0x{expected:04X}, calculated 0x{calculated:04X}")]
    HeaderCheckMismatch { expected: u16, calculated: u16 },

    /// Frame check sequence did not match the computed CRC.
    #[error("Frame check sequence mismatch: expected 0x{expected:04X}, calculated 0x{calculated:04X}")]
    FrameCheckMismatch { expected: u16, calculated: u16 },

    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// Indicates an invalid hexadecimal capture.
    #[error("Invalid hexadecimal string: {0}")]
    Hex(#[from] HexError),

    /// Indicates a malformed OBIS code string.
    #[error("Invalid OBIS code: {0}")]
    InvalidObisCode(String),

    /// Indicates an unreadable or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch‑all error for uncategorized cases.
    #[error("Other error: {0}")]
    Other(String),
}

impl DlmsError {
    /// True for errors raised by the decoder on frame content.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            DlmsError::FrameEnd { .. }
                | DlmsError::HeaderCheckMismatch { .. }
                | DlmsError::FrameCheckMismatch { .. }
        )
    }
}
