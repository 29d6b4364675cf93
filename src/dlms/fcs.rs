//! HDLC frame check sequences.
//!
//! Both the header check sequence (HCS) and the frame check sequence (FCS)
//! are CRC-16/X.25, transmitted least significant byte first. The decoder
//! only runs these when integrity verification is enabled.

use crc::{Crc, Digest, CRC_16_IBM_SDLC};
use std::fmt;

static X25: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// CRC-16/X.25 over `bytes`.
pub fn checksum(bytes: &[u8]) -> u16 {
    X25.checksum(bytes)
}

/// Checksum as it appears on the wire.
pub fn checksum_bytes(bytes: &[u8]) -> [u8; 2] {
    checksum(bytes).to_le_bytes()
}

/// Running HCS/FCS computation over one frame.
#[derive(Clone)]
pub(crate) struct FrameCheck {
    digest: Digest<'static, u16>,
    header: Option<u16>,
}

impl FrameCheck {
    pub(crate) fn new() -> Self {
        FrameCheck {
            digest: X25.digest(),
            header: None,
        }
    }

    pub(crate) fn update(&mut self, byte: u8) {
        self.digest.update(&[byte]);
    }

    /// Snapshot the CRC of everything seen so far as the header check value.
    pub(crate) fn seal_header(&mut self) {
        self.header = Some(self.digest.clone().finalize());
    }

    pub(crate) fn header(&self) -> Option<u16> {
        self.header
    }

    pub(crate) fn frame(&self) -> u16 {
        self.digest.clone().finalize()
    }
}

impl fmt::Debug for FrameCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCheck")
            .field("running", &format_args!("0x{:04X}", self.frame()))
            .field("header", &self.header)
            .finish()
    }
}
