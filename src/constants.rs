//! DLMS/HDLC Protocol Constants
//!
//! This module defines the constants used by the push-frame decoder. Byte
//! counts for the fixed header phases follow what real meters put on the
//! wire and must not change without breaking parity with deployed devices.

/// HDLC flag opening a frame
pub const HDLC_START_MARKER: u8 = 0x7E;

/// HDLC flag closing a frame
pub const HDLC_END_MARKER: u8 = 0x7E;

/// Mask selecting the length bits of the first frame format byte
pub const HDLC_FORMAT_LENGTH_MASK: u8 = 0x0F;

/// Frame format type nibble for HDLC frame format type 3
pub const HDLC_FORMAT_TYPE_3: u8 = 0xA0;

/// Largest length the 12-bit frame format field can carry
pub const HDLC_MAX_FRAME_LENGTH: u16 = 0x0FFF;

// ----------------------------------------------------------------------------
// COSEM data type tags (A-XDR)
// ----------------------------------------------------------------------------

/// Length-prefixed raw bytes
pub const DLMS_TAG_OCTET_STRING: u8 = 0x09;

/// Length-prefixed ASCII
pub const DLMS_TAG_VISIBLE_STRING: u8 = 0x0A;

/// 4-byte unsigned integer
pub const DLMS_TAG_DOUBLE_LONG_UNSIGNED: u8 = 0x06;

/// 2-byte unsigned integer
pub const DLMS_TAG_UNSIGNED: u8 = 0x12;

/// 12-byte date-time structure
pub const DLMS_TAG_DATE_TIME: u8 = 0x0C;

// ----------------------------------------------------------------------------
// Value and address widths
// ----------------------------------------------------------------------------

pub const DLMS_SIZE_U32: usize = 4;
pub const DLMS_SIZE_U16: usize = 2;
pub const DLMS_SIZE_DATE_TIME: usize = 12;

/// Width of an OBIS object address
pub const DLMS_OBIS_ADDR_LEN: usize = 6;

/// Capacity of the data record scratch buffer
pub const DLMS_SCRATCH_CAPACITY: usize = 512;

// ----------------------------------------------------------------------------
// Fixed phase widths (bytes consumed, trigger byte included)
// ----------------------------------------------------------------------------

pub const PHASE_FRAME_FORMAT_LEN: usize = 2;
pub const PHASE_DESTINATION_ADDRESS_LEN: usize = 1;
pub const PHASE_SOURCE_ADDRESS_LEN: usize = 1;
pub const PHASE_CONTROL_LEN: usize = 1;
pub const PHASE_HCS_LEN: usize = 2;

/// LLC header (E6 E7 00)
pub const PHASE_HEADER_LEN: usize = 3;

/// Data-notification tag plus 4-byte long-invoke-id
pub const PHASE_ARRAY_DESCRIPTOR_LEN: usize = 5;

/// Octet-string length byte plus the 12-byte date-time
pub const PHASE_TIMESTAMP_LEN: usize = 1 + DLMS_SIZE_DATE_TIME;

/// Structure tag plus element count
pub const PHASE_UNKNOWN_FIXED_LEN: usize = 2;
pub const PHASE_CHECKSUM_LEN: usize = 2;

/// Widest fixed phase, sizes the fixed-field accumulator
pub const PHASE_MAX_FIXED_LEN: usize = PHASE_TIMESTAMP_LEN;

// ----------------------------------------------------------------------------
// Serial defaults (HAN port)
// ----------------------------------------------------------------------------

pub const HAN_DEFAULT_BAUD_RATE: u32 = 2400;

/// Quiet period required before the first chunk is fed to the decoder
pub const HAN_DEFAULT_SILENCE_MS: u64 = 3000;

pub const HAN_DEFAULT_READ_BUFFER: usize = 1024;
