//! # Incremental HDLC/DLMS Push Frame Decoder
//!
//! The decoder consumes one byte at a time and never buffers a whole frame.
//! Fields are handed to the bound [`FieldSink`] as soon as they complete,
//! from inside [`Decoder::feed`].
//!
//! ## Frame layout
//!
//! ```text
//! 7E | format(2) | dest(1) | src(1) | control(1) | hcs(2) | header(3)
//!    | array descriptor(5) | timestamp(13) | structure(2)
//!    | data records ... | fcs(2) | 7E
//! ```
//!
//! The 12-bit length in the format field counts every byte from the format
//! field through the FCS. Each fixed phase ends on its last byte; that byte
//! is never replayed into the next phase.
//!
//! ## Usage
//!
//! ```rust
//! use dlms_rs::dlms::{Decoder, FieldKind, FieldLog};
//!
//! let mut decoder = Decoder::new(FieldLog::new());
//! decoder.feed(0x7E).unwrap();
//! assert_eq!(decoder.into_sink().kinds(), vec![FieldKind::FrameStart]);
//! ```

use crate::constants::*;
use crate::dlms::fcs::FrameCheck;
use crate::dlms::field::{Field, FieldKind, FieldSink};
use crate::dlms::record::{RecordParser, RecordStep, SkipReason};
use crate::error::DlmsError;
use crate::registry::FieldRegistry;
use crate::util::logging::log_frame_hex;
use serde::{Deserialize, Serialize};

/// Decoder phase, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderState {
    AwaitStart,
    FrameFormat,
    DestinationAddress,
    SourceAddress,
    Control,
    HeaderCheckSequence,
    Header,
    ArrayDescriptor,
    Timestamp,
    UnknownFixedField,
    DataRecords,
    ChecksumField,
    FrameEnd,
}

impl DecoderState {
    /// Bytes consumed by a fixed-width phase; `None` for AwaitStart and
    /// DataRecords.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            DecoderState::FrameFormat => Some(PHASE_FRAME_FORMAT_LEN),
            DecoderState::DestinationAddress => Some(PHASE_DESTINATION_ADDRESS_LEN),
            DecoderState::SourceAddress => Some(PHASE_SOURCE_ADDRESS_LEN),
            DecoderState::Control => Some(PHASE_CONTROL_LEN),
            DecoderState::HeaderCheckSequence => Some(PHASE_HCS_LEN),
            DecoderState::Header => Some(PHASE_HEADER_LEN),
            DecoderState::ArrayDescriptor => Some(PHASE_ARRAY_DESCRIPTOR_LEN),
            DecoderState::Timestamp => Some(PHASE_TIMESTAMP_LEN),
            DecoderState::UnknownFixedField => Some(PHASE_UNKNOWN_FIXED_LEN),
            DecoderState::ChecksumField => Some(PHASE_CHECKSUM_LEN),
            DecoderState::FrameEnd => Some(1),
            DecoderState::AwaitStart | DecoderState::DataRecords => None,
        }
    }

    /// Phases whose bytes are covered by the frame check sequence.
    fn is_checked(self) -> bool {
        !matches!(
            self,
            DecoderState::AwaitStart | DecoderState::ChecksumField | DecoderState::FrameEnd
        )
    }
}

/// Integrity handling for HCS and FCS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityMode {
    /// Capture check sequences without comparing them
    #[default]
    Ignore,
    /// Reject frames whose HCS or FCS does not match
    Verify,
}

/// Opt-in decoder behaviour. The default reproduces the accept-everything
/// behaviour deployed meters were built against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub integrity: IntegrityMode,
    /// Emit the raw 12 date-time bytes as a `Timestamp` field
    pub forward_timestamp: bool,
    /// Emit records missing from the registry as `Unrecognized`
    pub emit_unrecognized: bool,
}

/// Outcome of [`Decoder::feed_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub bytes: usize,
    pub frame_errors: usize,
}

/// Accumulator shared by every fixed-width phase.
#[derive(Debug, Clone, Default)]
struct FixedField {
    bytes: [u8; PHASE_MAX_FIXED_LEN],
}

/// Single-pass frame/TLV decoder bound to one sink.
pub struct Decoder<S: FieldSink> {
    sink: S,
    registry: FieldRegistry,
    config: DecoderConfig,
    state: DecoderState,
    fixed: FixedField,
    records: RecordParser,
    frame_cursor: usize,
    phase_cursor: usize,
    frame_length: usize,
    timestamp: Option<[u8; DLMS_SIZE_DATE_TIME]>,
    check: Option<FrameCheck>,
    /// `(expected, calculated)` FCS, reported on the end flag
    fcs_mismatch: Option<(u16, u16)>,
}

impl<S: FieldSink> std::fmt::Debug for Decoder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("state", &self.state)
            .field("frame_cursor", &self.frame_cursor)
            .field("phase_cursor", &self.phase_cursor)
            .field("frame_length", &self.frame_length)
            .field("config", &self.config)
            .field("check", &self.check)
            .finish_non_exhaustive()
    }
}

impl<S: FieldSink> Decoder<S> {
    pub fn new(sink: S) -> Self {
        Self::with_registry(sink, FieldRegistry::standard(), DecoderConfig::default())
    }

    pub fn with_config(sink: S, config: DecoderConfig) -> Self {
        Self::with_registry(sink, FieldRegistry::standard(), config)
    }

    pub fn with_registry(sink: S, registry: FieldRegistry, config: DecoderConfig) -> Self {
        Decoder {
            sink,
            registry,
            config,
            state: DecoderState::AwaitStart,
            fixed: FixedField::default(),
            records: RecordParser::new(),
            frame_cursor: 0,
            phase_cursor: 0,
            frame_length: 0,
            timestamp: None,
            check: None,
            fcs_mismatch: None,
        }
    }

    /// Drop all parsing state and wait for the next start marker.
    ///
    /// The sink, registry and configuration are kept.
    pub fn reset(&mut self) {
        self.state = DecoderState::AwaitStart;
        self.fixed = FixedField::default();
        self.records.clear();
        self.frame_cursor = 0;
        self.phase_cursor = 0;
        self.frame_length = 0;
        self.timestamp = None;
        self.check = None;
        self.fcs_mismatch = None;
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Bytes consumed since, and including, the start marker.
    pub fn frame_cursor(&self) -> usize {
        self.frame_cursor
    }

    /// Bytes consumed within the current phase or data record.
    pub fn phase_cursor(&self) -> usize {
        self.phase_cursor
    }

    /// Length from the frame format field; zero until it has been read.
    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    /// Raw date-time bytes of the current frame, once the timestamp phase completed.
    pub fn timestamp(&self) -> Option<&[u8; DLMS_SIZE_DATE_TIME]> {
        self.timestamp.as_ref()
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Feed every byte in order. On a failed `feed` the error is logged and
    /// the decoder reset before continuing with the next byte.
    pub fn feed_all(&mut self, bytes: &[u8]) -> FeedSummary {
        let mut summary = FeedSummary::default();
        for (i, &byte) in bytes.iter().enumerate() {
            summary.bytes += 1;
            if let Err(e) = self.feed(byte) {
                log::warn!("Decoder error at byte {i}: {e}");
                summary.frame_errors += 1;
                self.reset();
            }
        }
        summary
    }

    /// Consume one byte.
    ///
    /// Fails when the frame end position holds anything but `0x7E`, or, with
    /// [`IntegrityMode::Verify`], when a check sequence mismatches. A bad HCS
    /// fails on its last byte; a bad FCS fails on the end flag so the flag is
    /// not mistaken for the next frame's start. The decoder is back in AwaitStart after a failure, but callers should
    /// still [`reset`](Self::reset) before feeding more bytes.
    pub fn feed(&mut self, byte: u8) -> Result<(), DlmsError> {
        if self.state.is_checked() {
            if let Some(check) = self.check.as_mut() {
                check.update(byte);
            }
        }

        match self.state {
            DecoderState::AwaitStart => {
                if byte == HDLC_START_MARKER {
                    self.begin_frame();
                }
                Ok(())
            }
            DecoderState::FrameFormat => {
                if let Some(format) = self.accumulate_fixed(byte, PHASE_FRAME_FORMAT_LEN) {
                    self.frame_length = (usize::from(format[0] & HDLC_FORMAT_LENGTH_MASK) << 8)
                        | usize::from(format[1]);
                    log::debug!("Frame length: {}", self.frame_length);
                    self.enter(DecoderState::DestinationAddress);
                }
                Ok(())
            }
            DecoderState::DestinationAddress => {
                self.advance_fixed(byte, PHASE_DESTINATION_ADDRESS_LEN, DecoderState::SourceAddress);
                Ok(())
            }
            DecoderState::SourceAddress => {
                self.advance_fixed(byte, PHASE_SOURCE_ADDRESS_LEN, DecoderState::Control);
                Ok(())
            }
            DecoderState::Control => {
                if self.accumulate_fixed(byte, PHASE_CONTROL_LEN).is_some() {
                    if let Some(check) = self.check.as_mut() {
                        check.seal_header();
                    }
                    self.enter(DecoderState::HeaderCheckSequence);
                }
                Ok(())
            }
            DecoderState::HeaderCheckSequence => {
                if let Some(hcs) = self.accumulate_fixed(byte, PHASE_HCS_LEN) {
                    let expected = u16::from_le_bytes([hcs[0], hcs[1]]);
                    let calculated = self.check.as_ref().and_then(FrameCheck::header);
                    if let Some(calculated) = calculated.filter(|&c| c != expected) {
                        return Err(self.abort(DlmsError::HeaderCheckMismatch {
                            expected,
                            calculated,
                        }));
                    }
                    self.enter(DecoderState::Header);
                }
                Ok(())
            }
            DecoderState::Header => {
                self.advance_fixed(byte, PHASE_HEADER_LEN, DecoderState::ArrayDescriptor);
                Ok(())
            }
            DecoderState::ArrayDescriptor => {
                self.advance_fixed(byte, PHASE_ARRAY_DESCRIPTOR_LEN, DecoderState::Timestamp);
                Ok(())
            }
            DecoderState::Timestamp => {
                if let Some(raw) = self.accumulate_fixed(byte, PHASE_TIMESTAMP_LEN) {
                    let mut date_time = [0u8; DLMS_SIZE_DATE_TIME];
                    date_time.copy_from_slice(&raw[1..PHASE_TIMESTAMP_LEN]);
                    self.timestamp = Some(date_time);
                    if self.config.forward_timestamp {
                        self.sink.handle(&Field {
                            kind: FieldKind::Timestamp,
                            address: None,
                            label: None,
                            payload: &date_time,
                        });
                    }
                    self.enter(DecoderState::UnknownFixedField);
                }
                Ok(())
            }
            DecoderState::UnknownFixedField => {
                self.advance_fixed(byte, PHASE_UNKNOWN_FIXED_LEN, DecoderState::DataRecords);
                Ok(())
            }
            DecoderState::DataRecords => {
                self.data_record_byte(byte);
                self.frame_cursor += 1;
                if self.frame_cursor >= self.frame_length.saturating_sub(1) {
                    if !self.records.is_empty() {
                        log::debug!(
                            "Frame boundary reached with {} record bytes pending, abandoning record",
                            self.records.len()
                        );
                        log_frame_hex("Abandoned record", self.records.buffered());
                    }
                    self.records.clear();
                    self.state = DecoderState::ChecksumField;
                    self.phase_cursor = 0;
                }
                Ok(())
            }
            DecoderState::ChecksumField => {
                if let Some(fcs) = self.accumulate_fixed(byte, PHASE_CHECKSUM_LEN) {
                    let expected = u16::from_le_bytes([fcs[0], fcs[1]]);
                    let calculated = self.check.as_ref().map(FrameCheck::frame);
                    self.fcs_mismatch = calculated
                        .filter(|&c| c != expected)
                        .map(|c| (expected, c));
                    self.enter(DecoderState::FrameEnd);
                }
                Ok(())
            }
            DecoderState::FrameEnd => {
                self.state = DecoderState::AwaitStart;
                self.phase_cursor = 0;
                self.frame_cursor = 0;
                self.check = None;

                if let Some((expected, calculated)) = self.fcs_mismatch.take() {
                    return Err(self.abort(DlmsError::FrameCheckMismatch {
                        expected,
                        calculated,
                    }));
                }

                self.sink.handle(&Field::marker(FieldKind::FrameEnd));
                log::info!("Frame complete");

                if byte != HDLC_END_MARKER {
                    return Err(DlmsError::FrameEnd { found: byte });
                }
                Ok(())
            }
        }
    }

    fn begin_frame(&mut self) {
        self.frame_cursor = 1;
        self.phase_cursor = 0;
        self.frame_length = 0;
        self.timestamp = None;
        self.records.clear();
        self.fcs_mismatch = None;
        self.check = match self.config.integrity {
            IntegrityMode::Ignore => None,
            IntegrityMode::Verify => Some(FrameCheck::new()),
        };
        self.state = DecoderState::FrameFormat;
        log::info!("Frame start");
        self.sink.handle(&Field::marker(FieldKind::FrameStart));
    }

    /// Store `byte` into the fixed accumulator. Returns the phase bytes once
    /// `width` bytes are in; the byte that completes the phase is part of it
    /// and is not replayed into the next phase.
    fn accumulate_fixed(&mut self, byte: u8, width: usize) -> Option<[u8; PHASE_MAX_FIXED_LEN]> {
        self.fixed.bytes[self.phase_cursor] = byte;
        self.phase_cursor += 1;
        self.frame_cursor += 1;
        if self.phase_cursor >= width {
            Some(self.fixed.bytes)
        } else {
            None
        }
    }

    fn advance_fixed(&mut self, byte: u8, width: usize, next: DecoderState) {
        if self.accumulate_fixed(byte, width).is_some() {
            self.enter(next);
        }
    }

    fn enter(&mut self, next: DecoderState) {
        log::trace!("Change state to: {next:?}");
        self.state = next;
        self.phase_cursor = 0;
        self.fixed = FixedField::default();
    }

    /// Emit `FrameAborted` and drop back to AwaitStart.
    fn abort(&mut self, error: DlmsError) -> DlmsError {
        log::warn!("Frame rejected: {error}");
        self.reset();
        self.sink.handle(&Field::marker(FieldKind::FrameAborted));
        error
    }

    fn data_record_byte(&mut self, byte: u8) {
        let step = self.records.push(byte);

        match step {
            RecordStep::Pending => {
                self.phase_cursor = self.records.len();
                return;
            }
            RecordStep::Skipped(reason) => match reason {
                SkipReason::VisibleString { len } => {
                    log::debug!("String found with length {len}");
                }
                SkipReason::AddressedString { value_tag, len } => {
                    log::debug!("Addressed string (tag 0x{value_tag:02X}) found with length {len}");
                }
                SkipReason::AddressWidth { len } => {
                    log::debug!("Record with {len} byte address dropped");
                }
            },
            RecordStep::Complete(record) => match self.registry.lookup(&record.address) {
                Some(entry) => match record.payload.get(..entry.width) {
                    Some(payload) => {
                        log::debug!("Found {}", entry.label);
                        self.sink.handle(&Field {
                            kind: entry.kind,
                            address: Some(record.address),
                            label: Some(entry.label),
                            payload,
                        });
                    }
                    None => {
                        log::warn!(
                            "{} expects {} bytes, record carries {}; dropped",
                            entry.label,
                            entry.width,
                            record.payload.len()
                        );
                    }
                },
                None if self.config.emit_unrecognized => {
                    self.sink.handle(&Field {
                        kind: FieldKind::Unrecognized,
                        address: Some(record.address),
                        label: None,
                        payload: record.payload,
                    });
                }
                None => {
                    log::trace!("No registry entry for {}", record.address);
                }
            },
        }

        self.records.clear();
        self.phase_cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dlms::field::FieldLog;

    fn header_through_control(format: [u8; 2]) -> Vec<u8> {
        vec![HDLC_START_MARKER, format[0], format[1], 0x41, 0x08, 0x83]
    }

    #[test]
    fn test_frame_length_from_format() {
        let mut decoder = Decoder::new(FieldLog::new());
        for b in header_through_control([0x0A, 0x20]) {
            decoder.feed(b).unwrap();
        }
        assert_eq!(decoder.frame_length(), 0x0A20);
        assert_eq!(decoder.state(), DecoderState::HeaderCheckSequence);
        assert_eq!(decoder.frame_cursor(), 6);
    }

    #[test]
    fn test_format_type_nibble_is_masked() {
        let mut decoder = Decoder::new(FieldLog::new());
        for b in header_through_control([0xA1, 0x0C]) {
            decoder.feed(b).unwrap();
        }
        assert_eq!(decoder.frame_length(), 0x10C);
    }

    #[test]
    fn test_fixed_phase_boundaries() {
        let mut decoder = Decoder::new(FieldLog::new());
        decoder.feed(HDLC_START_MARKER).unwrap();

        let expected = [
            (DecoderState::FrameFormat, PHASE_FRAME_FORMAT_LEN),
            (DecoderState::DestinationAddress, PHASE_DESTINATION_ADDRESS_LEN),
            (DecoderState::SourceAddress, PHASE_SOURCE_ADDRESS_LEN),
            (DecoderState::Control, PHASE_CONTROL_LEN),
            (DecoderState::HeaderCheckSequence, PHASE_HCS_LEN),
            (DecoderState::Header, PHASE_HEADER_LEN),
            (DecoderState::ArrayDescriptor, PHASE_ARRAY_DESCRIPTOR_LEN),
            (DecoderState::Timestamp, PHASE_TIMESTAMP_LEN),
            (DecoderState::UnknownFixedField, PHASE_UNKNOWN_FIXED_LEN),
        ];
        for (state, width) in expected {
            assert_eq!(state.fixed_width(), Some(width));
            for i in 0..width {
                assert_eq!(decoder.state(), state, "byte {i} of {state:?}");
                assert_eq!(decoder.phase_cursor(), i);
                decoder.feed(0xFF).unwrap();
            }
            assert_ne!(decoder.state(), state);
            assert_eq!(decoder.phase_cursor(), 0);
        }
        assert_eq!(decoder.state(), DecoderState::DataRecords);
        assert_eq!(decoder.frame_cursor(), 31);
    }

    #[test]
    fn test_timestamp_bytes_exposed_not_emitted() {
        let mut decoder = Decoder::new(FieldLog::new());
        let mut bytes = header_through_control([0xA0, 0x40]);
        bytes.extend_from_slice(&[0x00, 0x00]); // hcs
        bytes.extend_from_slice(&[0xE6, 0xE7, 0x00]);
        bytes.extend_from_slice(&[0x0F, 0x00, 0x00, 0x00, 0x00]);
        let date_time = [0x07, 0xE3, 0x0C, 0x0A, 0x02, 0x0F, 0x2E, 0x0A, 0xFF, 0x80, 0x00, 0x00];
        bytes.push(0x0C);
        bytes.extend_from_slice(&date_time);
        for b in bytes {
            decoder.feed(b).unwrap();
        }
        assert_eq!(decoder.state(), DecoderState::UnknownFixedField);
        assert_eq!(decoder.timestamp(), Some(&date_time));
        assert_eq!(decoder.sink().kinds(), vec![FieldKind::FrameStart]);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut decoder = Decoder::new(FieldLog::new());
        for b in header_through_control([0xA0, 0x40]) {
            decoder.feed(b).unwrap();
        }
        decoder.reset();
        let once = format!("{decoder:?}");
        decoder.reset();
        assert_eq!(format!("{decoder:?}"), once);
        assert_eq!(decoder.state(), DecoderState::AwaitStart);
        assert_eq!(decoder.frame_cursor(), 0);
        assert_eq!(decoder.frame_length(), 0);
        assert!(decoder.timestamp().is_none());
    }

    #[test]
    fn test_short_frame_length_leaves_data_after_one_byte() {
        let mut decoder = Decoder::new(FieldLog::new());
        let mut bytes = header_through_control([0xA0, 0x05]);
        bytes.extend_from_slice(&[0u8; 2 + 3 + 5 + 13 + 2]);
        for b in bytes {
            decoder.feed(b).unwrap();
        }
        assert_eq!(decoder.state(), DecoderState::DataRecords);
        decoder.feed(0x09).unwrap();
        assert_eq!(decoder.state(), DecoderState::ChecksumField);
    }
}
