//! Data record grammar inside the DataRecords phase.
//!
//! Records are accumulated byte by byte. Byte 0 is the entry tag, byte 1 the
//! entry length `L`:
//!
//! ```text
//! 09 L <address: L bytes> 06 <u32>            -> dispatched
//! 09 L <address: L bytes> 12 <u16>            -> dispatched
//! 09 L <address: L bytes> 09|0A D <D bytes>   -> skipped
//! 0A L <L bytes>                              -> skipped
//! anything else                               -> stalls until the frame boundary
//! ```

use crate::constants::{
    DLMS_OBIS_ADDR_LEN, DLMS_SCRATCH_CAPACITY, DLMS_SIZE_U16, DLMS_SIZE_U32,
    DLMS_TAG_DOUBLE_LONG_UNSIGNED, DLMS_TAG_OCTET_STRING, DLMS_TAG_UNSIGNED,
    DLMS_TAG_VISIBLE_STRING,
};
use crate::registry::ObisCode;

/// A completed address-tagged numeric record. Borrows the scratch buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedRecord<'a> {
    pub address: ObisCode,
    /// Inner value tag (`0x06` or `0x12`)
    pub value_tag: u8,
    /// Value bytes as carried by the record
    pub payload: &'a [u8],
}

/// Why a complete record produced no [`DecodedRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Top-level visible string of `len` bytes
    VisibleString { len: usize },
    /// Address-tagged string value (inner octet or visible string)
    AddressedString { value_tag: u8, len: usize },
    /// Address of a width other than six bytes
    AddressWidth { len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStep<'a> {
    /// Record not complete yet
    Pending,
    Skipped(SkipReason),
    Complete(DecodedRecord<'a>),
}

impl RecordStep<'_> {
    /// True when the record ended and the scratch must be cleared.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RecordStep::Pending)
    }
}

/// Bounded scratch buffer holding the record being parsed.
#[derive(Debug, Clone)]
pub struct RecordParser {
    buf: Box<[u8; DLMS_SCRATCH_CAPACITY]>,
    len: usize,
    overflowed: bool,
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordParser {
    pub fn new() -> Self {
        RecordParser {
            buf: Box::new([0u8; DLMS_SCRATCH_CAPACITY]),
            len: 0,
            overflowed: false,
        }
    }

    /// Bytes buffered for the current record.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn buffered(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.overflowed = false;
    }

    /// Append one byte and evaluate the grammar.
    ///
    /// Once the scratch is full further bytes are discarded; the record can
    /// then only end through the outer frame boundary.
    pub fn push(&mut self, byte: u8) -> RecordStep<'_> {
        if self.len == DLMS_SCRATCH_CAPACITY {
            if !self.overflowed {
                self.overflowed = true;
                log::warn!(
                    "Data record exceeds {DLMS_SCRATCH_CAPACITY} byte scratch (tag 0x{:02X}), discarding until frame boundary",
                    self.buf[0]
                );
            }
            return RecordStep::Pending;
        }
        self.buf[self.len] = byte;
        self.len += 1;
        self.evaluate()
    }

    fn evaluate(&self) -> RecordStep<'_> {
        let n = self.len;
        if n < 2 {
            return RecordStep::Pending;
        }
        let tag = self.buf[0];
        let entry_len = usize::from(self.buf[1]);

        match tag {
            DLMS_TAG_OCTET_STRING => self.evaluate_addressed(entry_len),
            DLMS_TAG_VISIBLE_STRING if n >= 2 + entry_len => {
                RecordStep::Skipped(SkipReason::VisibleString { len: entry_len })
            }
            _ => RecordStep::Pending,
        }
    }

    fn evaluate_addressed(&self, addr_len: usize) -> RecordStep<'_> {
        let n = self.len;
        let value_at = 2 + addr_len;
        if n <= value_at {
            return RecordStep::Pending;
        }
        let value_tag = self.buf[value_at];

        match value_tag {
            DLMS_TAG_VISIBLE_STRING | DLMS_TAG_OCTET_STRING => {
                if n <= value_at + 1 {
                    return RecordStep::Pending;
                }
                let data_len = usize::from(self.buf[value_at + 1]);
                if n >= 4 + addr_len + data_len {
                    RecordStep::Skipped(SkipReason::AddressedString {
                        value_tag,
                        len: data_len,
                    })
                } else {
                    RecordStep::Pending
                }
            }
            DLMS_TAG_DOUBLE_LONG_UNSIGNED | DLMS_TAG_UNSIGNED => {
                let width = if value_tag == DLMS_TAG_DOUBLE_LONG_UNSIGNED {
                    DLMS_SIZE_U32
                } else {
                    DLMS_SIZE_U16
                };
                if n < 3 + addr_len + width {
                    return RecordStep::Pending;
                }
                if addr_len != DLMS_OBIS_ADDR_LEN {
                    return RecordStep::Skipped(SkipReason::AddressWidth { len: addr_len });
                }
                let start = value_at + 1;
                match ObisCode::from_slice(&self.buf[2..]) {
                    Some(address) => RecordStep::Complete(DecodedRecord {
                        address,
                        value_tag,
                        payload: &self.buf[start..start + width],
                    }),
                    None => RecordStep::Skipped(SkipReason::AddressWidth { len: addr_len }),
                }
            }
            _ => RecordStep::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed all bytes, returning the step for the last one as an owned summary.
    fn run(parser: &mut RecordParser, bytes: &[u8]) -> Vec<bool> {
        bytes
            .iter()
            .map(|&b| parser.push(b).is_terminal())
            .collect()
    }

    #[test]
    fn test_unsigned_record_completes_on_last_value_byte() {
        let mut parser = RecordParser::new();
        let record = [0x09, 0x06, 0x01, 0x01, 0x20, 0x07, 0x00, 0xFF, 0x12, 0x00, 0xE6];
        for &b in &record[..record.len() - 1] {
            assert_eq!(parser.push(b), RecordStep::Pending);
        }
        match parser.push(*record.last().unwrap()) {
            RecordStep::Complete(rec) => {
                assert_eq!(rec.address, ObisCode::new(1, 1, 0x20, 7, 0, 0xFF));
                assert_eq!(rec.value_tag, DLMS_TAG_UNSIGNED);
                assert_eq!(rec.payload, &[0x00, 0xE6]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_double_long_unsigned_record() {
        let mut parser = RecordParser::new();
        let record = [
            0x09, 0x06, 0x01, 0x01, 0x01, 0x08, 0x00, 0xFF, 0x06, 0x00, 0x01, 0x86, 0xA0,
        ];
        let done = run(&mut parser, &record[..record.len() - 1]);
        assert!(done.iter().all(|d| !d));
        let step = parser.push(0xA0);
        assert!(step.is_terminal());
        if let RecordStep::Complete(rec) = step {
            assert_eq!(rec.payload, &[0x00, 0x01, 0x86, 0xA0]);
        } else {
            panic!("expected complete record");
        }
    }

    #[test]
    fn test_top_level_visible_string_skipped() {
        let mut parser = RecordParser::new();
        let mut record = vec![0x0A, 0x04];
        record.extend_from_slice(b"Kams");
        let done = run(&mut parser, &record);
        assert_eq!(done, vec![false, false, false, false, false, true]);
    }

    #[test]
    fn test_addressed_visible_string_skipped() {
        let mut parser = RecordParser::new();
        let mut record = vec![0x09, 0x06, 0x01, 0x01, 0x00, 0x00, 0x05, 0xFF, 0x0A, 0x03];
        record.extend_from_slice(b"570");
        for &b in &record[..record.len() - 1] {
            assert_eq!(parser.push(b), RecordStep::Pending);
        }
        assert_eq!(
            parser.push(b'0'),
            RecordStep::Skipped(SkipReason::AddressedString {
                value_tag: DLMS_TAG_VISIBLE_STRING,
                len: 3
            })
        );
    }

    #[test]
    fn test_short_address_not_dispatched() {
        let mut parser = RecordParser::new();
        let record = [0x09, 0x02, 0x01, 0x01, 0x12, 0x00, 0x05];
        for &b in &record[..record.len() - 1] {
            assert_eq!(parser.push(b), RecordStep::Pending);
        }
        assert_eq!(
            parser.push(0x05),
            RecordStep::Skipped(SkipReason::AddressWidth { len: 2 })
        );
    }

    #[test]
    fn test_unknown_tags_stall() {
        let mut parser = RecordParser::new();
        assert!(run(&mut parser, &[0x02, 0x19, 0x00, 0x00, 0x00]).iter().all(|d| !d));
        assert_eq!(parser.len(), 5);

        let mut parser = RecordParser::new();
        let record = [0x09, 0x06, 0x01, 0x01, 0x20, 0x07, 0x00, 0xFF, 0x10, 0x00, 0xE6, 0x00];
        assert!(run(&mut parser, &record).iter().all(|d| !d));
    }

    #[test]
    fn test_scratch_is_bounded() {
        let mut parser = RecordParser::new();
        for i in 0..(DLMS_SCRATCH_CAPACITY + 100) {
            assert_eq!(parser.push(i as u8 | 0x01), RecordStep::Pending);
        }
        assert_eq!(parser.len(), DLMS_SCRATCH_CAPACITY);
        parser.clear();
        assert!(parser.is_empty());
    }
}
