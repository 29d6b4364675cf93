//! Push frame builder shared by the integration tests.
#![allow(dead_code)]

use dlms_rs::dlms::fcs::checksum_bytes;
use dlms_rs::ObisCode;

pub const KAMSTRUP_CAPTURE: &str = include_str!("../data/kamstrup_push.hex");

pub const DATE_TIME: [u8; 12] = [
    0x07, 0xE3, 0x0C, 0x0A, 0x02, 0x0F, 0x2E, 0x0A, 0xFF, 0x80, 0x00, 0x00,
];

pub fn obis(code: &str) -> ObisCode {
    code.parse().unwrap()
}

/// Assembles one well-formed push frame with valid HCS and FCS.
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    records: Vec<u8>,
    length_override: Option<usize>,
    end_marker: Option<u8>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.records.extend_from_slice(bytes);
        self
    }

    pub fn unsigned(self, code: &str, value: u16) -> Self {
        let mut rec = vec![0x09, 0x06];
        rec.extend_from_slice(obis(code).as_bytes());
        rec.push(0x12);
        rec.extend_from_slice(&value.to_be_bytes());
        self.raw(&rec)
    }

    pub fn double_long(self, code: &str, value: u32) -> Self {
        let mut rec = vec![0x09, 0x06];
        rec.extend_from_slice(obis(code).as_bytes());
        rec.push(0x06);
        rec.extend_from_slice(&value.to_be_bytes());
        self.raw(&rec)
    }

    pub fn visible_string(self, text: &str) -> Self {
        let mut rec = vec![0x0A, text.len() as u8];
        rec.extend_from_slice(text.as_bytes());
        self.raw(&rec)
    }

    pub fn addressed_string(self, code: &str, text: &str) -> Self {
        let mut rec = vec![0x09, 0x06];
        rec.extend_from_slice(obis(code).as_bytes());
        rec.push(0x0A);
        rec.push(text.len() as u8);
        rec.extend_from_slice(text.as_bytes());
        self.raw(&rec)
    }

    /// Declare a frame length other than the real one.
    pub fn length(mut self, length: usize) -> Self {
        self.length_override = Some(length);
        self
    }

    pub fn end_marker(mut self, byte: u8) -> Self {
        self.end_marker = Some(byte);
        self
    }

    /// Length from the format field through the FCS.
    pub fn frame_length(&self) -> usize {
        self.length_override.unwrap_or(32 + self.records.len())
    }

    pub fn build(&self) -> Vec<u8> {
        let length = self.frame_length();
        let header = [0xA0 | ((length >> 8) as u8 & 0x0F), (length & 0xFF) as u8, 0x2B, 0x21, 0x13];

        let mut body = header.to_vec();
        body.extend_from_slice(&checksum_bytes(&header));
        body.extend_from_slice(&[0xE6, 0xE7, 0x00]);
        body.extend_from_slice(&[0x0F, 0x00, 0x00, 0x00, 0x01]);
        body.push(0x0C);
        body.extend_from_slice(&DATE_TIME);
        body.extend_from_slice(&[0x02, 0x19]);
        body.extend_from_slice(&self.records);

        let mut frame = vec![0x7E];
        frame.extend_from_slice(&body);
        frame.extend_from_slice(&checksum_bytes(&body));
        frame.push(self.end_marker.unwrap_or(0x7E));
        frame
    }
}

/// Offsets of the two HCS and two FCS bytes in a built frame.
pub fn hcs_offset() -> usize {
    6
}

pub fn fcs_offset(frame: &[u8]) -> usize {
    frame.len() - 3
}

/// Three-phase frame with one value per registry entry.
pub fn full_frame() -> FrameBuilder {
    FrameBuilder::new()
        .visible_string("Kamstrup_V0001")
        .addressed_string("1-1:0.0.5.255", "5706567000000000")
        .unsigned("1-1:32.7.0.255", 230)
        .unsigned("1-1:52.7.0.255", 231)
        .unsigned("1-1:72.7.0.255", 232)
        .double_long("1-1:31.7.0.255", 150)
        .double_long("1-1:51.7.0.255", 151)
        .double_long("1-1:71.7.0.255", 152)
        .double_long("1-1:21.7.0.255", 3000)
        .double_long("1-1:41.7.0.255", 3001)
        .double_long("1-1:61.7.0.255", 3002)
        .double_long("1-1:22.7.0.255", 10)
        .double_long("1-1:42.7.0.255", 11)
        .double_long("1-1:62.7.0.255", 12)
        .unsigned("1-1:33.7.0.255", 990)
        .unsigned("1-1:53.7.0.255", 980)
        .unsigned("1-1:73.7.0.255", 970)
        .double_long("1-1:1.8.0.255", 1_234_567)
        .double_long("1-1:2.8.0.255", 7)
        .double_long("1-1:0.0.1.255", 12_345_678)
}
