//! Decoded fields and the sink that receives them.
//!
//! A [`Field`] borrows its payload from the decoder's scratch buffer and is
//! only valid for the duration of [`FieldSink::handle`]. Sinks that need the
//! bytes afterwards convert with [`Field::to_owned`].

use crate::registry::ObisCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic kind of an emitted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    FrameStart,
    FrameEnd,
    /// Frame rejected by integrity verification; replaces `FrameEnd`.
    FrameAborted,
    RmsVoltageL1,
    RmsVoltageL2,
    RmsVoltageL3,
    RmsCurrentL1,
    RmsCurrentL2,
    RmsCurrentL3,
    ActivePowerL1,
    ActivePowerL2,
    ActivePowerL3,
    ReactivePowerL1,
    ReactivePowerL2,
    ReactivePowerL3,
    PowerFactorL1,
    PowerFactorL2,
    PowerFactorL3,
    ActiveEnergyImport,
    ActiveEnergyExport,
    SerialNumber,
    Timestamp,
    Unrecognized,
}

impl FieldKind {
    /// Frame boundary markers carry no payload.
    pub fn is_frame_marker(self) -> bool {
        matches!(
            self,
            FieldKind::FrameStart | FieldKind::FrameEnd | FieldKind::FrameAborted
        )
    }

    /// Kinds that describe a physical measurement.
    pub fn is_measurement(self) -> bool {
        !self.is_frame_marker()
            && !matches!(
                self,
                FieldKind::SerialNumber | FieldKind::Timestamp | FieldKind::Unrecognized
            )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One decoded unit handed to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub kind: FieldKind,
    /// Source address for data fields
    pub address: Option<ObisCode>,
    /// Registry label, when the field came from a registry match
    pub label: Option<&'static str>,
    pub payload: &'a [u8],
}

impl<'a> Field<'a> {
    pub(crate) fn marker(kind: FieldKind) -> Self {
        Field {
            kind,
            address: None,
            label: None,
            payload: &[],
        }
    }

    /// Payload as a big-endian u16, when exactly two bytes wide.
    pub fn as_u16(&self) -> Option<u16> {
        let raw: [u8; 2] = self.payload.try_into().ok()?;
        Some(u16::from_be_bytes(raw))
    }

    /// Payload as a big-endian u32, when exactly four bytes wide.
    pub fn as_u32(&self) -> Option<u32> {
        let raw: [u8; 4] = self.payload.try_into().ok()?;
        Some(u32::from_be_bytes(raw))
    }

    /// Payload as a big-endian unsigned integer of any width up to eight bytes.
    pub fn as_uint(&self) -> Option<u64> {
        if self.payload.is_empty() || self.payload.len() > 8 {
            return None;
        }
        Some(
            self.payload
                .iter()
                .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        )
    }

    pub fn to_owned(&self) -> OwnedField {
        OwnedField {
            kind: self.kind,
            address: self.address,
            label: self.label.map(str::to_string),
            payload: self.payload.to_vec(),
        }
    }
}

/// Field detached from the decoder's scratch buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedField {
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<ObisCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(with = "hex_payload")]
    pub payload: Vec<u8>,
}

impl OwnedField {
    pub fn as_field(&self) -> Field<'_> {
        Field {
            kind: self.kind,
            address: self.address,
            label: None,
            payload: &self.payload,
        }
    }
}

mod hex_payload {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}

/// Consumer of decoded fields.
///
/// Called synchronously from inside `Decoder::feed`, in wire order. A slow
/// sink stalls byte ingestion; hand work off to another task if needed.
pub trait FieldSink {
    fn handle(&mut self, field: &Field<'_>);
}

impl<F> FieldSink for F
where
    F: FnMut(&Field<'_>),
{
    fn handle(&mut self, field: &Field<'_>) {
        self(field)
    }
}

/// Sink that keeps an owned copy of every field, mostly useful in tests and
/// offline decoding.
#[derive(Debug, Default, Clone)]
pub struct FieldLog {
    pub fields: Vec<OwnedField>,
}

impl FieldLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> Vec<FieldKind> {
        self.fields.iter().map(|f| f.kind).collect()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }
}

impl FieldSink for FieldLog {
    fn handle(&mut self, field: &Field<'_>) {
        self.fields.push(field.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_accessors() {
        let field = Field {
            kind: FieldKind::RmsVoltageL1,
            address: None,
            label: None,
            payload: &[0x00, 0xE6],
        };
        assert_eq!(field.as_u16(), Some(230));
        assert_eq!(field.as_u32(), None);
        assert_eq!(field.as_uint(), Some(230));

        let field = Field {
            payload: &[0x00, 0x00, 0x05, 0xDC],
            ..field
        };
        assert_eq!(field.as_u32(), Some(1500));
        assert_eq!(field.as_u16(), None);
    }

    #[test]
    fn test_markers_have_empty_payload() {
        let start = Field::marker(FieldKind::FrameStart);
        assert!(start.payload.is_empty());
        assert!(start.kind.is_frame_marker());
        assert_eq!(start.as_uint(), None);
        assert!(!FieldKind::SerialNumber.is_measurement());
        assert!(FieldKind::ActiveEnergyImport.is_measurement());
    }

    #[test]
    fn test_owned_field_json() {
        let owned = Field {
            kind: FieldKind::ActivePowerL1,
            address: Some(ObisCode::new(1, 1, 21, 7, 0, 255)),
            label: Some("Active Power A"),
            payload: &[0x00, 0x00, 0x01, 0x2C],
        }
        .to_owned();
        let json = serde_json::to_value(&owned).unwrap();
        assert_eq!(json["kind"], "active_power_l1");
        assert_eq!(json["payload"], "0000012c");
        assert_eq!(json["label"], "Active Power A");
        let back: OwnedField = serde_json::from_value(json).unwrap();
        assert_eq!(back, owned);
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |f: &Field<'_>| seen.push(f.kind);
            sink.handle(&Field::marker(FieldKind::FrameStart));
            sink.handle(&Field::marker(FieldKind::FrameEnd));
        }
        assert_eq!(seen, vec![FieldKind::FrameStart, FieldKind::FrameEnd]);
    }
}
