//! # dlms-rs - Incremental Decoder for DLMS/COSEM Push Frames
//!
//! Utility meters with a HAN port push an HDLC-framed DLMS data-notification
//! every few seconds. This crate decodes that stream one byte at a time and
//! hands semantically tagged fields to a caller supplied sink.
//!
//! ## Features
//!
//! - Byte-at-a-time decoder with bounded memory, no frame buffering
//! - OBIS code registry mapping object addresses onto field kinds
//! - Optional HCS/FCS verification (CRC-16/X.25)
//! - Reading collector assembling one snapshot per frame
//! - Serial byte source built on tokio-serial
//!
//! ## Usage
//!
//! ```rust
//! use dlms_rs::{Decoder, Field, FieldKind};
//!
//! let mut voltages = Vec::new();
//! let mut decoder = Decoder::new(|f: &Field<'_>| {
//!     if f.kind == FieldKind::RmsVoltageL1 {
//!         voltages.push(f.as_u16());
//!     }
//! });
//! for byte in [0x7E, 0xA0, 0x20] {
//!     decoder.feed(byte).unwrap();
//! }
//! drop(decoder);
//! assert!(voltages.is_empty());
//! ```

pub mod config;
pub mod constants;
pub mod dlms;
pub mod error;
pub mod logging;
pub mod reading;
pub mod registry;
pub mod util;

pub use crate::config::AppConfig;
pub use crate::error::DlmsError;
pub use crate::logging::{init_logger, log_info};

pub use dlms::{
    Decoder, DecoderConfig, DecoderState, FeedSummary, Field, FieldKind, FieldLog, FieldSink,
    IntegrityMode, OwnedField, PumpStats, SerialConfig, SilenceGate,
};
pub use reading::{MeterReading, ReadingCollector};
pub use registry::{FieldRegistry, ObisCode, RegistryEntry};

/// Decode a complete byte capture, returning every emitted field.
///
/// Frame errors are logged and decoding resumes at the next start marker.
pub fn decode_all(bytes: &[u8], config: DecoderConfig) -> (Vec<OwnedField>, FeedSummary) {
    let mut decoder = Decoder::with_config(FieldLog::new(), config);
    let summary = decoder.feed_all(bytes);
    (decoder.into_sink().fields, summary)
}

/// Decode a capture into meter readings.
pub fn collect_readings(bytes: &[u8], config: DecoderConfig) -> (Vec<MeterReading>, FeedSummary) {
    let mut decoder = Decoder::with_config(ReadingCollector::new(), config);
    let summary = decoder.feed_all(bytes);
    (decoder.into_sink().drain(), summary)
}

/// Open the configured serial port and decode until it closes.
pub async fn listen<S: FieldSink>(
    serial: &SerialConfig,
    decoder: &mut Decoder<S>,
) -> Result<PumpStats, DlmsError> {
    let mut port = dlms::open_port(serial)?;
    let mut gate = SilenceGate::new(serial.silence());
    dlms::pump(&mut port, decoder, &mut gate, serial.read_buffer).await
}
