//! # DLMS Push Frame Handling
//!
//! Incremental decoding of HDLC-framed DLMS data-notifications, the field
//! types handed to sinks, and the serial byte source feeding the decoder.

pub mod decoder;
pub mod fcs;
pub mod field;
pub mod record;
pub mod serial;

pub use decoder::{Decoder, DecoderConfig, DecoderState, FeedSummary, IntegrityMode};
pub use field::{Field, FieldKind, FieldLog, FieldSink, OwnedField};
pub use serial::{open_port, pump, PumpStats, SerialConfig, SilenceGate};
