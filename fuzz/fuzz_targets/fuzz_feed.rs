#![no_main]

use dlms_rs::{Decoder, DecoderConfig, FieldKind, FieldLog, IntegrityMode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte selects the configuration
    let Some((&mode, bytes)) = data.split_first() else {
        return;
    };
    let config = DecoderConfig {
        integrity: if mode & 1 != 0 {
            IntegrityMode::Verify
        } else {
            IntegrityMode::Ignore
        },
        forward_timestamp: mode & 2 != 0,
        emit_unrecognized: mode & 4 != 0,
    };

    let mut decoder = Decoder::with_config(FieldLog::new(), config);
    for &b in bytes {
        if decoder.feed(b).is_err() {
            decoder.reset();
        }
    }

    let log = decoder.into_sink();
    if !bytes.contains(&0x7E) {
        assert!(log.fields.is_empty());
    }
    for field in &log.fields {
        if field.kind.is_frame_marker() {
            assert!(field.payload.is_empty());
        } else if field.kind != FieldKind::Unrecognized && field.kind != FieldKind::Timestamp {
            assert!(field.payload.len() <= 4);
        }
    }
});
