//! Tests for the crate-level helpers and configuration loading.

mod common;

use common::full_frame;
use dlms_rs::{collect_readings, decode_all, AppConfig, DecoderConfig, FieldKind, IntegrityMode};
use std::io::Write;

#[test]
fn test_decode_all_multiple_frames() {
    let mut stream = full_frame().build();
    stream.extend(full_frame().end_marker(0x00).build());
    stream.extend(full_frame().build());

    let (fields, summary) = decode_all(&stream, DecoderConfig::default());
    assert_eq!(summary.frame_errors, 1);
    assert_eq!(fields.iter().filter(|f| f.kind == FieldKind::FrameEnd).count(), 3);
}

#[test]
fn test_collect_readings_serial_latched() {
    let first = full_frame().build();
    let second = full_frame()
        .double_long("1-1:0.0.1.255", 999)
        .build();
    let mut stream = first;
    stream.extend(second);

    let (readings, _) = collect_readings(&stream, DecoderConfig::default());
    assert_eq!(readings.len(), 2);
    assert!(readings.iter().all(|r| r.serial_number == Some(12_345_678)));
}

#[test]
fn test_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "serial": {{ "port": "/dev/ttyUSB0", "silence_ms": 0 }},
            "decoder": {{ "integrity": "verify", "emit_unrecognized": true }}
        }}"#
    )
    .unwrap();
    file.flush().unwrap();

    let config = AppConfig::load(file.path()).unwrap();
    assert_eq!(config.serial.port, "/dev/ttyUSB0");
    assert_eq!(config.serial.silence_ms, 0);
    assert_eq!(config.serial.read_buffer, 1024);
    assert_eq!(config.decoder.integrity, IntegrityMode::Verify);
    assert!(config.decoder.emit_unrecognized);
    assert!(!config.decoder.forward_timestamp);

    let json = config.to_json().unwrap();
    assert_eq!(AppConfig::from_json(&json).unwrap(), config);
}

#[test]
fn test_config_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(AppConfig::load(dir.path().join("dlms.json")).is_err());
}
