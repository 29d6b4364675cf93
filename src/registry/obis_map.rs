//! OBIS code to field kind table for three-phase HAN meters.
//!
//! Widths are the number of value bytes delivered to the sink. The stream
//! carries more addresses than listed here; those are dropped on purpose.

use crate::constants::{DLMS_SIZE_U16, DLMS_SIZE_U32};
use crate::dlms::field::FieldKind;
use crate::registry::{ObisCode, RegistryEntry};

const fn entry(
    address: [u8; 6],
    kind: FieldKind,
    width: usize,
    label: &'static str,
) -> RegistryEntry {
    RegistryEntry {
        address: ObisCode(address),
        kind,
        width,
        label,
    }
}

/// Standard table, one entry per address.
pub const STANDARD_OBIS_MAP: &[RegistryEntry] = &[
    entry([0x01, 0x01, 0x20, 0x07, 0x00, 0xFF], FieldKind::RmsVoltageL1, DLMS_SIZE_U16, "RMS Voltage A"),
    entry([0x01, 0x01, 0x34, 0x07, 0x00, 0xFF], FieldKind::RmsVoltageL2, DLMS_SIZE_U16, "RMS Voltage B"),
    entry([0x01, 0x01, 0x48, 0x07, 0x00, 0xFF], FieldKind::RmsVoltageL3, DLMS_SIZE_U16, "RMS Voltage C"),
    entry([0x01, 0x01, 0x21, 0x07, 0x00, 0xFF], FieldKind::PowerFactorL1, DLMS_SIZE_U16, "Power Factor A"),
    entry([0x01, 0x01, 0x35, 0x07, 0x00, 0xFF], FieldKind::PowerFactorL2, DLMS_SIZE_U16, "Power Factor B"),
    entry([0x01, 0x01, 0x49, 0x07, 0x00, 0xFF], FieldKind::PowerFactorL3, DLMS_SIZE_U16, "Power Factor C"),
    entry([0x01, 0x01, 0x1F, 0x07, 0x00, 0xFF], FieldKind::RmsCurrentL1, DLMS_SIZE_U32, "RMS Current A"),
    entry([0x01, 0x01, 0x33, 0x07, 0x00, 0xFF], FieldKind::RmsCurrentL2, DLMS_SIZE_U32, "RMS Current B"),
    entry([0x01, 0x01, 0x47, 0x07, 0x00, 0xFF], FieldKind::RmsCurrentL3, DLMS_SIZE_U32, "RMS Current C"),
    entry([0x01, 0x01, 0x15, 0x07, 0x00, 0xFF], FieldKind::ActivePowerL1, DLMS_SIZE_U32, "Active Power A"),
    entry([0x01, 0x01, 0x29, 0x07, 0x00, 0xFF], FieldKind::ActivePowerL2, DLMS_SIZE_U32, "Active Power B"),
    entry([0x01, 0x01, 0x3D, 0x07, 0x00, 0xFF], FieldKind::ActivePowerL3, DLMS_SIZE_U32, "Active Power C"),
    entry([0x01, 0x01, 0x16, 0x07, 0x00, 0xFF], FieldKind::ReactivePowerL1, DLMS_SIZE_U32, "Reactive Power A"),
    entry([0x01, 0x01, 0x2A, 0x07, 0x00, 0xFF], FieldKind::ReactivePowerL2, DLMS_SIZE_U32, "Reactive Power B"),
    entry([0x01, 0x01, 0x3E, 0x07, 0x00, 0xFF], FieldKind::ReactivePowerL3, DLMS_SIZE_U32, "Reactive Power C"),
    entry([0x01, 0x01, 0x01, 0x08, 0x00, 0xFF], FieldKind::ActiveEnergyImport, DLMS_SIZE_U32, "Active Energy Import"),
    entry([0x01, 0x01, 0x02, 0x08, 0x00, 0xFF], FieldKind::ActiveEnergyExport, DLMS_SIZE_U32, "Active Energy Export"),
    entry([0x01, 0x01, 0x00, 0x00, 0x01, 0xFF], FieldKind::SerialNumber, DLMS_SIZE_U32, "Serial Identifier"),
];
