//! Converters from raw field payloads to reading values.
//!
//! All integers on the wire are big-endian and unsigned. Scaling is left to
//! the consumer; meters differ in the scaler they apply.

use crate::constants::DLMS_SIZE_DATE_TIME;
use crate::dlms::field::Field;
use chrono::{NaiveDate, NaiveDateTime};

/// Voltages and power factors travel as `Unsigned` (2 bytes).
pub fn field_u16(field: &Field<'_>) -> Option<u16> {
    field.as_u16()
}

/// Currents, powers, energies and the serial travel as `DoubleLongUnsigned`.
pub fn field_u32(field: &Field<'_>) -> Option<u32> {
    field.as_u32()
}

/// Decodes a COSEM date-time into local meter time.
///
/// Layout: year (u16 BE), month, day, weekday, hour, minute, second,
/// hundredths, deviation (i16 BE), clock status. `0xFF` hundredths means not
/// specified. Deviation and clock status are ignored.
pub fn cosem_datetime(raw: &[u8]) -> Option<NaiveDateTime> {
    if raw.len() != DLMS_SIZE_DATE_TIME {
        return None;
    }
    let year = i32::from(u16::from_be_bytes([raw[0], raw[1]]));
    let hundredths = match raw[8] {
        0xFF => 0,
        h if h < 100 => u32::from(h),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, u32::from(raw[2]), u32::from(raw[3]))?.and_hms_milli_opt(
        u32::from(raw[5]),
        u32::from(raw[6]),
        u32::from(raw[7]),
        hundredths * 10,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_cosem_datetime() {
        let raw = [0x07, 0xE3, 0x0C, 0x0A, 0x02, 0x0F, 0x2E, 0x0A, 0xFF, 0x80, 0x00, 0x00];
        let dt = cosem_datetime(&raw).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2019, 12, 10));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (15, 46, 10));
    }

    #[test]
    fn test_cosem_datetime_rejects_garbage() {
        assert!(cosem_datetime(&[0u8; 11]).is_none());
        let bad_month = [0x07, 0xE3, 0x0D, 0x0A, 0x02, 0x0F, 0x2E, 0x0A, 0xFF, 0x80, 0x00, 0x00];
        assert!(cosem_datetime(&bad_month).is_none());
        let bad_hundredths = [0x07, 0xE3, 0x0C, 0x0A, 0x02, 0x0F, 0x2E, 0x0A, 0x64, 0x80, 0x00, 0x00];
        assert!(cosem_datetime(&bad_hundredths).is_none());
    }
}
