//! OBIS object addresses.
//!
//! An OBIS code names a measured quantity with six value groups A-F. On the
//! wire it is six raw bytes; humans write it as `A-B:C.D.E.F`, for example
//! `1-1:32.7.0.255` for the L1 RMS voltage.

use crate::constants::DLMS_OBIS_ADDR_LEN;
use crate::error::DlmsError;
use nom::{
    branch::alt,
    character::complete::{char, u8 as dec_u8},
    combinator::{all_consuming, map},
    sequence::{preceded, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Six-byte OBIS object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObisCode(pub [u8; DLMS_OBIS_ADDR_LEN]);

impl ObisCode {
    pub const fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Self {
        ObisCode([a, b, c, d, e, f])
    }

    /// Copies the address out of a record buffer; `None` when fewer than six
    /// bytes are available.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; DLMS_OBIS_ADDR_LEN] = bytes.get(..DLMS_OBIS_ADDR_LEN)?.try_into().ok()?;
        Some(ObisCode(raw))
    }

    pub fn as_bytes(&self) -> &[u8; DLMS_OBIS_ADDR_LEN] {
        &self.0
    }
}

impl fmt::Display for ObisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a}-{b}:{c}.{d}.{e}.{g}")
    }
}

/// `A-B:C.D.E.F`
fn parse_reduced(input: &str) -> IResult<&str, ObisCode> {
    map(
        tuple((
            dec_u8,
            preceded(char('-'), dec_u8),
            preceded(char(':'), dec_u8),
            preceded(char('.'), dec_u8),
            preceded(char('.'), dec_u8),
            preceded(char('.'), dec_u8),
        )),
        |(a, b, c, d, e, f)| ObisCode::new(a, b, c, d, e, f),
    )(input)
}

/// `A.B.C.D.E.F`
fn parse_dotted(input: &str) -> IResult<&str, ObisCode> {
    map(
        tuple((
            dec_u8,
            preceded(char('.'), dec_u8),
            preceded(char('.'), dec_u8),
            preceded(char('.'), dec_u8),
            preceded(char('.'), dec_u8),
            preceded(char('.'), dec_u8),
        )),
        |(a, b, c, d, e, f)| ObisCode::new(a, b, c, d, e, f),
    )(input)
}

impl FromStr for ObisCode {
    type Err = DlmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_consuming(alt((parse_reduced, parse_dotted)))(s.trim())
            .map(|(_, code)| code)
            .map_err(|_| DlmsError::InvalidObisCode(s.to_string()))
    }
}
