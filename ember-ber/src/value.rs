//! Universal primitive values
//!
//! Decoding and encoding of the value part of the universal primitive types
//! used by Ember+. Each function works on the content octets only; tag and
//! length are handled by [`crate::types`].

use crate::error::{EmberError, EmberResult};
use crate::types::BerTag;

/// Universal tag numbers
pub mod universal {
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const REAL: u32 = 9;
    pub const UTF8_STRING: u32 = 12;
    pub const RELATIVE_OID: u32 = 13;
    pub const SEQUENCE: u32 = 16;
    pub const SET: u32 = 17;
}

/// A decoded universal primitive value
#[derive(Debug, Clone, PartialEq)]
pub enum BerValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Utf8String(String),
    OctetString(Vec<u8>),
    Null,
    RelativeOid(Vec<u32>),
}

impl BerValue {
    /// Decode the content octets of a universal primitive
    ///
    /// # Error Handling
    /// Returns `UnsupportedEncoding` if the tag is not a universal primitive
    /// type known to Ember+, and the type-specific error otherwise.
    pub fn decode(tag: &BerTag, bytes: &[u8]) -> EmberResult<Self> {
        if tag.is_constructed() || !matches!(tag.class(), crate::types::BerTagClass::Universal) {
            return Err(EmberError::UnsupportedEncoding(format!(
                "{} is not a universal primitive",
                tag
            )));
        }

        match tag.number() {
            universal::BOOLEAN => decode_boolean(bytes).map(BerValue::Boolean),
            universal::INTEGER => decode_integer(bytes).map(BerValue::Integer),
            universal::REAL => decode_real(bytes).map(BerValue::Real),
            universal::UTF8_STRING => decode_utf8_string(bytes).map(BerValue::Utf8String),
            universal::OCTET_STRING => Ok(BerValue::OctetString(bytes.to_vec())),
            universal::NULL => decode_null(bytes).map(|_| BerValue::Null),
            universal::RELATIVE_OID => decode_relative_oid(bytes).map(BerValue::RelativeOid),
            other => Err(EmberError::UnsupportedEncoding(format!(
                "Universal type {} not supported",
                other
            ))),
        }
    }

    /// The universal tag this value is encoded with
    pub fn tag(&self) -> BerTag {
        let number = match self {
            BerValue::Boolean(_) => universal::BOOLEAN,
            BerValue::Integer(_) => universal::INTEGER,
            BerValue::Real(_) => universal::REAL,
            BerValue::Utf8String(_) => universal::UTF8_STRING,
            BerValue::OctetString(_) => universal::OCTET_STRING,
            BerValue::Null => universal::NULL,
            BerValue::RelativeOid(_) => universal::RELATIVE_OID,
        };
        BerTag::universal(false, number)
    }

    /// Encode the content octets of this value
    pub fn encode_content(&self) -> Vec<u8> {
        match self {
            BerValue::Boolean(value) => encode_boolean(*value),
            BerValue::Integer(value) => encode_integer(*value),
            BerValue::Real(value) => encode_real(*value),
            BerValue::Utf8String(value) => value.as_bytes().to_vec(),
            BerValue::OctetString(value) => value.clone(),
            BerValue::Null => Vec::new(),
            BerValue::RelativeOid(value) => encode_relative_oid(value),
        }
    }
}

/// Decode BOOLEAN content (any non-zero octet is `true`)
pub fn decode_boolean(bytes: &[u8]) -> EmberResult<bool> {
    match bytes {
        [value] => Ok(*value != 0),
        _ => Err(EmberError::InvalidData(format!(
            "BOOLEAN must be 1 byte, got {}",
            bytes.len()
        ))),
    }
}

/// Decode INTEGER content (big-endian two's complement, up to 8 bytes)
pub fn decode_integer(bytes: &[u8]) -> EmberResult<i64> {
    if bytes.is_empty() {
        return Err(EmberError::InvalidData("Empty integer encoding".to_string()));
    }

    if bytes.len() > 8 {
        return Err(EmberError::UnsupportedEncoding(format!(
            "Integer too large: {} bytes (max 8)",
            bytes.len()
        )));
    }

    let is_negative = (bytes[0] & 0x80) != 0;
    let mut value: i64 = if is_negative { -1 } else { 0 };
    for &byte in bytes {
        value = (value << 8) | byte as i64;
    }

    Ok(value)
}

/// Decode NULL content (must be empty)
pub fn decode_null(bytes: &[u8]) -> EmberResult<()> {
    if bytes.is_empty() {
        Ok(())
    } else {
        Err(EmberError::InvalidData(format!(
            "NULL must be empty, got {} bytes",
            bytes.len()
        )))
    }
}

/// Decode UTF8String content
pub fn decode_utf8_string(bytes: &[u8]) -> EmberResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| EmberError::InvalidData(format!("Invalid UTF-8 string: {}", e)))
}

/// Decode RELATIVE-OID content (base-128 sub-identifiers)
pub fn decode_relative_oid(bytes: &[u8]) -> EmberResult<Vec<u32>> {
    let mut result = Vec::new();
    let mut component = 0u32;
    let mut pending = false;

    for &byte in bytes {
        component = component
            .checked_mul(128)
            .and_then(|x| x.checked_add((byte & 0x7F) as u32))
            .ok_or_else(|| {
                EmberError::UnsupportedEncoding("RELATIVE-OID component overflow".to_string())
            })?;
        pending = (byte & 0x80) != 0;

        if !pending {
            result.push(component);
            component = 0;
        }
    }

    if pending {
        return Err(EmberError::InvalidData(
            "Incomplete RELATIVE-OID component".to_string(),
        ));
    }

    Ok(result)
}

/// Decode REAL content
///
/// # Supported Forms
/// - empty content: `0.0`
/// - special values: `0x40` (+INF), `0x41` (-INF), `0x42` (NaN), `0x43` (-0.0)
/// - binary form with base 2, 8 or 16 and scale factor
///
/// Decimal (ISO 6093) encodings are reported as unsupported.
pub fn decode_real(bytes: &[u8]) -> EmberResult<f64> {
    let Some(&preamble) = bytes.first() else {
        return Ok(0.0);
    };

    if (preamble & 0x80) == 0 {
        return match (preamble, bytes.len()) {
            (0x40, 1) => Ok(f64::INFINITY),
            (0x41, 1) => Ok(f64::NEG_INFINITY),
            (0x42, 1) => Ok(f64::NAN),
            (0x43, 1) => Ok(-0.0),
            _ => Err(EmberError::UnsupportedEncoding(format!(
                "REAL form 0x{:02X} not supported",
                preamble
            ))),
        };
    }

    let negative = (preamble & 0x40) != 0;
    let base_bits: i32 = match (preamble >> 4) & 0x03 {
        0 => 1,
        1 => 3,
        2 => 4,
        _ => {
            return Err(EmberError::InvalidData("Reserved REAL base".to_string()));
        }
    };
    let scale = ((preamble >> 2) & 0x03) as i32;

    let (exponent_len, mut pos) = match preamble & 0x03 {
        3 => {
            let count = *bytes.get(1).ok_or_else(|| {
                EmberError::InvalidData("REAL exponent length missing".to_string())
            })? as usize;
            (count, 2)
        }
        n => (n as usize + 1, 1),
    };

    if exponent_len == 0 || bytes.len() < pos + exponent_len {
        return Err(EmberError::InvalidData("Truncated REAL exponent".to_string()));
    }
    if exponent_len > 4 {
        return Err(EmberError::UnsupportedEncoding(format!(
            "REAL exponent too large: {} bytes",
            exponent_len
        )));
    }

    let exponent = decode_integer(&bytes[pos..pos + exponent_len])?;
    pos += exponent_len;

    let mantissa_bytes = &bytes[pos..];
    if mantissa_bytes.len() > 8 {
        return Err(EmberError::UnsupportedEncoding(format!(
            "REAL mantissa too large: {} bytes",
            mantissa_bytes.len()
        )));
    }
    let mantissa = mantissa_bytes
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) | byte as u64);

    let power = exponent
        .checked_mul(base_bits as i64)
        .and_then(|x| x.checked_add(scale as i64))
        .filter(|x| i32::try_from(*x).is_ok())
        .ok_or_else(|| EmberError::UnsupportedEncoding("REAL exponent out of range".to_string()))?;

    let magnitude = scale_by_power_of_two(mantissa as f64, power as i32);
    Ok(if negative { -magnitude } else { magnitude })
}

/// `value * 2^power` without overflowing the intermediate power
fn scale_by_power_of_two(mut value: f64, mut power: i32) -> f64 {
    while power > 1000 {
        value *= 2f64.powi(1000);
        power -= 1000;
    }
    while power < -1000 {
        value *= 2f64.powi(-1000);
        power += 1000;
    }
    value * 2f64.powi(power)
}

/// Encode BOOLEAN content
pub fn encode_boolean(value: bool) -> Vec<u8> {
    vec![if value { 0xFF } else { 0x00 }]
}

/// Encode INTEGER content (minimal two's complement, big-endian)
pub fn encode_integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;

    // Drop leading bytes that only repeat the sign
    while start < 7 {
        let redundant = (bytes[start] == 0x00 && (bytes[start + 1] & 0x80) == 0)
            || (bytes[start] == 0xFF && (bytes[start + 1] & 0x80) != 0);
        if !redundant {
            break;
        }
        start += 1;
    }

    bytes[start..].to_vec()
}

/// Encode RELATIVE-OID content
pub fn encode_relative_oid(components: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(components.len());

    for &component in components {
        let mut temp = component;
        let mut component_bytes = Vec::with_capacity(5);

        loop {
            component_bytes.push((temp & 0x7F) as u8);
            temp >>= 7;
            if temp == 0 {
                break;
            }
        }

        let last = component_bytes.len() - 1;
        for (i, &byte) in component_bytes.iter().rev().enumerate() {
            if i < last {
                bytes.push(byte | 0x80);
            } else {
                bytes.push(byte);
            }
        }
    }

    bytes
}

/// Encode REAL content in binary base-2 form
///
/// The mantissa is normalised to an odd integer so every finite double
/// round-trips exactly.
pub fn encode_real(value: f64) -> Vec<u8> {
    if value.is_nan() {
        return vec![0x42];
    }
    if value.is_infinite() {
        return vec![if value > 0.0 { 0x40 } else { 0x41 }];
    }
    if value == 0.0 {
        return if value.is_sign_negative() { vec![0x43] } else { Vec::new() };
    }

    let bits = value.to_bits();
    let negative = (bits >> 63) != 0;
    let biased_exponent = ((bits >> 52) & 0x7FF) as i64;
    let fraction = bits & 0x000F_FFFF_FFFF_FFFF;

    let (mut mantissa, mut exponent) = if biased_exponent == 0 {
        (fraction, -1074i64)
    } else {
        (fraction | 0x0010_0000_0000_0000, biased_exponent - 1075)
    };

    while (mantissa & 1) == 0 {
        mantissa >>= 1;
        exponent += 1;
    }

    let exponent_bytes = encode_integer(exponent);
    let mantissa_bytes: Vec<u8> = mantissa
        .to_be_bytes()
        .into_iter()
        .skip_while(|&byte| byte == 0)
        .collect();

    let mut result = Vec::with_capacity(1 + exponent_bytes.len() + mantissa_bytes.len());
    let sign_bit = if negative { 0x40 } else { 0x00 };
    result.push(0x80 | sign_bit | (exponent_bytes.len() as u8 - 1));
    result.extend_from_slice(&exponent_bytes);
    result.extend_from_slice(&mantissa_bytes);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_encoding() {
        assert_eq!(encode_integer(0), vec![0x00]);
        assert_eq!(encode_integer(127), vec![0x7F]);
        assert_eq!(encode_integer(128), vec![0x00, 0x80]);
        assert_eq!(encode_integer(-1), vec![0xFF]);
        assert_eq!(encode_integer(-128), vec![0x80]);
        assert_eq!(encode_integer(-129), vec![0xFF, 0x7F]);
        assert_eq!(encode_integer(12345), vec![0x30, 0x39]);
    }

    #[test]
    fn test_integer_decoding() {
        assert_eq!(decode_integer(&[0x30, 0x39]).unwrap(), 12345);
        assert_eq!(decode_integer(&[0xFF, 0x7F]).unwrap(), -129);
        assert_eq!(decode_integer(&[0x80]).unwrap(), -128);
        assert_eq!(
            decode_integer(&[0x80, 0, 0, 0, 0, 0, 0, 0]).unwrap(),
            i64::MIN
        );
    }

    #[test]
    fn test_integer_oversized_is_reported() {
        let err = decode_integer(&[0x01; 9]).unwrap_err();
        assert!(matches!(err, EmberError::UnsupportedEncoding(_)));
        assert!(decode_integer(&[]).is_err());
    }

    #[test]
    fn test_boolean() {
        assert!(decode_boolean(&[0xFF]).unwrap());
        assert!(decode_boolean(&[0x01]).unwrap());
        assert!(!decode_boolean(&[0x00]).unwrap());
        assert!(decode_boolean(&[]).is_err());
    }

    #[test]
    fn test_relative_oid() {
        let encoded = encode_relative_oid(&[1, 2, 300]);
        assert_eq!(encoded, vec![0x01, 0x02, 0x82, 0x2C]);
        assert_eq!(decode_relative_oid(&encoded).unwrap(), vec![1, 2, 300]);
        assert!(decode_relative_oid(&[0x82]).is_err());
        assert_eq!(decode_relative_oid(&[]).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_real_known_encoding() {
        // 1.5 = 3 * 2^-1
        assert_eq!(encode_real(1.5), vec![0x80, 0xFF, 0x03]);
        assert_eq!(decode_real(&[0x80, 0xFF, 0x03]).unwrap(), 1.5);
        // -0.25 = -1 * 2^-2
        assert_eq!(decode_real(&encode_real(-0.25)).unwrap(), -0.25);
    }

    #[test]
    fn test_real_special_values() {
        assert!(encode_real(0.0).is_empty());
        assert_eq!(decode_real(&[]).unwrap(), 0.0);
        assert_eq!(decode_real(&[0x40]).unwrap(), f64::INFINITY);
        assert_eq!(decode_real(&[0x41]).unwrap(), f64::NEG_INFINITY);
        assert!(decode_real(&[0x42]).unwrap().is_nan());
        assert!(decode_real(&encode_real(-0.0)).unwrap().is_sign_negative());
    }

    #[test]
    fn test_real_other_bases() {
        // base 16, exponent 1, mantissa 1 => 16.0
        assert_eq!(decode_real(&[0xA0, 0x01, 0x01]).unwrap(), 16.0);
        // base 8 with scale factor 1, exponent 1, mantissa 3 => 3 * 2 * 8 = 48.0
        assert_eq!(decode_real(&[0x94, 0x01, 0x03]).unwrap(), 48.0);
    }

    #[test]
    fn test_real_decimal_unsupported() {
        let err = decode_real(&[0x01, b'1']).unwrap_err();
        assert!(matches!(err, EmberError::UnsupportedEncoding(_)));
    }

    #[test]
    fn test_real_extremes() {
        for value in [f64::MAX, f64::MIN_POSITIVE, 5e-324, 3.141592653589793, -1e300] {
            assert_eq!(decode_real(&encode_real(value)).unwrap(), value);
        }
    }

    #[test]
    fn test_value_decode_dispatch() {
        let tag = BerTag::universal(false, universal::UTF8_STRING);
        assert_eq!(
            BerValue::decode(&tag, b"Gain").unwrap(),
            BerValue::Utf8String("Gain".to_string())
        );

        let unsupported = BerTag::universal(false, 3);
        assert!(BerValue::decode(&unsupported, &[0]).is_err());
        assert_eq!(BerValue::Null.tag(), BerTag::universal(false, universal::NULL));
    }
}
