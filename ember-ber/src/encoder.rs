//! BER encoder for Ember+ payloads
//!
//! This module is the writer side of the TTLV codec. It produces the same
//! encodings the reader accepts, including nested containers in definite or
//! indefinite length form.
//!
//! # Usage Example
//!
//! ```rust
//! use ember_ber::{BerEncoder, BerTag, BerValue};
//!
//! let mut encoder = BerEncoder::new();
//! encoder.begin_container(BerTag::application(true, 1), false);
//! encoder.encode_field(0, &BerValue::Integer(1));
//! encoder.end_container().unwrap();
//! let bytes = encoder.into_bytes();
//! assert_eq!(bytes, vec![0x61, 0x05, 0xA0, 0x03, 0x02, 0x01, 0x01]);
//! ```

use crate::error::{EmberError, EmberResult};
use crate::types::{BerLength, BerTag};
use crate::value::{self, BerValue};

/// An open container awaiting `end_container`
#[derive(Debug, Clone, Copy)]
struct OpenContainer {
    /// Position of the first content byte (definite) or `None` (indefinite)
    content_start: Option<usize>,
}

/// BER encoder for Ember+ structures
///
/// Each encoded value consists of a TLV (Tag-Length-Value) triplet.
/// Containers are opened with [`BerEncoder::begin_container`] and closed with
/// [`BerEncoder::end_container`]; for definite-length containers the length
/// is inserted when the container is closed.
#[derive(Debug, Default)]
pub struct BerEncoder {
    buffer: Vec<u8>,
    open: Vec<OpenContainer>,
}

impl BerEncoder {
    /// Create a new BER encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new BER encoder with initial capacity
    ///
    /// # Arguments
    /// * `capacity` - Initial buffer capacity in bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            open: Vec::new(),
        }
    }

    /// Encode a TLV (Tag-Length-Value) triplet with a definite length
    ///
    /// # Arguments
    /// * `tag` - BER tag
    /// * `value` - Value bytes (already encoded)
    pub fn encode_tlv(&mut self, tag: &BerTag, value: &[u8]) {
        tag.encode_into(&mut self.buffer);
        BerLength::new(value.len()).encode_into(&mut self.buffer);
        self.buffer.extend_from_slice(value);
    }

    /// Encode a universal primitive value
    pub fn encode_value(&mut self, value: &BerValue) {
        let content = value.encode_content();
        self.encode_tlv(&value.tag(), &content);
    }

    /// Encode an INTEGER
    pub fn encode_integer(&mut self, value: i64) {
        self.encode_value(&BerValue::Integer(value));
    }

    /// Encode a BOOLEAN
    pub fn encode_boolean(&mut self, value: bool) {
        self.encode_value(&BerValue::Boolean(value));
    }

    /// Encode a REAL
    pub fn encode_real(&mut self, value: f64) {
        self.encode_value(&BerValue::Real(value));
    }

    /// Encode a UTF8String
    pub fn encode_utf8_string(&mut self, value: &str) {
        let tag = BerTag::universal(false, value::universal::UTF8_STRING);
        self.encode_tlv(&tag, value.as_bytes());
    }

    /// Encode an OCTET STRING
    pub fn encode_octet_string(&mut self, value: &[u8]) {
        let tag = BerTag::universal(false, value::universal::OCTET_STRING);
        self.encode_tlv(&tag, value);
    }

    /// Encode a NULL
    pub fn encode_null(&mut self) {
        self.encode_value(&BerValue::Null);
    }

    /// Encode a RELATIVE-OID
    pub fn encode_relative_oid(&mut self, components: &[u32]) {
        self.encode_value(&BerValue::RelativeOid(components.to_vec()));
    }

    /// Encode an explicitly tagged field: `[n]` wrapping a universal value
    ///
    /// This is how every Glow field is put on the wire.
    pub fn encode_field(&mut self, number: u32, value: &BerValue) {
        let content = value.encode_content();
        let mut inner = Vec::with_capacity(content.len() + BerTag::MAX_ENCODED_LEN + 5);
        value.tag().encode_into(&mut inner);
        BerLength::new(content.len()).encode_into(&mut inner);
        inner.extend_from_slice(&content);
        self.encode_tlv(&BerTag::context_specific(true, number), &inner);
    }

    /// Open a constructed value
    ///
    /// # Arguments
    /// * `tag` - Container tag (the constructed flag is set automatically)
    /// * `indefinite` - Use the indefinite length form
    pub fn begin_container(&mut self, tag: BerTag, indefinite: bool) {
        let tag = BerTag::new(tag.class(), true, tag.number());
        tag.encode_into(&mut self.buffer);

        if indefinite {
            BerLength::Indefinite.encode_into(&mut self.buffer);
            self.open.push(OpenContainer { content_start: None });
        } else {
            self.open.push(OpenContainer {
                content_start: Some(self.buffer.len()),
            });
        }
    }

    /// Close the innermost open container
    ///
    /// # Error Handling
    /// Returns error if no container is open.
    pub fn end_container(&mut self) -> EmberResult<()> {
        let container = self.open.pop().ok_or_else(|| {
            EmberError::BerEncoding("end_container without open container".to_string())
        })?;

        match container.content_start {
            None => self.buffer.extend_from_slice(&[0x00, 0x00]),
            Some(start) => {
                let length = BerLength::new(self.buffer.len() - start).encode();
                self.buffer.splice(start..start, length);
            }
        }

        Ok(())
    }

    /// Number of containers still open
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Get the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Clear the encoder buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.open.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_integer() {
        let mut encoder = BerEncoder::new();
        encoder.encode_integer(12345);
        assert_eq!(encoder.into_bytes(), vec![0x02, 0x02, 0x30, 0x39]);
    }

    #[test]
    fn test_encode_utf8_string() {
        let mut encoder = BerEncoder::new();
        encoder.encode_utf8_string("Gain");
        assert_eq!(encoder.into_bytes(), vec![0x0C, 0x04, b'G', b'a', b'i', b'n']);
    }

    #[test]
    fn test_encode_definite_container() {
        let mut encoder = BerEncoder::new();
        encoder.begin_container(BerTag::universal(true, value::universal::SEQUENCE), false);
        encoder.encode_integer(123);
        encoder.end_container().unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x30, 0x03, 0x02, 0x01, 0x7B]);
    }

    #[test]
    fn test_encode_indefinite_container() {
        let mut encoder = BerEncoder::new();
        encoder.begin_container(BerTag::application(true, 0), true);
        encoder.encode_null();
        encoder.end_container().unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x60, 0x80, 0x05, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_long_container() {
        let mut encoder = BerEncoder::new();
        encoder.begin_container(BerTag::context_specific(true, 1), false);
        encoder.encode_octet_string(&[0xAA; 200]);
        encoder.end_container().unwrap();
        let bytes = encoder.into_bytes();
        // [1] with long-form length 203 (0x81 0xCB), then OCTET STRING with 0x81 0xC8
        assert_eq!(&bytes[..5], &[0xA1, 0x81, 0xCB, 0x04, 0x81]);
        assert_eq!(bytes.len(), 3 + 203);
    }

    #[test]
    fn test_encode_field() {
        let mut encoder = BerEncoder::new();
        encoder.begin_container(BerTag::application(true, 1), false);
        encoder.encode_field(0, &BerValue::Integer(5));
        encoder.encode_field(1, &BerValue::Utf8String("Gain".to_string()));
        encoder.end_container().unwrap();

        // Fields never leave a container open behind them
        assert!(encoder.end_container().is_err());
        assert_eq!(
            encoder.into_bytes(),
            vec![
                0x61, 0x0D, 0xA0, 0x03, 0x02, 0x01, 0x05, 0xA1, 0x06, 0x0C, 0x04, b'G', b'a', b'i',
                b'n'
            ]
        );
    }

    #[test]
    fn test_end_without_begin() {
        let mut encoder = BerEncoder::new();
        assert!(encoder.end_container().is_err());
    }
}
