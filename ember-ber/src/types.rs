//! BER encoding types (Tag, Length, etc.)

use crate::error::{EmberError, EmberResult};
use std::fmt;

/// Outcome of a decode step that may run out of input
///
/// Running out of bytes in the middle of a tag or length is the normal
/// "feed me more" signal of the incremental reader, so it is reported as a
/// status rather than as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus<T> {
    /// The value is complete and `consumed` bytes were used
    Ready { value: T, consumed: usize },
    /// The buffer ends before the value is complete
    NeedMore,
}

impl<T> DecodeStatus<T> {
    /// Check if the value is complete
    pub fn is_ready(&self) -> bool {
        matches!(self, DecodeStatus::Ready { .. })
    }

    /// Convert into `(value, consumed)` if complete
    pub fn ready(self) -> Option<(T, usize)> {
        match self {
            DecodeStatus::Ready { value, consumed } => Some((value, consumed)),
            DecodeStatus::NeedMore => None,
        }
    }
}

/// BER Tag Class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (INTEGER, UTF8String, etc.)
/// - **Application**: Application-specific types (Glow element types)
/// - **Context-specific**: Context-dependent types (fields of a SEQUENCE/SET)
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerTagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl BerTagClass {
    /// Get tag class from bits (bits 7-6 of tag byte)
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => BerTagClass::Universal,
            1 => BerTagClass::Application,
            2 => BerTagClass::ContextSpecific,
            _ => BerTagClass::Private,
        }
    }

    /// Convert tag class to bits (for encoding)
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }

    fn prefix(self) -> char {
        match self {
            BerTagClass::Universal => 'U',
            BerTagClass::Application => 'A',
            BerTagClass::ContextSpecific => 'C',
            BerTagClass::Private => 'P',
        }
    }
}

/// BER Tag
///
/// A BER tag identifies the type of an ASN.1 value. It consists of:
/// - **Class**: Universal, Application, Context-specific, or Private
/// - **Constructed/Primitive**: Whether the value contains nested TLVs
/// - **Tag Number**: The actual tag number (0-30 for short form, or extended)
///
/// # Encoding Format
///
/// Short form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// Extended form (tag number > 30):
/// ```text
/// First byte:  C C P 1 1 1 1 1  (all tag bits set to 1)
/// Following bytes: 1 T T T T T T T  (continuation bytes, last byte has bit 7 = 0)
/// ```
///
/// Two tags denote the same type when class and number agree; see
/// [`BerTag::matches`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BerTag {
    /// Tag class
    class: BerTagClass,
    /// Whether this is a constructed type
    constructed: bool,
    /// Tag number
    number: u32,
}

impl BerTag {
    /// The end-of-contents marker closing an indefinite-length container
    pub const END_OF_CONTENTS: BerTag = BerTag {
        class: BerTagClass::Universal,
        constructed: false,
        number: 0,
    };

    /// Maximum number of continuation bytes of an extended tag number
    pub const MAX_NUMBER_BYTES: usize = 5;

    /// Maximum encoded size of a tag
    pub const MAX_ENCODED_LEN: usize = 1 + Self::MAX_NUMBER_BYTES;

    /// Create a new BER tag
    ///
    /// # Arguments
    /// * `class` - Tag class
    /// * `constructed` - Whether this is a constructed type
    /// * `number` - Tag number
    pub const fn new(class: BerTagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    /// Create a Universal class tag
    pub const fn universal(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Universal, constructed, number)
    }

    /// Create an Application class tag
    pub const fn application(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Application, constructed, number)
    }

    /// Create a Context-specific class tag
    pub const fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::ContextSpecific, constructed, number)
    }

    /// Create a Private class tag
    pub const fn private(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Private, constructed, number)
    }

    /// Get tag class
    pub fn class(&self) -> BerTagClass {
        self.class
    }

    /// Check if tag is constructed
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Get tag number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Check if both tags have the same class and number
    ///
    /// The constructed flag describes the encoding, not the type, and is
    /// ignored.
    pub fn matches(&self, other: &BerTag) -> bool {
        self.class == other.class && self.number == other.number
    }

    /// Check if this is a context-specific tag with the given number
    pub fn is_context(&self, number: u32) -> bool {
        self.class == BerTagClass::ContextSpecific && self.number == number
    }

    /// Check if this is an application tag with the given number
    pub fn is_application(&self, number: u32) -> bool {
        self.class == BerTagClass::Application && self.number == number
    }

    /// Check if this is a universal tag with the given number
    pub fn is_universal(&self, number: u32) -> bool {
        self.class == BerTagClass::Universal && self.number == number
    }

    /// Check if this is the end-of-contents marker tag
    pub fn is_end_of_contents(&self) -> bool {
        *self == Self::END_OF_CONTENTS
    }

    /// Encode tag to bytes
    ///
    /// # Encoding Strategy
    /// - If tag number <= 30: Use short form (1 byte)
    /// - If tag number > 30: Use extended form (multiple bytes)
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(6);
        self.encode_into(&mut result);
        result
    }

    /// Append the encoded tag to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        // Build first byte: class (2 bits) + constructed (1 bit) + tag (5 bits)
        let class_bits = self.class.to_bits();
        let constructed_bit = if self.constructed { 0x20 } else { 0x00 };

        if self.number <= 30 {
            out.push(class_bits | constructed_bit | (self.number as u8 & 0x1F));
            return;
        }

        out.push(class_bits | constructed_bit | 0x1F);

        // Encode tag number in continuation bytes
        let mut remaining = self.number;
        let mut bytes = Vec::with_capacity(5);
        while remaining > 0 {
            bytes.push((remaining & 0x7F) as u8);
            remaining >>= 7;
        }

        // Reverse bytes and set continuation bit (bit 7) on all but last
        let last = bytes.len() - 1;
        for (i, &byte) in bytes.iter().rev().enumerate() {
            if i < last {
                out.push(byte | 0x80);
            } else {
                out.push(byte);
            }
        }
    }

    /// Decode tag from bytes
    ///
    /// # Returns
    /// - `Ok(DecodeStatus::Ready { .. })` with the tag and the number of bytes used
    /// - `Ok(DecodeStatus::NeedMore)` if `data` ends inside the tag
    ///
    /// # Error Handling
    /// Returns error if the tag number does not fit into 32 bits.
    pub fn decode(data: &[u8]) -> EmberResult<DecodeStatus<Self>> {
        let Some(&first_byte) = data.first() else {
            return Ok(DecodeStatus::NeedMore);
        };

        let class = BerTagClass::from_bits(first_byte);
        let constructed = (first_byte & 0x20) != 0;
        let tag_bits = first_byte & 0x1F;

        if tag_bits < 31 {
            return Ok(DecodeStatus::Ready {
                value: Self::new(class, constructed, tag_bits as u32),
                consumed: 1,
            });
        }

        // Extended form: read continuation bytes
        let mut tag_number = 0u32;
        for (index, &byte) in data.iter().enumerate().skip(1) {
            if tag_number > (u32::MAX >> 7) {
                return Err(EmberError::BerDecoding(
                    "Tag number too large or invalid encoding".to_string(),
                ));
            }
            tag_number = (tag_number << 7) | ((byte & 0x7F) as u32);

            if (byte & 0x80) == 0 {
                return Ok(DecodeStatus::Ready {
                    value: Self::new(class, constructed, tag_number),
                    consumed: index + 1,
                });
            }
            if index == Self::MAX_NUMBER_BYTES {
                return Err(EmberError::BerDecoding(format!(
                    "Tag number longer than {} bytes",
                    Self::MAX_NUMBER_BYTES
                )));
            }
        }

        Ok(DecodeStatus::NeedMore)
    }
}

impl fmt::Display for BerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.class.prefix(), self.number)
    }
}

/// BER Length encoding
///
/// # Encoding Format
///
/// Short form (lengths 0-127):
/// ```text
/// Byte: 0 L L L L L L L
/// ```
///
/// Long form:
/// ```text
/// First byte:  1 N N N N N N N  (N = number of length bytes, 1-4)
/// Following bytes: L L L L L L L L  (big-endian length value)
/// ```
///
/// Indefinite form: the single byte `0x80`. The container ends with an
/// end-of-contents TLV (`00 00`). Only constructed values may use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerLength {
    /// Explicit number of content bytes
    Definite(usize),
    /// Content terminated by an end-of-contents marker
    Indefinite,
}

impl BerLength {
    /// Maximum number of bytes following a long-form length prefix
    pub const MAX_LENGTH_BYTES: usize = 4;

    /// Create a definite length
    pub fn new(length: usize) -> Self {
        BerLength::Definite(length)
    }

    /// Get the definite length value, if any
    pub fn definite(&self) -> Option<usize> {
        match self {
            BerLength::Definite(length) => Some(*length),
            BerLength::Indefinite => None,
        }
    }

    /// Check if this is the indefinite form
    pub fn is_indefinite(&self) -> bool {
        matches!(self, BerLength::Indefinite)
    }

    /// Encode length to bytes
    ///
    /// Definite lengths use the short form when possible and the minimal
    /// long form otherwise.
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(5);
        self.encode_into(&mut result);
        result
    }

    /// Append the encoded length to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match *self {
            BerLength::Indefinite => out.push(0x80),
            BerLength::Definite(length) if length < 0x80 => out.push(length as u8),
            BerLength::Definite(length) => {
                let mut num_bytes = 0;
                let mut temp = length;
                while temp > 0 {
                    num_bytes += 1;
                    temp >>= 8;
                }

                out.push(0x80 | (num_bytes as u8));
                for i in (0..num_bytes).rev() {
                    out.push(((length >> (i * 8)) & 0xFF) as u8);
                }
            }
        }
    }

    /// Decode length from bytes
    ///
    /// # Returns
    /// - `Ok(DecodeStatus::Ready { .. })` with the length and the number of bytes used
    /// - `Ok(DecodeStatus::NeedMore)` if `data` ends inside the length
    ///
    /// # Error Handling
    /// Returns error if:
    /// - The reserved first byte `0xFF` is used
    /// - The long form uses more than [`Self::MAX_LENGTH_BYTES`] bytes
    pub fn decode(data: &[u8]) -> EmberResult<DecodeStatus<Self>> {
        let Some(&first_byte) = data.first() else {
            return Ok(DecodeStatus::NeedMore);
        };

        if (first_byte & 0x80) == 0 {
            return Ok(DecodeStatus::Ready {
                value: BerLength::Definite(first_byte as usize),
                consumed: 1,
            });
        }

        if first_byte == 0x80 {
            return Ok(DecodeStatus::Ready {
                value: BerLength::Indefinite,
                consumed: 1,
            });
        }

        if first_byte == 0xFF {
            return Err(EmberError::BerDecoding(
                "Reserved length octet 0xFF".to_string(),
            ));
        }

        let num_bytes = (first_byte & 0x7F) as usize;
        if num_bytes > Self::MAX_LENGTH_BYTES {
            return Err(EmberError::BerDecoding(format!(
                "Length encoding too large: {} bytes (max {})",
                num_bytes,
                Self::MAX_LENGTH_BYTES
            )));
        }

        if data.len() < 1 + num_bytes {
            return Ok(DecodeStatus::NeedMore);
        }

        let length = data[1..=num_bytes]
            .iter()
            .fold(0usize, |acc, &byte| (acc << 8) | byte as usize);

        Ok(DecodeStatus::Ready {
            value: BerLength::Definite(length),
            consumed: 1 + num_bytes,
        })
    }
}

impl fmt::Display for BerLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BerLength::Definite(length) => write!(f, "{}", length),
            BerLength::Indefinite => write!(f, "indefinite"),
        }
    }
}
