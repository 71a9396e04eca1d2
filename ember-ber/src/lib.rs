//! BER (Basic Encoding Rules) processing for the Ember+ protocol
//!
//! Ember+ payloads are ASN.1 values encoded with BER. Each value is a TLV
//! (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```
//! - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
//! - P = Primitive (0) or Constructed (1)
//! - TTTTT = Tag number (0-30), or 11111 followed by base-128 continuation bytes
//!
//! ## Length Encoding
//!
//! - **Short form**: one byte, 0-127
//! - **Long form**: `0x80 | n` followed by `n` big-endian length bytes
//! - **Indefinite form**: `0x80`, terminated by the end-of-contents TLV `00 00`
//!   (constructed values only)
//!
//! # Modules
//!
//! - [`types`]: tag and length codec
//! - [`value`]: universal primitive values (BOOLEAN, INTEGER, REAL, ...)
//! - [`encoder`]: writer side
//! - [`reader`]: incremental structural reader that can be fed one byte at a
//!   time and reports containers and items as soon as they complete

pub mod encoder;
pub mod error;
pub mod reader;
pub mod types;
pub mod value;

pub use encoder::BerEncoder;
pub use error::{EmberError, EmberResult};
pub use reader::{BerHandler, BerItem, BerReader, BerReaderConfig};
pub use types::{BerLength, BerTag, BerTagClass, DecodeStatus};
pub use value::{BerValue, universal};
