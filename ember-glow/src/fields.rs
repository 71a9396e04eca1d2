//! Field-presence flags

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Set of optional record fields that were present on the wire
///
/// Mandatory fields (element and signal numbers, command number, connection
/// target, invocation id) carry no flag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GlowFieldFlags(u64);

impl GlowFieldFlags {
    pub const IDENTIFIER: Self = Self(1 << 0);
    pub const DESCRIPTION: Self = Self(1 << 1);
    pub const IS_ROOT: Self = Self(1 << 2);
    pub const IS_ONLINE: Self = Self(1 << 3);
    pub const ACCESS: Self = Self(1 << 4);
    pub const FORMAT: Self = Self(1 << 5);
    pub const ENUMERATION: Self = Self(1 << 6);
    pub const FACTOR: Self = Self(1 << 7);
    pub const FORMULA: Self = Self(1 << 8);
    pub const STEP: Self = Self(1 << 9);
    pub const DEFAULT: Self = Self(1 << 10);
    pub const TYPE: Self = Self(1 << 11);
    pub const STREAM_IDENTIFIER: Self = Self(1 << 12);
    pub const SCHEMA_IDENTIFIERS: Self = Self(1 << 13);
    pub const TEMPLATE_REFERENCE: Self = Self(1 << 14);
    pub const VALUE: Self = Self(1 << 16);
    pub const MINIMUM: Self = Self(1 << 17);
    pub const MAXIMUM: Self = Self(1 << 18);
    pub const STREAM_DESCRIPTOR: Self = Self(1 << 19);
    pub const ENUM_MAP: Self = Self(1 << 20);

    // Matrix contents
    pub const MATRIX_TYPE: Self = Self(1 << 21);
    pub const ADDRESSING_MODE: Self = Self(1 << 22);
    pub const TARGET_COUNT: Self = Self(1 << 23);
    pub const SOURCE_COUNT: Self = Self(1 << 24);
    pub const MAXIMUM_TOTAL_CONNECTS: Self = Self(1 << 25);
    pub const MAXIMUM_CONNECTS_PER_TARGET: Self = Self(1 << 26);
    pub const PARAMETERS_LOCATION: Self = Self(1 << 27);
    pub const GAIN_PARAMETER_NUMBER: Self = Self(1 << 28);
    pub const LABELS: Self = Self(1 << 29);

    // Function contents, invocation result
    pub const ARGUMENTS: Self = Self(1 << 30);
    pub const RESULT: Self = Self(1 << 31);

    // Connection
    pub const SOURCES: Self = Self(1 << 32);
    pub const OPERATION: Self = Self(1 << 33);
    pub const DISPOSITION: Self = Self(1 << 34);

    // Command
    pub const DIR_FIELD_MASK: Self = Self(1 << 35);
    pub const INVOCATION: Self = Self(1 << 36);

    // Invocation result
    pub const SUCCESS: Self = Self(1 << 37);

    /// No field present
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Create from raw bits
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Get raw bits
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Check if every flag of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the flags of `other`
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Check if no flag is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for GlowFieldFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for GlowFieldFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for GlowFieldFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlowFieldFlags(0x{:X})", self.0)
    }
}
