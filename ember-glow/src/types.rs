//! Glow data model
//!
//! Plain records filled in by the reader. Every field holds its Glow
//! default until the corresponding field is read; use the
//! [`GlowFieldFlags`](crate::GlowFieldFlags) delivered with a record to tell
//! the two apart.

use ember_ber::BerValue;
use serde::{Deserialize, Serialize};

use crate::error::{EmberError, EmberResult};

/// Value of a parameter, stream entry or tuple
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum GlowValue {
    Integer(i64),
    Real(f64),
    String(String),
    Boolean(bool),
    Octets(#[serde(with = "serde_bytes")] Vec<u8>),
    #[default]
    Null,
}

impl GlowValue {
    /// Convert a decoded universal primitive
    ///
    /// # Error Handling
    /// RELATIVE-OID is not a Glow value type and returns `InvalidData`.
    pub fn from_ber(value: BerValue) -> EmberResult<Self> {
        match value {
            BerValue::Integer(v) => Ok(GlowValue::Integer(v)),
            BerValue::Real(v) => Ok(GlowValue::Real(v)),
            BerValue::Utf8String(v) => Ok(GlowValue::String(v)),
            BerValue::Boolean(v) => Ok(GlowValue::Boolean(v)),
            BerValue::OctetString(v) => Ok(GlowValue::Octets(v)),
            BerValue::Null => Ok(GlowValue::Null),
            BerValue::RelativeOid(_) => Err(EmberError::InvalidData(
                "RELATIVE-OID is not a value type".to_string(),
            )),
        }
    }

    /// Get the parameter type matching this value
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            GlowValue::Integer(_) => ParameterType::Integer,
            GlowValue::Real(_) => ParameterType::Real,
            GlowValue::String(_) => ParameterType::String,
            GlowValue::Boolean(_) => ParameterType::Boolean,
            GlowValue::Octets(_) => ParameterType::Octets,
            GlowValue::Null => ParameterType::Null,
        }
    }
}

/// Minimum or maximum of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum GlowMinMax {
    Integer(i64),
    Real(f64),
    #[default]
    Null,
}

impl GlowMinMax {
    /// Convert a decoded universal primitive
    pub fn from_ber(value: BerValue) -> EmberResult<Self> {
        match value {
            BerValue::Integer(v) => Ok(GlowMinMax::Integer(v)),
            BerValue::Real(v) => Ok(GlowMinMax::Real(v)),
            BerValue::Null => Ok(GlowMinMax::Null),
            other => Err(EmberError::InvalidData(format!(
                "{:?} is not a valid minimum/maximum",
                other
            ))),
        }
    }
}

/// Parameter access rights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i64)]
pub enum ParameterAccess {
    None = 0,
    #[default]
    Read = 1,
    Write = 2,
    ReadWrite = 3,
}

impl ParameterAccess {
    /// Create from the wire value
    #[must_use]
    pub const fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Read),
            2 => Some(Self::Write),
            3 => Some(Self::ReadWrite),
            _ => None,
        }
    }
}

/// Parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i64)]
pub enum ParameterType {
    #[default]
    Null = 0,
    Integer = 1,
    Real = 2,
    String = 3,
    Boolean = 4,
    Trigger = 5,
    Enum = 6,
    Octets = 7,
}

impl ParameterType {
    /// Create from the wire value
    #[must_use]
    pub const fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Null),
            1 => Some(Self::Integer),
            2 => Some(Self::Real),
            3 => Some(Self::String),
            4 => Some(Self::Boolean),
            5 => Some(Self::Trigger),
            6 => Some(Self::Enum),
            7 => Some(Self::Octets),
            _ => None,
        }
    }
}

/// Command number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i64)]
pub enum CommandType {
    Subscribe = 30,
    Unsubscribe = 31,
    #[default]
    GetDirectory = 32,
    Invoke = 33,
}

impl CommandType {
    /// Create from the wire value
    #[must_use]
    pub const fn from_i64(value: i64) -> Option<Self> {
        match value {
            30 => Some(Self::Subscribe),
            31 => Some(Self::Unsubscribe),
            32 => Some(Self::GetDirectory),
            33 => Some(Self::Invoke),
            _ => None,
        }
    }
}

/// Matrix connection topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i64)]
pub enum MatrixType {
    #[default]
    OneToN = 0,
    OneToOne = 1,
    NToN = 2,
}

impl MatrixType {
    /// Create from the wire value
    #[must_use]
    pub const fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::OneToN),
            1 => Some(Self::OneToOne),
            2 => Some(Self::NToN),
            _ => None,
        }
    }
}

/// How matrix signals are numbered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i64)]
pub enum MatrixAddressingMode {
    #[default]
    Linear = 0,
    NonLinear = 1,
}

impl MatrixAddressingMode {
    /// Create from the wire value
    #[must_use]
    pub const fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Linear),
            1 => Some(Self::NonLinear),
            _ => None,
        }
    }
}

/// Requested change of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i64)]
pub enum ConnectionOperation {
    #[default]
    Absolute = 0,
    Connect = 1,
    Disconnect = 2,
}

impl ConnectionOperation {
    /// Create from the wire value
    #[must_use]
    pub const fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Absolute),
            1 => Some(Self::Connect),
            2 => Some(Self::Disconnect),
            _ => None,
        }
    }
}

/// Reported state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i64)]
pub enum ConnectionDisposition {
    #[default]
    Tally = 0,
    Modified = 1,
    Pending = 2,
    Locked = 3,
}

impl ConnectionDisposition {
    /// Create from the wire value
    #[must_use]
    pub const fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Tally),
            1 => Some(Self::Modified),
            2 => Some(Self::Pending),
            3 => Some(Self::Locked),
            _ => None,
        }
    }
}

/// Encoding of a value inside a stream blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i64)]
pub enum StreamFormat {
    #[default]
    UnsignedInt8 = 0,
    UnsignedInt16BigEndian = 2,
    UnsignedInt16LittleEndian = 3,
    UnsignedInt32BigEndian = 4,
    UnsignedInt32LittleEndian = 5,
    UnsignedInt64BigEndian = 6,
    UnsignedInt64LittleEndian = 7,
    SignedInt8 = 8,
    SignedInt16BigEndian = 10,
    SignedInt16LittleEndian = 11,
    SignedInt32BigEndian = 12,
    SignedInt32LittleEndian = 13,
    SignedInt64BigEndian = 14,
    SignedInt64LittleEndian = 15,
    IeeeFloat32BigEndian = 20,
    IeeeFloat32LittleEndian = 21,
    IeeeFloat64BigEndian = 22,
    IeeeFloat64LittleEndian = 23,
}

impl StreamFormat {
    /// Create from the wire value
    #[must_use]
    pub const fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::UnsignedInt8),
            2 => Some(Self::UnsignedInt16BigEndian),
            3 => Some(Self::UnsignedInt16LittleEndian),
            4 => Some(Self::UnsignedInt32BigEndian),
            5 => Some(Self::UnsignedInt32LittleEndian),
            6 => Some(Self::UnsignedInt64BigEndian),
            7 => Some(Self::UnsignedInt64LittleEndian),
            8 => Some(Self::SignedInt8),
            10 => Some(Self::SignedInt16BigEndian),
            11 => Some(Self::SignedInt16LittleEndian),
            12 => Some(Self::SignedInt32BigEndian),
            13 => Some(Self::SignedInt32LittleEndian),
            14 => Some(Self::SignedInt64BigEndian),
            15 => Some(Self::SignedInt64LittleEndian),
            20 => Some(Self::IeeeFloat32BigEndian),
            21 => Some(Self::IeeeFloat32LittleEndian),
            22 => Some(Self::IeeeFloat64BigEndian),
            23 => Some(Self::IeeeFloat64LittleEndian),
            _ => None,
        }
    }

    /// Size of one encoded value in bytes
    pub fn size(self) -> usize {
        match self {
            Self::UnsignedInt8 | Self::SignedInt8 => 1,
            Self::UnsignedInt16BigEndian
            | Self::UnsignedInt16LittleEndian
            | Self::SignedInt16BigEndian
            | Self::SignedInt16LittleEndian => 2,
            Self::UnsignedInt32BigEndian
            | Self::UnsignedInt32LittleEndian
            | Self::SignedInt32BigEndian
            | Self::SignedInt32LittleEndian
            | Self::IeeeFloat32BigEndian
            | Self::IeeeFloat32LittleEndian => 4,
            _ => 8,
        }
    }
}

/// One entry of a parameter's enumeration map
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StringIntegerPair {
    pub name: String,
    pub value: i64,
}

/// Location of a parameter value inside a stream blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamDescription {
    pub format: StreamFormat,
    pub offset: i64,
}

/// Where the parameters of matrix signals live
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParametersLocation {
    #[default]
    None,
    /// Absolute path of the parameters node
    BasePath(Vec<u32>),
    /// Number of the parameters node below the matrix
    Inline(i64),
}

/// Label set of a matrix
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlowLabel {
    pub base_path: Vec<u32>,
    pub description: String,
}

/// Type and name of a function argument or result
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlowTupleItemDescription {
    pub item_type: ParameterType,
    pub name: String,
}

/// Node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlowNode {
    pub number: u32,
    pub identifier: String,
    pub description: String,
    pub is_root: bool,
    pub is_online: bool,
    pub schema_identifiers: String,
    pub template_reference: Vec<u32>,
}

impl Default for GlowNode {
    fn default() -> Self {
        Self {
            number: 0,
            identifier: String::new(),
            description: String::new(),
            is_root: false,
            is_online: true,
            schema_identifiers: String::new(),
            template_reference: Vec::new(),
        }
    }
}

/// Parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlowParameter {
    pub number: u32,
    pub identifier: String,
    pub description: String,
    pub value: GlowValue,
    pub minimum: GlowMinMax,
    pub maximum: GlowMinMax,
    pub access: ParameterAccess,
    pub format: String,
    pub enumeration: String,
    pub factor: i64,
    pub is_online: bool,
    pub formula: String,
    pub step: i64,
    pub default_value: GlowValue,
    pub parameter_type: ParameterType,
    pub stream_identifier: i64,
    pub enum_map: Vec<StringIntegerPair>,
    pub stream_descriptor: StreamDescription,
    pub schema_identifiers: String,
    pub template_reference: Vec<u32>,
}

impl Default for GlowParameter {
    fn default() -> Self {
        Self {
            number: 0,
            identifier: String::new(),
            description: String::new(),
            value: GlowValue::Null,
            minimum: GlowMinMax::Null,
            maximum: GlowMinMax::Null,
            access: ParameterAccess::Read,
            format: String::new(),
            enumeration: String::new(),
            factor: 0,
            is_online: true,
            formula: String::new(),
            step: 0,
            default_value: GlowValue::Null,
            parameter_type: ParameterType::Null,
            stream_identifier: 0,
            enum_map: Vec::new(),
            stream_descriptor: StreamDescription::default(),
            schema_identifiers: String::new(),
            template_reference: Vec::new(),
        }
    }
}

/// Function invocation carried by an `Invoke` command
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlowInvocation {
    pub invocation_id: i64,
    pub arguments: Vec<GlowValue>,
}

/// Command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlowCommand {
    pub number: CommandType,
    /// Requested fields of a `GetDirectory`; all fields (-1) by default
    pub dir_field_mask: i64,
    pub invocation: GlowInvocation,
}

impl Default for GlowCommand {
    fn default() -> Self {
        Self {
            number: CommandType::GetDirectory,
            dir_field_mask: -1,
            invocation: GlowInvocation::default(),
        }
    }
}

/// Stream entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlowStreamEntry {
    pub stream_identifier: i64,
    pub value: GlowValue,
}

/// Matrix
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlowMatrix {
    pub number: u32,
    pub identifier: String,
    pub description: String,
    pub matrix_type: MatrixType,
    pub addressing_mode: MatrixAddressingMode,
    pub target_count: i64,
    pub source_count: i64,
    pub maximum_total_connects: i64,
    pub maximum_connects_per_target: i64,
    pub parameters_location: ParametersLocation,
    pub gain_parameter_number: i64,
    pub labels: Vec<GlowLabel>,
    pub schema_identifiers: String,
    pub template_reference: Vec<u32>,
}

/// Matrix target or source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlowSignal {
    pub number: i64,
}

/// Matrix connection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlowConnection {
    pub target: i64,
    pub sources: Vec<u32>,
    pub operation: ConnectionOperation,
    pub disposition: ConnectionDisposition,
}

/// Function
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlowFunction {
    pub number: u32,
    pub identifier: String,
    pub description: String,
    pub arguments: Vec<GlowTupleItemDescription>,
    pub result: Vec<GlowTupleItemDescription>,
    pub template_reference: Vec<u32>,
}

/// Result of a function invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlowInvocationResult {
    pub invocation_id: i64,
    pub success: bool,
    pub result: Vec<GlowValue>,
}

impl Default for GlowInvocationResult {
    fn default() -> Self {
        Self {
            invocation_id: 0,
            success: true,
            result: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_from_wire() {
        assert_eq!(ParameterAccess::from_i64(3), Some(ParameterAccess::ReadWrite));
        assert_eq!(ParameterAccess::from_i64(4), None);
        assert_eq!(CommandType::from_i64(32), Some(CommandType::GetDirectory));
        assert_eq!(CommandType::from_i64(0), None);
        assert_eq!(StreamFormat::from_i64(1), None);
        assert_eq!(StreamFormat::from_i64(22).map(StreamFormat::size), Some(8));
    }

    #[test]
    fn test_defaults() {
        assert!(GlowNode::default().is_online);
        assert_eq!(GlowParameter::default().access, ParameterAccess::Read);
        assert!(GlowInvocationResult::default().success);
        assert_eq!(GlowCommand::default().dir_field_mask, -1);
    }

    #[test]
    fn test_value_from_ber() {
        assert_eq!(
            GlowValue::from_ber(BerValue::Utf8String("Gain".to_string())).unwrap(),
            GlowValue::String("Gain".to_string())
        );
        assert!(GlowValue::from_ber(BerValue::RelativeOid(vec![1])).is_err());
        assert_eq!(GlowValue::Real(1.0).parameter_type(), ParameterType::Real);
        assert!(GlowMinMax::from_ber(BerValue::Boolean(true)).is_err());
    }
}
