//! Glow DTD tag numbers
//!
//! Element types are APPLICATION tags; fields inside an element, its
//! contents or any other record are CONTEXT tags wrapping a universal value.

/// APPLICATION tag numbers
pub mod app {
    pub const ROOT: u32 = 0;
    pub const PARAMETER: u32 = 1;
    pub const COMMAND: u32 = 2;
    pub const NODE: u32 = 3;
    pub const ELEMENT_COLLECTION: u32 = 4;
    pub const STREAM_ENTRY: u32 = 5;
    pub const STREAM_COLLECTION: u32 = 6;
    pub const STRING_INTEGER_PAIR: u32 = 7;
    pub const STRING_INTEGER_COLLECTION: u32 = 8;
    pub const QUALIFIED_PARAMETER: u32 = 9;
    pub const QUALIFIED_NODE: u32 = 10;
    pub const ROOT_ELEMENT_COLLECTION: u32 = 11;
    pub const STREAM_DESCRIPTION: u32 = 12;
    pub const MATRIX: u32 = 13;
    pub const TARGET: u32 = 14;
    pub const SOURCE: u32 = 15;
    pub const CONNECTION: u32 = 16;
    pub const QUALIFIED_MATRIX: u32 = 17;
    pub const LABEL: u32 = 18;
    pub const FUNCTION: u32 = 19;
    pub const QUALIFIED_FUNCTION: u32 = 20;
    pub const TUPLE_ITEM_DESCRIPTION: u32 = 21;
    pub const INVOCATION: u32 = 22;
    pub const INVOCATION_RESULT: u32 = 23;
    pub const TEMPLATE: u32 = 24;
    pub const QUALIFIED_TEMPLATE: u32 = 25;
}

/// Fields shared by all tree elements
pub mod element {
    /// `number` (Integer32) or `path` (RELATIVE-OID) when qualified
    pub const NUMBER: u32 = 0;
    pub const CONTENTS: u32 = 1;
    pub const CHILDREN: u32 = 2;
    /// Matrix only
    pub const TARGETS: u32 = 3;
    /// Matrix only
    pub const SOURCES: u32 = 4;
    /// Matrix only
    pub const CONNECTIONS: u32 = 5;
}

/// Every collection item is wrapped in `[0]`
pub const COLLECTION_ITEM: u32 = 0;

pub mod node_contents {
    pub const IDENTIFIER: u32 = 0;
    pub const DESCRIPTION: u32 = 1;
    pub const IS_ROOT: u32 = 2;
    pub const IS_ONLINE: u32 = 3;
    pub const SCHEMA_IDENTIFIERS: u32 = 4;
    pub const TEMPLATE_REFERENCE: u32 = 5;
}

pub mod parameter_contents {
    pub const IDENTIFIER: u32 = 0;
    pub const DESCRIPTION: u32 = 1;
    pub const VALUE: u32 = 2;
    pub const MINIMUM: u32 = 3;
    pub const MAXIMUM: u32 = 4;
    pub const ACCESS: u32 = 5;
    pub const FORMAT: u32 = 6;
    pub const ENUMERATION: u32 = 7;
    pub const FACTOR: u32 = 8;
    pub const IS_ONLINE: u32 = 9;
    pub const FORMULA: u32 = 10;
    pub const STEP: u32 = 11;
    pub const DEFAULT: u32 = 12;
    pub const TYPE: u32 = 13;
    pub const STREAM_IDENTIFIER: u32 = 14;
    pub const ENUM_MAP: u32 = 15;
    pub const STREAM_DESCRIPTOR: u32 = 16;
    pub const SCHEMA_IDENTIFIERS: u32 = 17;
    pub const TEMPLATE_REFERENCE: u32 = 18;
}

pub mod command {
    pub const NUMBER: u32 = 0;
    pub const DIR_FIELD_MASK: u32 = 1;
    pub const INVOCATION: u32 = 2;
}

pub mod invocation {
    pub const INVOCATION_ID: u32 = 0;
    pub const ARGUMENTS: u32 = 1;
}

pub mod stream_entry {
    pub const STREAM_IDENTIFIER: u32 = 0;
    pub const VALUE: u32 = 1;
}

pub mod string_integer_pair {
    pub const ENTRY_STRING: u32 = 0;
    pub const ENTRY_INTEGER: u32 = 1;
}

pub mod stream_description {
    pub const FORMAT: u32 = 0;
    pub const OFFSET: u32 = 1;
}

pub mod matrix_contents {
    pub const IDENTIFIER: u32 = 0;
    pub const DESCRIPTION: u32 = 1;
    pub const TYPE: u32 = 2;
    pub const ADDRESSING_MODE: u32 = 3;
    pub const TARGET_COUNT: u32 = 4;
    pub const SOURCE_COUNT: u32 = 5;
    pub const MAXIMUM_TOTAL_CONNECTS: u32 = 6;
    pub const MAXIMUM_CONNECTS_PER_TARGET: u32 = 7;
    pub const PARAMETERS_LOCATION: u32 = 8;
    pub const GAIN_PARAMETER_NUMBER: u32 = 9;
    pub const LABELS: u32 = 10;
    pub const SCHEMA_IDENTIFIERS: u32 = 11;
    pub const TEMPLATE_REFERENCE: u32 = 12;
}

pub mod label {
    pub const BASE_PATH: u32 = 0;
    pub const DESCRIPTION: u32 = 1;
}

/// Target and Source
pub mod signal {
    pub const NUMBER: u32 = 0;
}

pub mod connection {
    pub const TARGET: u32 = 0;
    pub const SOURCES: u32 = 1;
    pub const OPERATION: u32 = 2;
    pub const DISPOSITION: u32 = 3;
}

pub mod function_contents {
    pub const IDENTIFIER: u32 = 0;
    pub const DESCRIPTION: u32 = 1;
    pub const ARGUMENTS: u32 = 2;
    pub const RESULT: u32 = 3;
    pub const TEMPLATE_REFERENCE: u32 = 4;
}

pub mod tuple_item_description {
    pub const TYPE: u32 = 0;
    pub const NAME: u32 = 1;
}

pub mod invocation_result {
    pub const INVOCATION_ID: u32 = 0;
    pub const SUCCESS: u32 = 1;
    pub const RESULT: u32 = 2;
}
