//! Protocol-wide limits
//!
//! Both readers keep their stacks in fixed-capacity storage sized from these
//! constants, so a decoder instance never grows past them no matter what the
//! remote side sends.

/// Maximum number of entries in a Glow path (tree depth).
pub const GLOW_MAX_TREE_DEPTH: usize = 64;

/// Maximum number of nested BER containers.
///
/// Each Glow tree level is wrapped in four containers
/// (`[0]`, element, `children [2]`, `ElementCollection`), plus the root
/// envelope and the deepest contents/field/sub-record nesting of a leaf.
pub const EMBER_MAX_TREE_DEPTH: usize = 4 * GLOW_MAX_TREE_DEPTH + 12;

/// Maximum size in bytes of a single primitive value buffered by the reader.
pub const MAX_ITEM_LENGTH: usize = 64 * 1024;
