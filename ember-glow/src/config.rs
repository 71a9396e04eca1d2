//! Reader configuration and builder
//!
//! # Usage Example
//!
//! ```rust
//! use ember_glow::{GlowEventCollector, GlowReaderBuilder, PathConvention};
//!
//! let reader = GlowReaderBuilder::new()
//!     .path_convention(PathConvention::Exclusive)
//!     .max_tree_depth(16)
//!     .build(GlowEventCollector::new())
//!     .unwrap();
//! assert_eq!(reader.config().max_tree_depth, 16);
//! ```

use ember_ber::BerReaderConfig;
use ember_core::limits::GLOW_MAX_TREE_DEPTH;
use serde::{Deserialize, Serialize};

use crate::error::{EmberError, EmberResult};
use crate::framed::GlowReader;
use crate::handler::GlowHandler;
use crate::reader::NonFramingGlowReader;

/// Smallest reassembly buffer accepted by the builder
///
/// One EmBER package header plus checksum and a few payload bytes.
pub const MIN_BUFFER_SIZE: usize = 32;

/// Whether an element's own number ends the path delivered with it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PathConvention {
    /// `[.., parent, own]`, the same form as a qualified path
    #[default]
    Inclusive,
    /// `[.., parent]`; the own number is only in the record
    Exclusive,
}

/// Glow reader configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlowReaderConfig {
    /// Maximum path length
    pub max_tree_depth: usize,
    /// Layout of element paths
    pub path_convention: PathConvention,
    /// Limits of the underlying BER reader
    pub ber: BerReaderConfig,
}

impl Default for GlowReaderConfig {
    fn default() -> Self {
        Self {
            max_tree_depth: GLOW_MAX_TREE_DEPTH,
            path_convention: PathConvention::default(),
            ber: BerReaderConfig::default(),
        }
    }
}

/// Builder for Glow readers
///
/// # Default Settings
/// - Max tree depth: 64
/// - Path convention: inclusive
/// - BER limits: [`BerReaderConfig::default`]
#[derive(Debug, Clone, Default)]
pub struct GlowReaderBuilder {
    config: GlowReaderConfig,
}

impl GlowReaderBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: GlowReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum path length
    pub fn max_tree_depth(mut self, depth: usize) -> Self {
        self.config.max_tree_depth = depth;
        self
    }

    /// Set the element path layout
    pub fn path_convention(mut self, convention: PathConvention) -> Self {
        self.config.path_convention = convention;
        self
    }

    /// Set the maximum BER container nesting
    pub fn max_ber_depth(mut self, depth: usize) -> Self {
        self.config.ber.max_depth = depth;
        self
    }

    /// Set the maximum size of a single primitive value
    pub fn max_item_length(mut self, length: usize) -> Self {
        self.config.ber.max_item_length = length;
        self
    }

    fn validate(&self) -> EmberResult<()> {
        if self.config.max_tree_depth == 0 {
            return Err(EmberError::InvalidData(
                "Tree depth must be at least 1".to_string(),
            ));
        }
        if self.config.ber.max_depth == 0 {
            return Err(EmberError::InvalidData(
                "BER depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build a reader for unframed BER data
    ///
    /// # Errors
    /// Returns error if a depth limit is zero.
    pub fn build<H: GlowHandler>(self, handler: H) -> EmberResult<NonFramingGlowReader<H>> {
        self.validate()?;
        Ok(NonFramingGlowReader::with_config(handler, self.config))
    }

    /// Build a reader for S101 framed data
    ///
    /// # Arguments
    /// * `handler` - Application callbacks
    /// * `buffer` - Reassembly buffer; must hold the largest expected message
    ///
    /// # Errors
    /// Returns error if a depth limit is zero or the buffer is smaller than
    /// [`MIN_BUFFER_SIZE`].
    pub fn build_framed<H, B>(self, handler: H, buffer: B) -> EmberResult<GlowReader<H, B>>
    where
        H: GlowHandler,
        B: AsRef<[u8]> + AsMut<[u8]>,
    {
        self.validate()?;
        let capacity = buffer.as_ref().len();
        if capacity < MIN_BUFFER_SIZE {
            return Err(EmberError::InvalidData(format!(
                "Reassembly buffer of {} bytes is smaller than {}",
                capacity, MIN_BUFFER_SIZE
            )));
        }
        Ok(GlowReader::with_config(handler, buffer, self.config))
    }
}
