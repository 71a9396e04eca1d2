//! Glow DTD decoding for the Ember+ protocol
//!
//! Glow is the Ember+ object model: a tree of nodes, parameters, matrices
//! and functions, plus commands, stream entries and invocation results.
//! This crate turns BER (optionally inside S101 frames) into typed Glow
//! records, delivered to a [`GlowHandler`] as soon as each one completes.
//!
//! # Readers
//!
//! - [`NonFramingGlowReader`]: unframed BER input, e.g. from a file
//! - [`GlowReader`]: raw S101 link bytes, with multi-package reassembly
//!
//! Both accept input in arbitrary chunks, down to one byte at a time, and
//! produce the same callbacks for every chunking.
//!
//! # Modules
//!
//! - [`types`]: decoded records and Glow enumerations
//! - [`fields`]: presence flags of optional fields
//! - [`handler`]: application callbacks and an event recorder
//! - [`config`]: reader limits, path convention and builder
//! - [`tags`]: Glow DTD tag numbers

pub mod config;
pub mod error;
pub mod fields;
pub mod framed;
pub mod handler;
pub mod path;
pub mod reader;
pub mod tags;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{GlowReaderBuilder, GlowReaderConfig, MIN_BUFFER_SIZE, PathConvention};
pub use error::{EmberError, EmberResult};
pub use fields::GlowFieldFlags;
pub use framed::GlowReader;
pub use handler::{GlowEvent, GlowEventCollector, GlowHandler, GlowReaderPosition, UnsupportedField};
pub use path::GlowPath;
pub use reader::NonFramingGlowReader;
pub use types::*;
