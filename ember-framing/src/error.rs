//! Error types for the framing layer

pub use ember_core::error::{EmberError, EmberResult};
