//! Core types and utilities for the Ember+ protocol
//!
//! This crate provides the error type and the protocol-wide limits shared by
//! the BER, framing and Glow layers of the Ember+ implementation.

pub mod error;
pub mod limits;

pub use error::{EmberError, EmberResult};
pub use limits::{EMBER_MAX_TREE_DEPTH, GLOW_MAX_TREE_DEPTH, MAX_ITEM_LENGTH};
