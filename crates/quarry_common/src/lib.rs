//! Shared foundational types used across the quarry code generator.
//!
//! This crate provides content hashing for change detection and the internal
//! error type used to report broken invariants.

#![warn(missing_docs)]

pub mod hash;
pub mod result;

pub use hash::ContentHash;
pub use result::{InternalError, QuarryResult};
