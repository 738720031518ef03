//! Incremental, dependency-tracked metadata computation.
//!
//! Derived artifacts are named by [`MetadataId`]s, computed on demand by
//! [`MetadataProvider`]s, memoized by the [`MetadataService`], and kept fresh
//! through the [`DependencyRegistry`]: when an upstream artifact changes, each
//! registered downstream artifact is evicted, recomputed once, and only
//! propagates further if its new value differs from the cached one.

#![warn(missing_docs)]

pub mod error;
pub mod id;
pub mod provider;
pub mod registry;
pub mod service;

pub use error::MetadataError;
pub use id::{InstanceParts, MetadataId, MetadataKind};
pub use provider::{MetadataItem, MetadataProvider};
pub use registry::DependencyRegistry;
pub use service::{MetadataService, ServiceStats};
