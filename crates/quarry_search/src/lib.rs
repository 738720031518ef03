//! Search integration for annotated entity types.
//!
//! Types carrying the searchable annotation get indexing and search members
//! synthesized onto them; controllers carrying the web-searchable annotation
//! get search endpoints and a generated search view. Everything is computed
//! on demand through a [`MetadataService`](quarry_metadata::MetadataService)
//! and recomputed when upstream declarations change.
//!
//! [`Project`] wires the providers to a project on disk and exposes the
//! `setup`, `add`, `add_all` and `generate` operations.

#![warn(missing_docs)]

pub mod accessors;
pub mod annotations;
pub mod artifact;
pub mod error;
pub mod facts;
pub mod operations;
pub mod options;
pub mod project;
pub mod search;
pub mod store;
pub mod synthesis;
pub mod view;
pub mod web_search;

pub use artifact::{Artifact, Payload};
pub use error::{OptionsError, SearchError};
pub use operations::{SetupOptions, DEFAULT_PORT};
pub use options::{HookSetting, SearchHooks, SearchOptions, WebSearchOptions};
pub use project::{GenerateReport, Project};
pub use store::TypeStore;
