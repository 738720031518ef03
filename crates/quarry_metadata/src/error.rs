//! Error types for metadata computation.

use quarry_common::InternalError;

use crate::id::MetadataId;

/// Errors raised by the metadata service and its providers.
///
/// A provider that merely lacks upstream input does not error; it yields no
/// artifact. Every variant here is fatal for the request that raised it.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// A broken wiring invariant, such as decoding an identifier of the wrong kind.
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// No provider is registered for the identifier's kind.
    #[error("no metadata provider registered for kind '{kind}'")]
    UnknownKind {
        /// The kind name that was requested.
        kind: String,
    },

    /// A provider for the kind is already registered.
    #[error("a metadata provider for kind '{kind}' is already registered")]
    DuplicateProvider {
        /// The duplicated kind name.
        kind: String,
    },

    /// Registering the edge would close a cycle in the dependency graph.
    #[error("dependency {upstream} -> {downstream} would create a cycle")]
    Cycle {
        /// The upstream end of the rejected edge.
        upstream: MetadataId,
        /// The downstream end of the rejected edge.
        downstream: MetadataId,
    },

    /// An identifier was requested while its own computation was in progress.
    #[error("reentrant request for {id} (in flight: {})", format_chain(.chain))]
    Reentrant {
        /// The identifier requested twice.
        id: MetadataId,
        /// The identifiers being computed when the request arrived, outermost first.
        chain: Vec<MetadataId>,
    },

    /// A provider failed for a reason outside the metadata layer, e.g. file I/O.
    #[error("provider failed computing {id}: {source}")]
    Provider {
        /// The identifier being computed.
        id: MetadataId,
        /// The underlying failure.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl MetadataError {
    /// Wraps an arbitrary provider failure for `id`.
    pub fn provider(
        id: &MetadataId,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Provider {
            id: id.clone(),
            source: source.into(),
        }
    }
}

fn format_chain(chain: &[MetadataId]) -> String {
    chain
        .iter()
        .map(MetadataId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
