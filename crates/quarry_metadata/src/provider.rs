//! The provider capability set.

use std::fmt::Debug;

use crate::error::MetadataError;
use crate::id::{MetadataId, MetadataKind};
use crate::service::MetadataService;

/// An artifact the service can cache.
///
/// Equality is structural; the service compares a recomputed item with the
/// previous one to decide whether downstream listeners need to hear about it.
pub trait MetadataItem: Debug + PartialEq {
    /// The identifier this item was computed for.
    fn id(&self) -> &MetadataId;

    /// Returns `false` if an upstream input needed to build the item was
    /// unavailable or itself invalid.
    fn is_valid(&self) -> bool;
}

/// Computes one kind of artifact and reacts to upstream changes.
///
/// Providers hold no per-request state: everything a computation needs is
/// passed in, so a provider can be reentered for a different identifier while
/// an outer computation is still running.
pub trait MetadataProvider<M: MetadataItem> {
    /// The kind of artifact this provider produces.
    fn provides_kind(&self) -> MetadataKind;

    /// Computes the artifact for `id`.
    ///
    /// Returns `Ok(None)` when required upstream input is missing or invalid.
    /// Upstream artifacts are pulled through `service`, which also records the
    /// dependency edges.
    fn get(
        &self,
        id: &MetadataId,
        service: &MetadataService<M>,
    ) -> Result<Option<M>, MetadataError>;

    /// Names the physical declaration artifact that `id` is generated onto.
    fn governor_id(&self, _id: &MetadataId) -> Result<Option<MetadataId>, MetadataError> {
        Ok(None)
    }

    /// Maps a changed upstream identifier to the local identifier to refresh.
    ///
    /// Used when a change travels a class-level edge, where the downstream end
    /// names only this provider's kind.
    fn local_id_for(&self, _upstream: &MetadataId) -> Result<Option<MetadataId>, MetadataError> {
        Ok(None)
    }

    /// Called once when the provider is registered with a service.
    fn activate(&self, _service: &MetadataService<M>) -> Result<(), MetadataError> {
        Ok(())
    }

    /// Called once when the provider is removed from a service.
    fn deactivate(&self, _service: &MetadataService<M>) -> Result<(), MetadataError> {
        Ok(())
    }
}
