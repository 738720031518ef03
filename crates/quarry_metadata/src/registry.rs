//! The dependency registry: upstream identifier to downstream identifiers.

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};

use crate::error::MetadataError;
use crate::id::MetadataId;

/// A directed graph of "when upstream changes, downstream must be refreshed".
///
/// Edges are kept in both directions. Iteration order is registration order,
/// which makes notification order deterministic.
#[derive(Debug, Default)]
pub struct DependencyRegistry {
    downstream: IndexMap<MetadataId, IndexSet<MetadataId>>,
    upstream: IndexMap<MetadataId, IndexSet<MetadataId>>,
}

impl DependencyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `upstream -> downstream`.
    ///
    /// Returns `Ok(false)` if the edge already existed. Self-loops and edges
    /// that would close a cycle are rejected.
    pub fn register(
        &mut self,
        upstream: &MetadataId,
        downstream: &MetadataId,
    ) -> Result<bool, MetadataError> {
        if self.contains(upstream, downstream) {
            return Ok(false);
        }
        if upstream == downstream || self.reaches(downstream, upstream) {
            return Err(MetadataError::Cycle {
                upstream: upstream.clone(),
                downstream: downstream.clone(),
            });
        }
        self.downstream
            .entry(upstream.clone())
            .or_default()
            .insert(downstream.clone());
        self.upstream
            .entry(downstream.clone())
            .or_default()
            .insert(upstream.clone());
        tracing::trace!(%upstream, %downstream, "registered dependency");
        Ok(true)
    }

    /// Removes `upstream -> downstream`. Returns `true` if the edge existed.
    pub fn deregister(&mut self, upstream: &MetadataId, downstream: &MetadataId) -> bool {
        let removed = remove_edge(&mut self.downstream, upstream, downstream);
        remove_edge(&mut self.upstream, downstream, upstream);
        if removed {
            tracing::trace!(%upstream, %downstream, "deregistered dependency");
        }
        removed
    }

    /// Removes every edge touching `id`, in either direction.
    pub fn deregister_all(&mut self, id: &MetadataId) {
        for down in self.downstream(id) {
            self.deregister(id, &down);
        }
        for up in self.upstream(id) {
            self.deregister(&up, id);
        }
    }

    /// Returns the identifiers registered downstream of `upstream`.
    pub fn downstream(&self, upstream: &MetadataId) -> Vec<MetadataId> {
        self.downstream
            .get(upstream)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the identifiers `downstream` depends on.
    pub fn upstream(&self, downstream: &MetadataId) -> Vec<MetadataId> {
        self.upstream
            .get(downstream)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns `true` if `upstream -> downstream` is registered.
    pub fn contains(&self, upstream: &MetadataId, downstream: &MetadataId) -> bool {
        self.downstream
            .get(upstream)
            .is_some_and(|set| set.contains(downstream))
    }

    /// Returns the total number of edges.
    pub fn edge_count(&self) -> usize {
        self.downstream.values().map(IndexSet::len).sum()
    }

    /// Breadth-first reachability from `from` to `to` along downstream edges.
    fn reaches(&self, from: &MetadataId, to: &MetadataId) -> bool {
        let mut seen = IndexSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(next) = self.downstream.get(current) {
                queue.extend(next.iter());
            }
        }
        false
    }
}

fn remove_edge(
    map: &mut IndexMap<MetadataId, IndexSet<MetadataId>>,
    from: &MetadataId,
    to: &MetadataId,
) -> bool {
    let Some(set) = map.get_mut(from) else {
        return false;
    };
    let removed = set.shift_remove(to);
    if set.is_empty() {
        map.shift_remove(from);
    }
    removed
}
