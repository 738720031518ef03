//! The memoizing metadata service.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use quarry_common::ensure;

use crate::error::MetadataError;
use crate::id::{MetadataId, MetadataKind};
use crate::provider::{MetadataItem, MetadataProvider};
use crate::registry::DependencyRegistry;

/// Counters describing the work a service has done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ServiceStats {
    /// Requests answered from the cache.
    pub hits: u64,
    /// Items computed by a provider.
    pub computations: u64,
    /// Items removed from the cache.
    pub evictions: u64,
    /// Downstream items recomputed because an upstream changed.
    pub notifications: u64,
}

/// Holds the providers, the cache and the dependency registry.
///
/// The service is single-threaded and reentrant: a provider computing one
/// identifier may request others through the same service. Requesting an
/// identifier that is already being computed is an error.
pub struct MetadataService<M> {
    providers: IndexMap<&'static str, Box<dyn MetadataProvider<M>>>,
    cache: RefCell<HashMap<MetadataId, Rc<M>>>,
    registry: RefCell<DependencyRegistry>,
    in_flight: RefCell<Vec<MetadataId>>,
    /// Identifiers settled as absent by the refresh in progress, if any.
    absent: RefCell<Option<HashSet<MetadataId>>>,
    stats: Cell<ServiceStats>,
}

impl<M: MetadataItem> Default for MetadataService<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MetadataItem> MetadataService<M> {
    /// Creates a service with no providers.
    pub fn new() -> Self {
        Self {
            providers: IndexMap::new(),
            cache: RefCell::new(HashMap::new()),
            registry: RefCell::new(DependencyRegistry::new()),
            in_flight: RefCell::new(Vec::new()),
            absent: RefCell::new(None),
            stats: Cell::new(ServiceStats::default()),
        }
    }

    /// Registers a provider and activates it.
    pub fn register_provider(
        &mut self,
        provider: Box<dyn MetadataProvider<M>>,
    ) -> Result<(), MetadataError> {
        let kind = provider.provides_kind().name();
        if self.providers.contains_key(kind) {
            return Err(MetadataError::DuplicateProvider {
                kind: kind.to_string(),
            });
        }
        self.providers.insert(kind, provider);
        if let Some(provider) = self.providers.get(kind) {
            provider.activate(self)?;
        }
        tracing::debug!(kind, "registered metadata provider");
        Ok(())
    }

    /// Deactivates and removes the provider for `kind`, evicting its items.
    pub fn deregister_provider(&mut self, kind: MetadataKind) -> Result<bool, MetadataError> {
        let Some(provider) = self.providers.get(kind.name()) else {
            return Ok(false);
        };
        provider.deactivate(self)?;
        self.providers.shift_remove(kind.name());
        let owned: Vec<MetadataId> = self
            .cache
            .borrow()
            .keys()
            .filter(|id| id.is_kind(kind))
            .cloned()
            .collect();
        for id in owned {
            self.evict(&id);
        }
        tracing::debug!(kind = kind.name(), "deregistered metadata provider");
        Ok(true)
    }

    /// Returns the kinds that have a registered provider, in registration order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.providers.keys().copied().collect()
    }

    /// Returns the item for `id`, computing it if it is not cached.
    ///
    /// `Ok(None)` means the provider could not build the item yet.
    pub fn get(&self, id: &MetadataId) -> Result<Option<Rc<M>>, MetadataError> {
        if let Some(item) = self.cache.borrow().get(id) {
            self.bump(|s| s.hits += 1);
            return Ok(Some(Rc::clone(item)));
        }
        if self.is_settled_absent(id) {
            self.bump(|s| s.hits += 1);
            return Ok(None);
        }

        let provider =
            self.providers
                .get(id.kind_name())
                .ok_or_else(|| MetadataError::UnknownKind {
                    kind: id.kind_name().to_string(),
                })?;

        let _guard = InFlight::enter(&self.in_flight, id)?;
        tracing::debug!(%id, "computing metadata");
        let computed = provider.get(id, self)?;
        self.bump(|s| s.computations += 1);

        match computed {
            Some(item) => {
                let item = Rc::new(item);
                self.cache.borrow_mut().insert(id.clone(), Rc::clone(&item));
                Ok(Some(item))
            }
            None => {
                if let Some(absent) = self.absent.borrow_mut().as_mut() {
                    absent.insert(id.clone());
                }
                Ok(None)
            }
        }
    }

    /// Returns the item for `id` only if it exists and is valid.
    pub fn get_valid(&self, id: &MetadataId) -> Result<Option<Rc<M>>, MetadataError> {
        Ok(self.get(id)?.filter(|item| item.is_valid()))
    }

    /// Registers `upstream -> downstream`, then returns the upstream item.
    ///
    /// Providers call this for every upstream they consult, on every
    /// computation, so the edge set follows the inputs actually used.
    pub fn get_upstream(
        &self,
        upstream: &MetadataId,
        downstream: &MetadataId,
    ) -> Result<Option<Rc<M>>, MetadataError> {
        self.register_dependency(upstream, downstream)?;
        self.get(upstream)
    }

    /// Returns the cached item for `id` without computing anything.
    pub fn cached(&self, id: &MetadataId) -> Option<Rc<M>> {
        self.cache.borrow().get(id).cloned()
    }

    /// Returns `true` if an item for `id` is cached.
    pub fn is_cached(&self, id: &MetadataId) -> bool {
        self.cache.borrow().contains_key(id)
    }

    /// Removes the cached item for `id`, returning it.
    pub fn evict(&self, id: &MetadataId) -> Option<Rc<M>> {
        let evicted = self.cache.borrow_mut().remove(id);
        if evicted.is_some() {
            tracing::debug!(%id, "evicted metadata");
            self.bump(|s| s.evictions += 1);
        }
        evicted
    }

    /// Empties the cache. Dependency edges are kept.
    pub fn evict_all(&self) {
        let count = {
            let mut cache = self.cache.borrow_mut();
            let count = cache.len() as u64;
            cache.clear();
            count
        };
        self.bump(|s| s.evictions += count);
    }

    /// Evicts and recomputes `id`, then brings everything downstream of it
    /// up to date.
    ///
    /// Downstream items are evicted together and recomputed at most once each,
    /// upstream before downstream. An item is recomputed only if one of its
    /// upstreams changed; otherwise its previous value is put back. An item
    /// that can no longer be built counts as changed, so its dependents are
    /// recomputed and drop out of the cache as well.
    ///
    /// Returns `true` if `id` itself changed.
    pub fn refresh(&self, id: &MetadataId) -> Result<bool, MetadataError> {
        let _pass = RefreshPass::enter(&self.absent);
        let previous = self.evict(id);
        let current = self.get(id)?;
        if !differs(previous.as_ref(), current.as_ref()) {
            tracing::debug!(%id, "metadata unchanged, not propagating");
            return Ok(false);
        }

        let (order, parents) = self.affected(id)?;
        let mut evicted: HashMap<MetadataId, Rc<M>> = HashMap::new();
        for downstream in &order {
            if let Some(item) = self.evict(downstream) {
                evicted.insert(downstream.clone(), item);
            }
        }

        let mut changed = HashSet::from([id.clone()]);
        for downstream in &order {
            let before = evicted.remove(downstream);
            let stale = parents
                .get(downstream)
                .is_some_and(|ups| ups.iter().any(|up| changed.contains(up)));
            if !stale {
                // Pulled early by another recompute, already fresh.
                if let Some(item) = before {
                    self.cache
                        .borrow_mut()
                        .entry(downstream.clone())
                        .or_insert(item);
                }
                continue;
            }
            tracing::trace!(%id, %downstream, "recomputing downstream");
            self.bump(|s| s.notifications += 1);
            let after = self.get(downstream)?;
            if differs(before.as_ref(), after.as_ref()) {
                changed.insert(downstream.clone());
            }
        }
        tracing::debug!(%id, affected = order.len(), changed = changed.len() - 1, "propagated change");
        Ok(true)
    }

    /// Collects every identifier reachable downstream of `root`, in an order
    /// where each identifier follows all of its reachable upstreams, together
    /// with the upstreams each one was reached from.
    fn affected(
        &self,
        root: &MetadataId,
    ) -> Result<(Vec<MetadataId>, IndexMap<MetadataId, IndexSet<MetadataId>>), MetadataError> {
        let mut parents: IndexMap<MetadataId, IndexSet<MetadataId>> = IndexMap::new();
        let mut queue = VecDeque::from([root.clone()]);
        let mut seen = HashSet::from([root.clone()]);
        while let Some(current) = queue.pop_front() {
            for downstream in self.listeners(&current)? {
                if downstream == *root {
                    continue;
                }
                parents
                    .entry(downstream.clone())
                    .or_default()
                    .insert(current.clone());
                if seen.insert(downstream.clone()) {
                    queue.push_back(downstream);
                }
            }
        }

        // Kahn's algorithm over the collected edges, ties in discovery order.
        let mut pending: IndexMap<MetadataId, usize> = parents
            .iter()
            .map(|(id, ups)| (id.clone(), ups.iter().filter(|up| *up != root).count()))
            .collect();
        let mut order = Vec::with_capacity(pending.len());
        while let Some(next) = pending
            .iter()
            .find(|(_, count)| **count == 0)
            .map(|(id, _)| id.clone())
        {
            pending.shift_remove(&next);
            for (id, count) in pending.iter_mut() {
                if parents.get(id).is_some_and(|ups| ups.contains(&next)) {
                    *count -= 1;
                }
            }
            order.push(next);
        }
        ensure!(
            pending.is_empty(),
            "dependency cycle below {root} through {}",
            pending.keys().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );
        Ok((order, parents))
    }

    /// Concrete identifiers to refresh when `changed` changes.
    ///
    /// Listeners registered against `changed` come first, then listeners
    /// registered against its kind, resolved by their provider.
    fn listeners(&self, changed: &MetadataId) -> Result<Vec<MetadataId>, MetadataError> {
        let targets = {
            let registry = self.registry.borrow();
            let mut targets = registry.downstream(changed);
            if !changed.is_class() {
                targets.extend(registry.downstream(&changed.class_id()));
            }
            targets
        };
        let mut resolved = Vec::with_capacity(targets.len());
        for downstream in targets {
            let Some(provider) = self.providers.get(downstream.kind_name()) else {
                tracing::trace!(%changed, %downstream, "no provider for listener, skipping");
                continue;
            };
            if !downstream.is_class() {
                resolved.push(downstream);
                continue;
            }
            let Some(local) = provider.local_id_for(changed)? else {
                tracing::trace!(%changed, %downstream, "no local identifier, skipping");
                continue;
            };
            ensure!(
                local.is_kind(provider.provides_kind()),
                "provider for '{}' resolved {changed} to {local}",
                provider.provides_kind()
            );
            if !resolved.contains(&local) {
                resolved.push(local);
            }
        }
        Ok(resolved)
    }

    /// Records `upstream -> downstream`. Returns `false` if it already existed.
    pub fn register_dependency(
        &self,
        upstream: &MetadataId,
        downstream: &MetadataId,
    ) -> Result<bool, MetadataError> {
        self.registry.borrow_mut().register(upstream, downstream)
    }

    /// Removes `upstream -> downstream`.
    pub fn deregister_dependency(&self, upstream: &MetadataId, downstream: &MetadataId) -> bool {
        self.registry.borrow_mut().deregister(upstream, downstream)
    }

    /// Returns the identifiers registered downstream of `upstream`.
    pub fn downstream(&self, upstream: &MetadataId) -> Vec<MetadataId> {
        self.registry.borrow().downstream(upstream)
    }

    /// Returns the identifiers `downstream` depends on.
    pub fn upstream(&self, downstream: &MetadataId) -> Vec<MetadataId> {
        self.registry.borrow().upstream(downstream)
    }

    /// Returns `true` if `upstream -> downstream` is registered.
    pub fn has_dependency(&self, upstream: &MetadataId, downstream: &MetadataId) -> bool {
        self.registry.borrow().contains(upstream, downstream)
    }

    /// Asks the provider of `id` for its governor identifier.
    pub fn governor_id(&self, id: &MetadataId) -> Result<Option<MetadataId>, MetadataError> {
        match self.providers.get(id.kind_name()) {
            Some(provider) => provider.governor_id(id),
            None => Err(MetadataError::UnknownKind {
                kind: id.kind_name().to_string(),
            }),
        }
    }

    /// Returns the work counters.
    pub fn stats(&self) -> ServiceStats {
        self.stats.get()
    }

    fn is_settled_absent(&self, id: &MetadataId) -> bool {
        self.absent
            .borrow()
            .as_ref()
            .is_some_and(|absent| absent.contains(id))
    }

    fn bump(&self, update: impl FnOnce(&mut ServiceStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

fn differs<M: PartialEq>(before: Option<&Rc<M>>, after: Option<&Rc<M>>) -> bool {
    match (before, after) {
        (None, None) => false,
        (Some(before), Some(after)) => before != after,
        _ => true,
    }
}

/// Tracks identifiers that computed to nothing during the outermost refresh,
/// so each is computed once per pass even though absence is not cached.
struct RefreshPass<'a> {
    absent: Option<&'a RefCell<Option<HashSet<MetadataId>>>>,
}

impl<'a> RefreshPass<'a> {
    fn enter(absent: &'a RefCell<Option<HashSet<MetadataId>>>) -> Self {
        let mut slot = absent.borrow_mut();
        if slot.is_some() {
            return Self { absent: None };
        }
        *slot = Some(HashSet::new());
        Self {
            absent: Some(absent),
        }
    }
}

impl Drop for RefreshPass<'_> {
    fn drop(&mut self) {
        if let Some(absent) = self.absent {
            *absent.borrow_mut() = None;
        }
    }
}

/// Marks an identifier as being computed until dropped.
struct InFlight<'a> {
    stack: &'a RefCell<Vec<MetadataId>>,
}

impl<'a> InFlight<'a> {
    fn enter(stack: &'a RefCell<Vec<MetadataId>>, id: &MetadataId) -> Result<Self, MetadataError> {
        let mut ids = stack.borrow_mut();
        if ids.contains(id) {
            return Err(MetadataError::Reentrant {
                id: id.clone(),
                chain: ids.clone(),
            });
        }
        ids.push(id.clone());
        Ok(Self { stack })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}
