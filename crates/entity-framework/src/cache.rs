//! # Cache
//!
//! The [`Cache`] is the client's identity map: one actor cell per `(kind, id)`,
//! each weakly bound to at most one live [`Entity`]. It holds no strong
//! reference to any entity, so an entity lives exactly as long as somebody
//! outside the cache is using it.
//!
//! # Storage Layout
//! Cells are grouped per kind in a typed `KindStore<K>`; the stores themselves
//! sit in a `DashMap` keyed by the kind's `TypeId`. Lookups clone the cell's
//! `Arc` out of the map and release the shard guard before touching any cell
//! lock, so map shards and per-id locks are never held together by a waiter.
//!
//! # Materialization
//! Every model that reaches an entity passes through `materialize_locked` with
//! the id's lock held:
//!
//! 1. fold into the live entity if there is one (a *hit*), or construct a new
//!    one (a *miss*)
//! 2. fold any buffered push on top, if it is newer
//! 3. bind a newly constructed entity to the cell and return it
//!
//! Concurrent materializations of one id are therefore serialized and all
//! observe the same entity. If either fold fails the buffered push goes back
//! into the slot and a new entity is not bound.
//!
//! # Scoped Kinds
//! Cells are keyed by id, plus the parent returned by
//! [`Kind::scope`](crate::kind::Kind::scope) for kinds whose ids are only
//! unique inside a parent. The `_in` variants of lookup and eviction take the
//! path that names that parent.
//!
//! # Reclamation
//! A cell is removed as soon as nothing outside the cache refers to it and it
//! holds no live entity, buffered model or trait. Dropping the last [`Actor`]
//! handle or the last strong reference to the entity triggers the check;
//! [`Cache::sweep`] catches cells whose last references went away concurrently.

use crate::actor::{Actor, ActorCell};
use crate::client::Client;
use crate::entity::{ConstructionContext, Entity, FoldOutcome};
use crate::error::FrameworkError;
use crate::id::Id;
use crate::kind::Kind;
use crate::model::EntityModel;
use crate::path::{CacheKey, CachePath};
use crate::slot::PendingModelSlot;
use crate::stamp::Stamped;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
struct StoreCensus {
    actors: usize,
    entities: usize,
    pending: usize,
}

/// Kind-erased view of a `KindStore<K>`, for whole-cache operations.
trait ErasedStore: Send + Sync + 'static {
    fn kind(&self) -> &'static str;
    fn invalidate_scope(&self, parent: &CacheKey) -> usize;
    fn sweep(&self) -> usize;
    fn census(&self) -> StoreCensus;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Address of a cell within its kind's store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CellKey {
    scope: Option<CacheKey>,
    id: Id,
}

impl CellKey {
    pub(crate) fn new(scope: Option<CacheKey>, id: Id) -> Self {
        Self { scope, id }
    }

    fn of<K: Kind>(path: &CachePath, id: Id) -> Self {
        Self::new(K::scope(path), id)
    }
}

struct KindStore<K: Kind> {
    cells: DashMap<CellKey, Arc<ActorCell<K>>>,
}

impl<K: Kind> Default for KindStore<K> {
    fn default() -> Self {
        Self {
            cells: DashMap::new(),
        }
    }
}

impl<K: Kind> KindStore<K> {
    fn get(&self, key: &CellKey) -> Option<Arc<ActorCell<K>>> {
        self.cells.get(key).map(|cell| cell.value().clone())
    }

    fn snapshot(&self) -> Vec<Arc<ActorCell<K>>> {
        self.cells.iter().map(|cell| cell.value().clone()).collect()
    }
}

/// Unbinds the entity and drops any buffered model.
fn detach<K: Kind>(cell: &ActorCell<K>) {
    let mut pending = cell.pending.lock();
    pending.clear();
    *cell.entity.write() = Weak::new();
}

/// Folds a buffered push into `entity` if there is one.
fn drain_into<K: Kind>(
    entity: &Entity<K>,
    buffered: Option<Stamped<K::Model>>,
    ctx: &ConstructionContext<'_, K>,
) -> Result<(), FrameworkError> {
    if let Some(buffered) = buffered {
        let stamp = buffered.stamp;
        let outcome = entity.fold(buffered, Some(ctx))?;
        debug!(entity_type = K::NAME, id = %entity.id(), stamp = stamp.get(), ?outcome, "Drained pending model");
    }
    Ok(())
}

/// A cell can go once at most `holders` references remain and it carries no
/// state. Never blocks on the cell's locks.
fn reclaimable<K: Kind>(cell: &Arc<ActorCell<K>>, holders: usize) -> bool {
    Arc::strong_count(cell) <= holders
        && cell.entity.read().strong_count() == 0
        && cell.pending.try_lock().is_some_and(|pending| pending.is_empty())
        && cell.traits.try_lock().is_some_and(|traits| traits.is_empty())
}

impl<K: Kind> ErasedStore for KindStore<K> {
    fn kind(&self) -> &'static str {
        K::NAME
    }

    fn invalidate_scope(&self, parent: &CacheKey) -> usize {
        let scoped: Vec<_> = self
            .snapshot()
            .into_iter()
            .filter(|cell| cell.path().contains(parent))
            .collect();
        for cell in &scoped {
            detach(cell.as_ref());
        }
        let count = scoped.len();
        let keys: Vec<_> = scoped.iter().map(|cell| cell.store_key()).collect();
        drop(scoped);

        // One removal at a time: a removed cell is dropped after its shard
        // guard, and its traits may hold actors.
        for key in keys {
            self.cells
                .remove_if(&key, |_, cell| Arc::strong_count(cell) == 1);
        }
        count
    }

    fn sweep(&self) -> usize {
        let before = self.cells.len();
        self.cells.retain(|_, cell| !reclaimable(cell, 1));
        before.saturating_sub(self.cells.len())
    }

    fn census(&self) -> StoreCensus {
        let mut census = StoreCensus::default();
        for cell in self.snapshot() {
            census.actors += 1;
            if cell.live_entity().is_some() {
                census.entities += 1;
            }
            if cell.pending.try_lock().is_some_and(|pending| !pending.is_empty()) {
                census.pending += 1;
            }
        }
        census
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Point-in-time counters for a cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Materializations that folded into a live entity.
    pub hits: u64,
    /// Materializations that had to construct an entity.
    pub misses: u64,
    /// Actor cells currently held.
    pub actors: usize,
    /// Cells whose entity is alive.
    pub entities: usize,
    /// Cells holding a buffered model.
    pub pending: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cache Statistics:")?;
        writeln!(
            f,
            "  Hits: {} | Misses: {} | Hit Rate: {:.1}%",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0
        )?;
        write!(
            f,
            "  Actors: {} | Live Entities: {} | Pending: {}",
            self.actors, self.entities, self.pending
        )
    }
}

/// Identity map of one client.
pub struct Cache {
    stores: DashMap<TypeId, Arc<dyn ErasedStore>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    pub fn new() -> Self {
        Self {
            stores: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn store<K: Kind>(&self) -> Arc<KindStore<K>> {
        let type_id = TypeId::of::<K>();
        let existing = self.stores.get(&type_id).map(|store| store.value().clone());
        let erased = match existing {
            Some(store) => store,
            None => self
                .stores
                .entry(type_id)
                .or_insert_with(|| Arc::new(KindStore::<K>::default()) as Arc<dyn ErasedStore>)
                .value()
                .clone(),
        };
        match erased.into_any().downcast::<KindStore<K>>() {
            Ok(store) => store,
            Err(_) => unreachable!("stores are keyed by the TypeId of their kind"),
        }
    }

    fn stores(&self) -> Vec<Arc<dyn ErasedStore>> {
        self.stores.iter().map(|store| store.value().clone()).collect()
    }

    /// Returns the cell for `id`, creating it with `path` if absent. An
    /// existing cell adopts `path` if it extends the recorded one; otherwise the
    /// recorded path is kept.
    fn cell<K: Kind>(&self, path: &CachePath, id: Id) -> Arc<ActorCell<K>> {
        let store = self.store::<K>();
        let key = CellKey::of::<K>(path, id);
        if let Some(cell) = store.get(&key) {
            if cell.adopt_path(path) {
                debug!(entity_type = K::NAME, %id, %path, "Extended actor path");
            }
            return cell;
        }
        let cell = store
            .cells
            .entry(key)
            .or_insert_with(|| Arc::new(ActorCell::new(id, path.clone())))
            .value()
            .clone();
        cell.adopt_path(path);
        debug!(entity_type = K::NAME, %id, %path, "Created actor");
        cell
    }

    /// The actor for `(K, id)`. Every call for the same id shares one binding.
    pub fn actor<K: Kind>(&self, client: &Client, path: CachePath, id: Id) -> Actor<K> {
        Actor::from_cell(self.cell::<K>(&path, id), client.downgrade())
    }

    /// The live entity for `id`, if any. Never performs I/O and never blocks on
    /// a materialization in progress.
    pub fn lookup<K: Kind>(&self, id: Id) -> Option<Arc<Entity<K>>> {
        self.lookup_in::<K>(&CachePath::root(), id)
    }

    /// [`lookup`](Self::lookup) for kinds scoped by a parent: `path` names the
    /// parent the id belongs to.
    pub fn lookup_in<K: Kind>(&self, path: &CachePath, id: Id) -> Option<Arc<Entity<K>>> {
        self.store::<K>().get(&CellKey::of::<K>(path, id))?.live_entity()
    }

    /// Materializes `model` and binds it to its actor, returning the single
    /// cached entity for the id.
    ///
    /// If an entity already exists the model is folded into it; a newer buffered
    /// push is folded on top in either case.
    pub fn create_latent<K: Kind>(
        &self,
        client: &Client,
        actor: Option<&Actor<K>>,
        model: K::Model,
        path: &CachePath,
    ) -> Result<Arc<Entity<K>>, FrameworkError> {
        let id = model.id();
        let cell = match actor {
            Some(actor) if actor.id() != id => {
                return Err(FrameworkError::IdMismatch {
                    kind: K::NAME,
                    expected: actor.id(),
                    actual: id,
                })
            }
            Some(actor) => actor.cell().clone(),
            None => self.cell::<K>(path, id),
        };

        let mut pending = cell.pending.lock();
        let incoming = Stamped::new(client.next_stamp(), model);
        let (entity, _) = self.materialize_locked(client, &cell, &mut pending, incoming)?;
        Ok(entity)
    }

    /// Materializes several models of one kind under the same path. Stops at the
    /// first failure; entities created before it stay cached.
    pub fn create_latent_many<K: Kind>(
        &self,
        client: &Client,
        models: impl IntoIterator<Item = K::Model>,
        path: &CachePath,
    ) -> Result<Vec<Arc<Entity<K>>>, FrameworkError> {
        models
            .into_iter()
            .map(|model| self.create_latent::<K>(client, None, model, path))
            .collect()
    }

    /// Folds `model` into `entity` and recomputes its derived state. A cached
    /// entity is updated under its id's lock; a detached one in place.
    pub fn refresh<K: Kind>(
        &self,
        client: &Client,
        entity: &Entity<K>,
        model: K::Model,
    ) -> Result<FoldOutcome, FrameworkError> {
        let key = CellKey::of::<K>(entity.path(), entity.id());
        let bound = self.store::<K>().get(&key).filter(|cell| {
            cell.live_entity()
                .is_some_and(|live| std::ptr::eq(Arc::as_ptr(&live), entity))
        });

        match bound {
            Some(cell) => {
                let _pending = cell.pending.lock();
                let actor = Actor::from_cell(cell.clone(), client.downgrade());
                let path = cell.path();
                let ctx = ConstructionContext::new(client, &path, Some(&actor));
                entity.fold(Stamped::new(client.next_stamp(), model), Some(&ctx))
            }
            None => {
                let ctx = ConstructionContext::new(client, entity.path(), None);
                entity.fold(Stamped::new(client.next_stamp(), model), Some(&ctx))
            }
        }
    }

    /// Core of every materialization. `pending` must be the guard of `cell`'s lock.
    pub(crate) fn materialize_locked<K: Kind>(
        &self,
        client: &Client,
        cell: &Arc<ActorCell<K>>,
        pending: &mut PendingModelSlot<K::Model>,
        incoming: Stamped<K::Model>,
    ) -> Result<(Arc<Entity<K>>, FoldOutcome), FrameworkError> {
        let actual = incoming.model.id();
        if actual != cell.key.id {
            return Err(FrameworkError::IdMismatch {
                kind: K::NAME,
                expected: cell.key.id,
                actual,
            });
        }

        let actor = Actor::from_cell(cell.clone(), client.downgrade());
        let path = cell.path();
        let ctx = ConstructionContext::new(client, &path, Some(&actor));
        let buffered = pending.take();

        let materialized = match cell.live_entity() {
            Some(entity) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                entity.fold(incoming, Some(&ctx)).and_then(|outcome| {
                    drain_into(&entity, buffered.clone(), &ctx)?;
                    Ok((entity, outcome))
                })
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Entity::construct_stamped(&ctx, incoming).and_then(|entity| {
                    let entity = Arc::new(entity);
                    drain_into(&entity, buffered.clone(), &ctx)?;
                    *cell.entity.write() = Arc::downgrade(&entity);
                    debug!(entity_type = K::NAME, id = %cell.key.id, %path, "Materialized");
                    Ok((entity, FoldOutcome::Applied))
                })
            }
        };

        if materialized.is_err() {
            if let Some(buffered) = buffered {
                pending.put(buffered);
            }
        }
        materialized
    }

    /// Removes `(K, id)` from the cache. Outstanding entity handles keep their
    /// last snapshot but are no longer reachable through the cache.
    pub fn evict<K: Kind>(&self, id: Id) -> bool {
        self.evict_in::<K>(&CachePath::root(), id)
    }

    /// [`evict`](Self::evict) for kinds scoped by a parent: only the entry
    /// belonging to the parent named in `path` is removed.
    pub fn evict_in<K: Kind>(&self, path: &CachePath, id: Id) -> bool {
        let store = self.store::<K>();
        let key = CellKey::of::<K>(path, id);
        let Some(cell) = store.get(&key) else {
            return false;
        };
        detach(cell.as_ref());
        drop(cell);
        store
            .cells
            .remove_if(&key, |_, cell| Arc::strong_count(cell) == 1);
        debug!(entity_type = K::NAME, %id, %path, "Evicted");
        true
    }

    /// Removes the cell at `key` if it carries no state and nothing refers to
    /// it besides the cache and `handle`. A handle only counts if it is the
    /// cell stored at `key`.
    pub(crate) fn reclaim<K: Kind>(&self, key: CellKey, handle: Option<&Arc<ActorCell<K>>>) -> bool {
        let holders = if handle.is_some() { 2 } else { 1 };
        self.store::<K>()
            .cells
            .remove_if(&key, |_, cell| {
                handle.map_or(true, |handle| Arc::ptr_eq(cell, handle)) && reclaimable(cell, holders)
            })
            .is_some()
    }

    /// Evicts every entry whose path contains `parent`, across all kinds.
    /// Returns how many entries were affected.
    pub fn invalidate_scope(&self, parent: &CacheKey) -> usize {
        let count: usize = self
            .stores()
            .iter()
            .map(|store| store.invalidate_scope(parent))
            .sum();
        info!(%parent, count, "Invalidated scope");
        count
    }

    /// Drops cells no handle refers to and that hold no entity, pending model or
    /// trait. Returns how many were reclaimed. Cells are normally reclaimed when
    /// their last reference goes; this catches the ones whose last references
    /// were dropped concurrently.
    pub fn sweep(&self) -> usize {
        let mut reclaimed = 0;
        for store in self.stores() {
            let swept = store.sweep();
            if swept > 0 {
                debug!(entity_type = store.kind(), swept, "Swept dead cells");
            }
            reclaimed += swept;
        }
        reclaimed
    }

    /// All live entities of kind `K`.
    pub fn entities<K: Kind>(&self) -> Vec<Arc<Entity<K>>> {
        self.store::<K>()
            .snapshot()
            .iter()
            .filter_map(|cell| cell.live_entity())
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ..CacheStats::default()
        };
        for store in self.stores() {
            let census = store.census();
            stats.actors += census.actors;
            stats.entities += census.entities;
            stats.pending += census.pending;
        }
        stats
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.stores().iter().map(|store| store.kind()).collect();
        kinds.sort_unstable();
        f.debug_struct("Cache").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::fixtures::{fixture_client, folder, folder_path, note, Folder, Note, NoteModel};
    use crate::transport::Route;

    /// Notes whose derived state rejects an empty title.
    struct Titled;

    impl Kind for Titled {
        const NAME: &'static str = "titled";
        type Model = NoteModel;
        type Derived = ();

        fn derive(_ctx: &ConstructionContext<'_, Self>, model: &NoteModel) -> Result<(), FrameworkError> {
            match model.title.get() {
                Some(title) if title.is_empty() => Err(FrameworkError::Unsupported {
                    kind: Self::NAME,
                    operation: "empty title",
                }),
                _ => Ok(()),
            }
        }

        fn fetch_route(_path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
            Ok(Route::get(format!("/titled/{id}")))
        }
    }

    #[tokio::test]
    async fn test_create_latent_returns_single_instance() {
        let (client, _mock) = fixture_client();
        let path = folder_path(1);

        let first = client.cache().create_latent::<Note>(&client, None, note(7, "a"), &path).unwrap();
        let second = client.cache().create_latent::<Note>(&client, None, note(7, "b"), &path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.current_model().title, Field::Specified("b".to_string()));
        assert!(Arc::ptr_eq(&first, &client.lookup::<Note>(Id(7)).unwrap()));

        let stats = client.cache().stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn test_dropped_entity_is_not_resurrected() {
        let (client, _mock) = fixture_client();
        let entity = client.create_latent::<Note>(note(7, "a"), &folder_path(1)).unwrap();
        drop(entity);

        assert!(client.lookup::<Note>(Id(7)).is_none());
        assert_eq!(client.cache().stats().entities, 0);
    }

    #[tokio::test]
    async fn test_create_latent_drains_newer_pending() {
        let (client, _mock) = fixture_client();
        let actor = client.actor::<Note>(folder_path(1), Id(7));
        let fetched = client.next_stamp();
        let pushed = client.next_stamp();

        let push = NoteModel {
            pinned: Field::Specified(true),
            ..NoteModel::empty(Id(7))
        };
        actor.deliver_stamped(Stamped::new(pushed, push)).unwrap();

        let mut pending = actor.cell().pending.lock();
        let (entity, _) = client
            .cache()
            .materialize_locked(&client, actor.cell(), &mut pending, Stamped::new(fetched, note(7, "a")))
            .unwrap();
        drop(pending);

        let model = entity.current_model();
        assert_eq!(model.title, Field::Specified("a".to_string()));
        assert_eq!(model.pinned, Field::Specified(true));
        assert_eq!(entity.stamp(), pushed);
        assert!(!actor.has_pending());
    }

    #[tokio::test]
    async fn test_conflicting_path_keeps_first() {
        let (client, _mock) = fixture_client();
        let first = client.actor::<Note>(folder_path(1), Id(7));
        let second = client.actor::<Note>(folder_path(2), Id(7));

        assert!(first.same_binding(&second));
        assert_eq!(second.path(), folder_path(1));
    }

    #[tokio::test]
    async fn test_root_actor_adopts_parent_path() {
        let (client, _mock) = fixture_client();
        let bare = client.actor::<Note>(CachePath::root(), Id(7));
        let scoped = client.actor::<Note>(folder_path(1), Id(7));
        assert!(bare.same_binding(&scoped));
        assert_eq!(bare.path(), folder_path(1));

        let entity = bare.create_entity(note(7, "a")).unwrap();
        assert_eq!(client.cache().invalidate_scope(&CacheKey::of::<Folder>(Id(1))), 1);
        assert!(client.lookup::<Note>(Id(7)).is_none());
        assert!(bare.try_get_precached_entity().is_none());
        drop(entity);
    }

    #[tokio::test]
    async fn test_evict_keeps_outstanding_handles() {
        let (client, _mock) = fixture_client();
        let entity = client.create_latent::<Note>(note(7, "a"), &folder_path(1)).unwrap();

        assert!(client.cache().evict::<Note>(Id(7)));
        assert!(client.lookup::<Note>(Id(7)).is_none());
        assert_eq!(entity.current_model().title, Field::Specified("a".to_string()));

        let fresh = client.create_latent::<Note>(note(7, "b"), &folder_path(1)).unwrap();
        assert!(!Arc::ptr_eq(&entity, &fresh));
        assert!(!client.cache().evict::<Note>(Id(99)));
    }

    #[tokio::test]
    async fn test_invalidate_scope_only_touches_children() {
        let (client, _mock) = fixture_client();
        let parent = client.create_latent::<Folder>(folder(1, "inbox"), &CachePath::root()).unwrap();
        let inside = client.create_latent::<Note>(note(7, "a"), &folder_path(1)).unwrap();
        let outside = client.create_latent::<Note>(note(8, "b"), &folder_path(2)).unwrap();

        let count = client.cache().invalidate_scope(&CacheKey::of::<Folder>(Id(1)));

        assert_eq!(count, 1);
        assert!(client.lookup::<Note>(Id(7)).is_none());
        assert!(client.lookup::<Note>(Id(8)).is_some());
        assert!(client.lookup::<Folder>(Id(1)).is_some());
        drop((parent, inside, outside));
    }

    #[tokio::test]
    async fn test_dropping_last_reference_reclaims_cell() {
        let (client, _mock) = fixture_client();
        for id in 0..10_000 {
            let entity = client.create_latent::<Note>(note(id, "n"), &folder_path(1)).unwrap();
            drop(entity);
        }
        let stats = client.cache().stats();
        assert_eq!((stats.actors, stats.entities), (0, 0));

        let kept = client.actor::<Note>(folder_path(1), Id(1));
        drop(client.actor::<Note>(folder_path(1), Id(2)));
        let buffered = client.actor::<Note>(folder_path(1), Id(3));
        buffered.deliver_model(note(3, "c")).unwrap();
        drop(buffered);
        let entity = client.actor::<Note>(folder_path(1), Id(4)).create_entity(note(4, "d")).unwrap();

        // Held actor, buffered push and live entity keep their cells, and the
        // entity keeps the folder it links to.
        assert_eq!(client.cache().stats().actors, 4);
        drop((kept, entity));
        assert_eq!(client.cache().stats().actors, 1);
        assert_eq!(client.cache().stats().pending, 1);
    }

    #[tokio::test]
    async fn test_sweep_reclaims_only_dead_cells() {
        let (client, _mock) = fixture_client();
        let kept = client.actor::<Note>(folder_path(1), Id(1));
        // A second reference hides the actor's drop from reclamation.
        let orphan = client.actor::<Note>(folder_path(1), Id(2));
        let cell = orphan.cell().clone();
        drop(orphan);
        drop(cell);
        assert_eq!(client.cache().stats().actors, 2);

        assert_eq!(client.cache().sweep(), 1);
        assert_eq!(client.cache().stats().actors, 1);
        drop(kept);
    }

    #[tokio::test]
    async fn test_failed_drain_keeps_pending_and_binds_nothing() {
        let (client, _mock) = fixture_client();
        let actor = client.actor::<Titled>(CachePath::root(), Id(7));
        let fetched = client.next_stamp();
        let pushed = client.next_stamp();
        actor.deliver_stamped(Stamped::new(pushed, note(7, ""))).unwrap();

        let mut pending = actor.cell().pending.lock();
        let err = client
            .cache()
            .materialize_locked(&client, actor.cell(), &mut pending, Stamped::new(fetched, note(7, "a")))
            .unwrap_err();
        drop(pending);

        assert!(matches!(err, FrameworkError::Unsupported { kind: "titled", .. }));
        assert!(actor.has_pending());
        assert!(client.lookup::<Titled>(Id(7)).is_none());
        assert_eq!(client.cache().stats().entities, 0);

        // A newer model supersedes the buffered push.
        let mut pending = actor.cell().pending.lock();
        let (entity, _) = client
            .cache()
            .materialize_locked(&client, actor.cell(), &mut pending, Stamped::new(client.next_stamp(), note(7, "b")))
            .unwrap();
        drop(pending);
        assert_eq!(entity.current_model().title, Field::Specified("b".to_string()));
        assert!(!actor.has_pending());
    }

    #[tokio::test]
    async fn test_entities_lists_live_only() {
        let (client, _mock) = fixture_client();
        let models = vec![note(1, "a"), note(2, "b"), note(3, "c")];
        let mut entities = client
            .cache()
            .create_latent_many::<Note>(&client, models, &folder_path(1))
            .unwrap();
        entities.pop();

        let mut ids: Vec<_> = client.cache().entities::<Note>().iter().map(|e| e.id()).collect();
        ids.sort();
        assert_eq!(ids, vec![Id(1), Id(2)]);
    }

    #[tokio::test]
    async fn test_update_through_cache_rederives() {
        let (client, _mock) = fixture_client();
        let entity = client.create_latent::<Note>(note(7, "a"), &folder_path(1)).unwrap();
        assert_eq!(entity.derived().folder.id(), Id(1));

        let outcome = entity.update(note(7, "b"), true).unwrap();
        assert_eq!(outcome, FoldOutcome::Applied);
        assert_eq!(entity.current_model().title, Field::Specified("b".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_latent_yields_one_entity() {
        let (client, _mock) = fixture_client();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let client = client.clone();
                tokio::spawn(async move {
                    client
                        .create_latent::<Note>(note(7, &format!("t{i}")), &folder_path(1))
                        .unwrap()
                })
            })
            .collect();

        let mut entities = Vec::new();
        for handle in handles {
            entities.push(handle.await.unwrap());
        }
        assert!(entities.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
        assert_eq!(client.cache().stats().misses, 1);
    }
}
