//! # Actors
//!
//! An [`Actor`] is a lightweight, cloneable handle for one `(kind, id)`. It exists
//! whether or not the object has ever been loaded, and it is the only way to talk
//! to the platform about that object.
//!
//! ## Actor Binding
//! Every actor handle for an id shares one cell. The cell holds:
//!
//! - a **weak** link to the current entity (readers never block on it),
//! - a [`PendingModelSlot`] for pushes that arrive before the entity exists,
//! - the actor's auxiliary trait values.
//!
//! A cell lives as long as something refers to it or it carries state: dropping
//! the last handle of a cell with no live entity, no buffered model and no
//! traits removes it from the cache.
//!
//! The cell's `pending` mutex is the per-id lock. Every change of binding
//! (materialization, fold, buffering, eviction) happens with it held, and it is
//! never held across an `.await`.
//!
//! ## Operations
//! - `fetch()` → `GET` the model, fold it in, return the entity (or `None` on a 404)
//! - `modify(params)` → `PATCH`, fold the returned model
//! - `delete()` → `DELETE`, evict from the cache
//! - `deliver_model(model)` → push a model: fold into the entity or buffer it

use crate::cache::CellKey;
use crate::client::{decode, Client, ClientRef};
use crate::entity::{ConstructionContext, Entity, FoldOutcome};
use crate::error::FrameworkError;
use crate::id::Id;
use crate::identity::Identity;
use crate::kind::Kind;
use crate::model::EntityModel;
use crate::path::{CacheKey, CachePath};
use crate::slot::PendingModelSlot;
use crate::stamp::Stamped;
use crate::traits::{TraitKey, TraitStore};
use crate::transport::{CancelToken, RequestOptions, RestRequest};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, instrument, warn};

/// Shared state behind every actor handle for one id.
pub(crate) struct ActorCell<K: Kind> {
    pub(crate) key: CacheKey,
    pub(crate) scope: Option<CacheKey>,
    path: RwLock<CachePath>,
    pub(crate) entity: RwLock<Weak<Entity<K>>>,
    pub(crate) pending: Mutex<PendingModelSlot<K::Model>>,
    pub(crate) traits: Mutex<TraitStore>,
}

impl<K: Kind> ActorCell<K> {
    pub(crate) fn new(id: Id, path: CachePath) -> Self {
        Self {
            key: CacheKey::of::<K>(id),
            scope: K::scope(&path),
            path: RwLock::new(path),
            entity: RwLock::new(Weak::new()),
            pending: Mutex::new(PendingModelSlot::new()),
            traits: Mutex::new(TraitStore::default()),
        }
    }

    pub(crate) fn live_entity(&self) -> Option<Arc<Entity<K>>> {
        self.entity.read().upgrade()
    }

    pub(crate) fn store_key(&self) -> CellKey {
        CellKey::new(self.scope, self.key.id)
    }

    pub(crate) fn path(&self) -> CachePath {
        self.path.read().clone()
    }

    /// Records `path` if it extends the current one. Returns whether it did.
    pub(crate) fn adopt_path(&self, path: &CachePath) -> bool {
        let extends = path.extends(&self.path.read());
        if !extends {
            return false;
        }
        let mut current = self.path.write();
        if !path.extends(&current) {
            return false;
        }
        *current = path.clone();
        true
    }
}

/// What happened to a pushed model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Folded into the live entity.
    Applied,
    /// No entity yet; held in the pending slot.
    Buffered,
    /// Older than what the entity or the slot already holds; dropped.
    Stale,
}

impl From<FoldOutcome> for DeliveryOutcome {
    fn from(outcome: FoldOutcome) -> Self {
        match outcome {
            FoldOutcome::Applied => DeliveryOutcome::Applied,
            FoldOutcome::Stale => DeliveryOutcome::Stale,
        }
    }
}

/// Handle for a remote object, loaded or not.
pub struct Actor<K: Kind> {
    cell: Arc<ActorCell<K>>,
    client: ClientRef,
}

impl<K: Kind> Clone for Actor<K> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            client: self.client.clone(),
        }
    }
}

impl<K: Kind> Actor<K> {
    pub(crate) fn from_cell(cell: Arc<ActorCell<K>>, client: ClientRef) -> Self {
        Self { cell, client }
    }

    pub(crate) fn cell(&self) -> &Arc<ActorCell<K>> {
        &self.cell
    }

    pub fn id(&self) -> Id {
        self.cell.key.id
    }

    pub fn key(&self) -> CacheKey {
        self.cell.key
    }

    /// Parent keys known for this actor. Starts as the path it was created
    /// with and only ever grows.
    pub fn path(&self) -> CachePath {
        self.cell.path()
    }

    pub fn identity(&self) -> Identity<K> {
        Identity::of_actor(self.clone())
    }

    /// The owning client, if it is still alive.
    pub fn client(&self) -> Result<Client, FrameworkError> {
        self.client.upgrade().ok_or(FrameworkError::ClientDropped)
    }

    /// Whether two handles share the same binding.
    pub fn same_binding(&self, other: &Actor<K>) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Materializes `model` through the cache and binds it to this actor.
    pub fn create_entity(&self, model: K::Model) -> Result<Arc<Entity<K>>, FrameworkError> {
        let client = self.client()?;
        client
            .cache()
            .create_latent(&client, Some(self), model, &self.path())
    }

    /// Returns the current entity without any I/O.
    ///
    /// If the entity is gone but a pushed model is buffered, the model is
    /// materialized now. A buffered model that fails to materialize stays buffered.
    pub fn try_get_precached_entity(&self) -> Option<Arc<Entity<K>>> {
        if let Some(entity) = self.cell.live_entity() {
            return Some(entity);
        }

        let client = self.client.upgrade()?;
        let mut pending = self.cell.pending.lock();
        if let Some(entity) = self.cell.live_entity() {
            return Some(entity);
        }

        let buffered = pending.take()?;
        let retry = buffered.clone();
        match client
            .cache()
            .materialize_locked(&client, &self.cell, &mut pending, buffered)
        {
            Ok((entity, _)) => Some(entity),
            Err(e) => {
                warn!(entity_type = K::NAME, id = %self.id(), error = %e, "Failed to materialize pending model");
                pending.put(retry);
                None
            }
        }
    }

    /// Whether a pushed model is waiting for an entity.
    pub fn has_pending(&self) -> bool {
        !self.cell.pending.lock().is_empty()
    }

    /// Pushes `model` under a freshly issued stamp.
    pub fn deliver_model(&self, model: K::Model) -> Result<DeliveryOutcome, FrameworkError> {
        let client = self.client()?;
        let mut pending = self.cell.pending.lock();
        let incoming = Stamped::new(client.next_stamp(), model);
        self.deliver_locked(&client, &mut pending, incoming)
    }

    /// Pushes a model issued earlier, e.g. at Gateway receipt.
    pub fn deliver_stamped(
        &self,
        incoming: Stamped<K::Model>,
    ) -> Result<DeliveryOutcome, FrameworkError> {
        let client = self.client()?;
        let mut pending = self.cell.pending.lock();
        self.deliver_locked(&client, &mut pending, incoming)
    }

    fn deliver_locked(
        &self,
        client: &Client,
        pending: &mut PendingModelSlot<K::Model>,
        incoming: Stamped<K::Model>,
    ) -> Result<DeliveryOutcome, FrameworkError> {
        let actual = incoming.model.id();
        if actual != self.id() {
            return Err(FrameworkError::IdMismatch {
                kind: K::NAME,
                expected: self.id(),
                actual,
            });
        }

        // Holding the Arc keeps the entity alive until the fold is done.
        if let Some(entity) = self.cell.live_entity() {
            let path = self.path();
            let ctx = ConstructionContext::new(client, &path, Some(self));
            let outcome = entity.fold(incoming, Some(&ctx))?;
            return Ok(outcome.into());
        }

        if pending.stamp().is_some_and(|held| held >= incoming.stamp) {
            return Ok(DeliveryOutcome::Stale);
        }
        if pending.put(incoming).is_some() {
            debug!(entity_type = K::NAME, id = %self.id(), "Superseded pending model");
        }
        Ok(DeliveryOutcome::Buffered)
    }

    /// Fetches the current model and folds it into the cached entity.
    ///
    /// Returns `Ok(None)` when the object does not exist. A failed request leaves
    /// the cache untouched.
    #[instrument(skip(self, options, cancel), fields(entity_type = K::NAME, id = %self.id()))]
    pub async fn fetch(
        &self,
        options: Option<&RequestOptions>,
        cancel: Option<&CancelToken>,
    ) -> Result<Option<Arc<Entity<K>>>, FrameworkError> {
        let client = self.client()?;
        let route = K::fetch_route(&self.path(), self.id())?;
        // Issued before the request so a push received meanwhile wins.
        let issued = client.next_stamp();

        let Some(raw) = client.send(RestRequest::new(route), options, cancel).await? else {
            debug!("Not found");
            return Ok(None);
        };
        let model = decode::<K>(raw)?;

        let mut pending = self.cell.pending.lock();
        let (entity, outcome) = client.cache().materialize_locked(
            &client,
            &self.cell,
            &mut pending,
            Stamped::new(issued, model),
        )?;
        debug!(?outcome, "Fetched");
        Ok(Some(entity))
    }

    /// Sends `params` to the modify route and folds the returned model.
    #[instrument(skip(self, params, options, cancel), fields(entity_type = K::NAME, id = %self.id()))]
    pub async fn modify<P>(
        &self,
        params: &P,
        options: Option<&RequestOptions>,
        cancel: Option<&CancelToken>,
    ) -> Result<Arc<Entity<K>>, FrameworkError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let client = self.client()?;
        let route = K::modify_route(&self.path(), self.id())?;
        let body = serde_json::to_value(params).map_err(|source| FrameworkError::Encode {
            kind: K::NAME,
            source,
        })?;
        let issued = client.next_stamp();

        let raw = client
            .send(RestRequest::with_body(route, body), options, cancel)
            .await?
            .ok_or(FrameworkError::MissingModel {
                kind: K::NAME,
                id: self.id(),
            })?;
        let model = decode::<K>(raw)?;

        let mut pending = self.cell.pending.lock();
        let (entity, outcome) = client.cache().materialize_locked(
            &client,
            &self.cell,
            &mut pending,
            Stamped::new(issued, model),
        )?;
        debug!(?outcome, "Modified");
        Ok(entity)
    }

    /// Deletes the object remotely, then evicts it from the cache.
    #[instrument(skip(self, options, cancel), fields(entity_type = K::NAME, id = %self.id()))]
    pub async fn delete(
        &self,
        options: Option<&RequestOptions>,
        cancel: Option<&CancelToken>,
    ) -> Result<(), FrameworkError> {
        let client = self.client()?;
        let route = K::delete_route(&self.path(), self.id())?;
        client.send(RestRequest::new(route), options, cancel).await?;
        client.cache().evict_in::<K>(&self.path(), self.id());
        debug!("Deleted");
        Ok(())
    }

    /// Returns the trait value for `T`, creating it with `factory` on first use.
    pub fn get_or_create_trait<T: TraitKey>(
        &self,
        factory: impl FnOnce(&Actor<K>) -> T::Value,
    ) -> Arc<T::Value> {
        self.cell
            .traits
            .lock()
            .get_or_create::<T>(|| factory(self))
    }

    pub fn trait_value<T: TraitKey>(&self) -> Option<Arc<T::Value>> {
        self.cell.traits.lock().get::<T>()
    }

    /// Detaches the trait value for `T` and hands it back.
    pub fn clear_trait<T: TraitKey>(&self) -> Option<Arc<T::Value>> {
        self.cell.traits.lock().remove::<T>()
    }

    pub fn trait_names(&self) -> Vec<&'static str> {
        self.cell.traits.lock().names()
    }
}

impl<K: Kind> fmt::Debug for Actor<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("key", &self.cell.key)
            .field("path", &self.cell.path())
            .finish()
    }
}

impl<K: Kind> Drop for Actor<K> {
    fn drop(&mut self) {
        // The cache's entry plus this handle.
        if Arc::strong_count(&self.cell) > 2 {
            return;
        }
        if let Some(client) = self.client.upgrade() {
            client.cache().reclaim(self.cell.store_key(), Some(&self.cell));
        }
    }
}
