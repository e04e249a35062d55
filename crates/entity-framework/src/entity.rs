//! # Entities
//!
//! An [`Entity`] is the materialized object for one id: it exclusively owns the
//! current model, the state derived from it, and the stamp of the last fold.
//!
//! Entities are normally minted by the [`Cache`](crate::cache::Cache), which
//! guarantees at most one cached entity per `(kind, id)`. Calling
//! [`Entity::construct`] directly is the escape hatch for ephemeral snapshots
//! (an audit-log record, a preview): the result is detached and never found by a
//! later lookup.
//!
//! # Delta Protocol
//! Folding never replaces the model wholesale. The incoming model is applied
//! with [`EntityModel::apply`](crate::model::EntityModel::apply) to a copy of the
//! current one and the copy is swapped in under the write lock, so readers see
//! either the old snapshot or the new one and never a half-applied update.

use crate::actor::Actor;
use crate::cache::CellKey;
use crate::client::{Client, ClientRef};
use crate::error::FrameworkError;
use crate::id::Id;
use crate::kind::Kind;
use crate::model::EntityModel;
use crate::path::{CacheKey, CachePath};
use crate::stamp::{Stamp, Stamped};
use parking_lot::RwLock;
use std::fmt;

/// Everything [`Kind::derive`] may consult while building or refreshing an entity.
pub struct ConstructionContext<'a, K: Kind> {
    client: &'a Client,
    path: &'a CachePath,
    actor: Option<&'a Actor<K>>,
}

impl<'a, K: Kind> ConstructionContext<'a, K> {
    pub fn new(client: &'a Client, path: &'a CachePath, actor: Option<&'a Actor<K>>) -> Self {
        Self {
            client,
            path,
            actor,
        }
    }

    pub fn client(&self) -> &'a Client {
        self.client
    }

    /// Parent keys known for the entity under construction.
    pub fn path(&self) -> &'a CachePath {
        self.path
    }

    /// The actor the entity will be bound to, if it is being cached.
    pub fn actor(&self) -> Option<&'a Actor<K>> {
        self.actor
    }

    /// Actor for a referenced entity of another (or the same) kind.
    pub fn actor_of<O: Kind>(&self, path: CachePath, id: Id) -> Actor<O> {
        self.client.actor::<O>(path, id)
    }
}

/// Result of folding one model into an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldOutcome {
    /// The model was newer than the entity and has been applied.
    Applied,
    /// The entity already reflects a newer model; nothing changed.
    Stale,
}

struct EntityState<K: Kind> {
    model: K::Model,
    derived: K::Derived,
    stamp: Stamp,
}

/// The materialized object holding the latest known model for an id.
pub struct Entity<K: Kind> {
    id: Id,
    path: CachePath,
    client: ClientRef,
    state: RwLock<EntityState<K>>,
}

impl<K: Kind> Entity<K> {
    /// Builds a detached entity. Pure: no I/O, and nothing is registered in the
    /// cache, so subsequent lookups will not find it.
    pub fn construct(
        ctx: &ConstructionContext<'_, K>,
        model: K::Model,
    ) -> Result<Self, FrameworkError> {
        Self::construct_stamped(ctx, Stamped::new(Stamp::ZERO, model))
    }

    pub(crate) fn construct_stamped(
        ctx: &ConstructionContext<'_, K>,
        incoming: Stamped<K::Model>,
    ) -> Result<Self, FrameworkError> {
        let derived = K::derive(ctx, &incoming.model)?;
        Ok(Self {
            id: incoming.model.id(),
            path: ctx.path().clone(),
            client: ctx.client().downgrade(),
            state: RwLock::new(EntityState {
                model: incoming.model,
                derived,
                stamp: incoming.stamp,
            }),
        })
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn key(&self) -> CacheKey {
        CacheKey::of::<K>(self.id)
    }

    pub fn path(&self) -> &CachePath {
        &self.path
    }

    /// A complete, consistent copy of the current model.
    pub fn current_model(&self) -> K::Model {
        self.state.read().model.clone()
    }

    /// The derived state computed from the current model.
    pub fn derived(&self) -> K::Derived {
        self.state.read().derived.clone()
    }

    /// Reads model and derived state under one lock acquisition.
    pub fn read<R>(&self, f: impl FnOnce(&K::Model, &K::Derived) -> R) -> R {
        let state = self.state.read();
        f(&state.model, &state.derived)
    }

    /// Stamp of the last applied fold.
    pub fn stamp(&self) -> Stamp {
        self.state.read().stamp
    }

    /// Folds an externally supplied model into this entity.
    ///
    /// With `route_through_cache` the model goes back through the cache, which
    /// serializes it with every other update for this id and recomputes derived
    /// state (e.g. a guild's AFK-channel actor after `afk_channel_id` changed).
    /// Without it only this entity's own fields are refreshed in place and the
    /// derived state is left as is.
    pub fn update(
        &self,
        model: K::Model,
        route_through_cache: bool,
    ) -> Result<FoldOutcome, FrameworkError> {
        match self.client.upgrade() {
            Some(client) if route_through_cache => client.cache().refresh(&client, self, model),
            Some(client) => self.fold(Stamped::new(client.next_stamp(), model), None),
            None => {
                let stamp = self.stamp().successor();
                self.fold(Stamped::new(stamp, model), None)
            }
        }
    }

    /// Applies `incoming` if it is newer than the current state. When `ctx` is
    /// given the derived state is recomputed from the folded model as well. On
    /// error nothing is changed.
    pub(crate) fn fold(
        &self,
        incoming: Stamped<K::Model>,
        ctx: Option<&ConstructionContext<'_, K>>,
    ) -> Result<FoldOutcome, FrameworkError> {
        let actual = incoming.model.id();
        if actual != self.id {
            return Err(FrameworkError::IdMismatch {
                kind: K::NAME,
                expected: self.id,
                actual,
            });
        }

        let mut state = self.state.write();
        if incoming.stamp <= state.stamp {
            return Ok(FoldOutcome::Stale);
        }

        let mut next = state.model.clone();
        next.apply(incoming.model);
        let derived = ctx.map(|ctx| K::derive(ctx, &next)).transpose()?;

        state.model = next;
        if let Some(derived) = derived {
            state.derived = derived;
        }
        state.stamp = incoming.stamp;
        Ok(FoldOutcome::Applied)
    }
}

impl<K: Kind> Drop for Entity<K> {
    fn drop(&mut self) {
        if let Some(client) = self.client.upgrade() {
            let key = CellKey::new(K::scope(&self.path), self.id);
            client.cache().reclaim::<K>(key, None);
        }
    }
}

impl<K: Kind> fmt::Debug for Entity<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Entity")
            .field("kind", &K::NAME)
            .field("id", &self.id)
            .field("path", &self.path)
            .field("stamp", &state.stamp)
            .field("model", &state.model)
            .finish()
    }
}
