//! # Identities
//!
//! An [`Identity`] names an entity by `(kind, id)` and may carry shortcuts to it:
//! a weak link to an entity that was in hand when the identity was made, and the
//! actor for the id. Identities are what models and events hand around when they
//! reference another object ("the guild's owner", "the channel's parent").
//!
//! Equality and hashing only look at `(kind, id)`; the shortcuts are a cache, not
//! part of the identity.

use crate::actor::Actor;
use crate::entity::Entity;
use crate::id::Id;
use crate::kind::Kind;
use crate::path::CacheKey;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// How much an identity knows beyond its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DetailLevel {
    /// Only the id.
    Id,
    /// The id and a weak link to an entity.
    Entity,
    /// The id and the actor, possibly also an entity link.
    Actor,
}

/// Kind-tagged id with optional shortcuts to its entity and actor.
pub struct Identity<K: Kind> {
    id: Id,
    entity: Option<Weak<Entity<K>>>,
    actor: Option<Actor<K>>,
    detail: DetailLevel,
}

impl<K: Kind> Identity<K> {
    pub fn of_id(id: Id) -> Self {
        Self {
            id,
            entity: None,
            actor: None,
            detail: DetailLevel::Id,
        }
    }

    /// Remembers `entity` weakly; the identity never keeps it alive.
    pub fn of_entity(entity: &Arc<Entity<K>>) -> Self {
        Self {
            id: entity.id(),
            entity: Some(Arc::downgrade(entity)),
            actor: None,
            detail: DetailLevel::Entity,
        }
    }

    /// Links the actor, and its entity if one is live.
    pub fn of_actor(actor: Actor<K>) -> Self {
        Self {
            id: actor.id(),
            entity: actor.cell().live_entity().map(|entity| Arc::downgrade(&entity)),
            actor: Some(actor),
            detail: DetailLevel::Actor,
        }
    }

    /// Attaches `actor`. Ignored if it belongs to another id.
    pub fn with_actor(mut self, actor: Actor<K>) -> Self {
        if actor.id() == self.id {
            self.actor = Some(actor);
            self.detail = DetailLevel::Actor;
        }
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        K::NAME
    }

    pub fn key(&self) -> CacheKey {
        CacheKey::of::<K>(self.id)
    }

    pub fn detail(&self) -> DetailLevel {
        self.detail
    }

    pub fn actor(&self) -> Option<&Actor<K>> {
        self.actor.as_ref()
    }

    /// The entity, if one is still alive. Never performs I/O and never blocks.
    ///
    /// Tries the remembered weak link first, then the actor's current binding.
    /// A buffered push is left alone; use
    /// [`Actor::try_get_precached_entity`] to materialize it.
    pub fn resolve(&self) -> Option<Arc<Entity<K>>> {
        self.entity
            .as_ref()
            .and_then(Weak::upgrade)
            .or_else(|| self.actor.as_ref().and_then(|actor| actor.cell().live_entity()))
    }
}

impl<K: Kind> From<Id> for Identity<K> {
    fn from(id: Id) -> Self {
        Self::of_id(id)
    }
}

impl<K: Kind> Clone for Identity<K> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            entity: self.entity.clone(),
            actor: self.actor.clone(),
            detail: self.detail,
        }
    }
}

impl<K: Kind> PartialEq for Identity<K> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<K: Kind> Eq for Identity<K> {}

impl<K: Kind> Hash for Identity<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        K::NAME.hash(state);
        self.id.hash(state);
    }
}

impl<K: Kind> fmt::Debug for Identity<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("kind", &K::NAME)
            .field("id", &self.id)
            .field("detail", &self.detail)
            .finish()
    }
}
