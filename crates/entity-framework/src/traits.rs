//! # Actor Traits
//!
//! Some actors need auxiliary state that outlives any single call: a paginator
//! remembering its cursor, a memoized sub-collection. That state is attached to
//! the actor lazily, keyed by a [`TraitKey`] type.
//!
//! # Type Safety
//! The store is keyed by the `TypeId` of the key type, and each key fixes its
//! value type through `TraitKey::Value`. Asking for an existing entry "as the
//! wrong type" is therefore not expressible: the downcast below cannot fail.
//!
//! Traits are never evicted automatically. [`Actor::clear_trait`](crate::actor::Actor::clear_trait)
//! hands the value back; dropping the last `Arc` releases whatever it owns.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Names one slot of per-actor auxiliary state and fixes its type.
///
/// ```rust
/// use entity_framework::TraitKey;
///
/// struct MessageCursor;
///
/// impl TraitKey for MessageCursor {
///     const NAME: &'static str = "message_cursor";
///     type Value = std::sync::atomic::AtomicU64;
/// }
/// ```
pub trait TraitKey: 'static {
    const NAME: &'static str;
    type Value: Send + Sync + 'static;
}

struct TraitEntry {
    name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// Lazily populated trait values of one actor.
#[derive(Default)]
pub(crate) struct TraitStore {
    entries: HashMap<TypeId, TraitEntry>,
}

impl TraitStore {
    pub(crate) fn get_or_create<T: TraitKey>(
        &mut self,
        factory: impl FnOnce() -> T::Value,
    ) -> Arc<T::Value> {
        let entry = self
            .entries
            .entry(TypeId::of::<T>())
            .or_insert_with(|| TraitEntry {
                name: T::NAME,
                value: Arc::new(factory()),
            });
        Self::downcast::<T>(entry.value.clone())
    }

    pub(crate) fn get<T: TraitKey>(&self) -> Option<Arc<T::Value>> {
        self.entries
            .get(&TypeId::of::<T>())
            .map(|entry| Self::downcast::<T>(entry.value.clone()))
    }

    pub(crate) fn remove<T: TraitKey>(&mut self) -> Option<Arc<T::Value>> {
        self.entries
            .remove(&TypeId::of::<T>())
            .map(|entry| Self::downcast::<T>(entry.value))
    }

    pub(crate) fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.values().map(|entry| entry.name).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn downcast<T: TraitKey>(value: Arc<dyn Any + Send + Sync>) -> Arc<T::Value> {
        match value.downcast::<T::Value>() {
            Ok(value) => value,
            Err(_) => unreachable!("trait entries are keyed by the TypeId of their TraitKey"),
        }
    }
}
