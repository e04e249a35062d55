//! # EntityModel Trait
//!
//! A model is an immutable decoded snapshot of one entity's wire fields. Models
//! arrive from two places (REST responses and Gateway dispatches) and are folded
//! into the live [`Entity`](crate::entity::Entity) as deltas.

use crate::id::Id;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Contract every wire model must satisfy to be cached.
///
/// `apply` is the delta protocol: specified fields in `delta` overwrite the
/// corresponding field of `self`, unspecified fields leave it untouched. It must
/// never clear data it has no information about. Most implementations are a
/// single [`fold_fields!`](crate::fold_fields) invocation.
pub trait EntityModel: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The id of the entity this snapshot describes. Always present on the wire.
    fn id(&self) -> Id;

    /// Fold `delta` into `self`.
    fn apply(&mut self, delta: Self);
}
