//! # Pending Model Slot
//!
//! Push events can arrive for ids nobody has materialized yet. Without a buffer
//! those updates would be lost, and a later REST-triggered materialization would
//! start from a stale model. The slot holds exactly one model: the latest one.

use crate::stamp::{Stamp, Stamped};

/// Single-slot, last-write-wins buffer for a model awaiting an entity.
#[derive(Debug)]
pub struct PendingModelSlot<M> {
    value: Option<Stamped<M>>,
}

impl<M> Default for PendingModelSlot<M> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<M> PendingModelSlot<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `model`, returning whatever it superseded.
    pub fn put(&mut self, model: Stamped<M>) -> Option<Stamped<M>> {
        self.value.replace(model)
    }

    pub fn take(&mut self) -> Option<Stamped<M>> {
        self.value.take()
    }

    pub fn clear(&mut self) {
        self.value = None;
    }

    /// Stamp of the buffered model, if any.
    pub fn stamp(&self) -> Option<Stamp> {
        self.value.as_ref().map(|stamped| stamped.stamp)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}
