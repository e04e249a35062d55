//! # Cache Paths
//!
//! Many entities only make sense inside a parent: a role belongs to a guild, a ban
//! to a guild and a user. A [`CachePath`] is the ordered chain of parent keys that
//! was known when an actor was created. It serves two purposes:
//!
//! - **Construction context**: [`Kind::derive`](crate::kind::Kind::derive) and the
//!   route builders pull parent ids out of it.
//! - **Scoped invalidation**: [`Cache::invalidate_scope`](crate::cache::Cache::invalidate_scope)
//!   evicts everything whose path contains a removed parent.
//!
//! An actor first seen without its parents (a channel addressed by id alone)
//! adopts a longer path later if one extends the recorded one, so it still falls
//! inside its parent's scope.

use crate::error::FrameworkError;
use crate::id::Id;
use crate::kind::Kind;
use std::fmt::{self, Display};

/// `(kind, id)`: the address of one entity within a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: &'static str,
    pub id: Id,
}

impl CacheKey {
    pub fn of<K: Kind>(id: Id) -> Self {
        Self { kind: K::NAME, id }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Ordered chain of parent keys, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CachePath {
    segments: Vec<CacheKey>,
}

impl CachePath {
    /// The empty path, used by top-level kinds.
    pub fn root() -> Self {
        Self::default()
    }

    /// A single-segment path.
    pub fn of<K: Kind>(id: Id) -> Self {
        Self::root().with::<K>(id)
    }

    /// Returns a copy of this path extended by one segment.
    pub fn with<K: Kind>(&self, id: Id) -> Self {
        self.with_key(CacheKey::of::<K>(id))
    }

    pub fn with_key(&self, key: CacheKey) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key);
        Self { segments }
    }

    /// The id recorded for `K`, if any. Inner segments shadow outer ones.
    pub fn get<K: Kind>(&self) -> Option<Id> {
        self.segments
            .iter()
            .rev()
            .find(|key| key.kind == K::NAME)
            .map(|key| key.id)
    }

    /// Like [`get`](Self::get), but reports which entity needed the parent.
    pub fn require<P: Kind>(&self, kind: &'static str, id: Id) -> Result<Id, FrameworkError> {
        self.get::<P>().ok_or(FrameworkError::MissingPath {
            kind,
            id,
            parent: P::NAME,
        })
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.segments.contains(key)
    }

    /// Whether this path is `other` plus at least one more segment.
    pub fn extends(&self, other: &CachePath) -> bool {
        self.segments.len() > other.segments.len() && self.segments.starts_with(&other.segments)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CacheKey> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl Display for CachePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for key in &self.segments {
            write!(f, "/{key}")?;
        }
        Ok(())
    }
}
