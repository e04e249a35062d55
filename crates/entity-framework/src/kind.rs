//! # Kind Trait
//!
//! The `Kind` trait is the contract every cacheable object type (guild, role,
//! user, ...) implements to be managed by the generic [`Cache`](crate::cache::Cache).
//! It ties together the wire model, the derived state computed from it, and the
//! REST routes used to fetch or mutate it.
//!
//! # Architecture Note
//! The engine (identity, actor cells, pending slots, the cache map, the fold
//! protocol) is written *once*, generically over `K: Kind`. A kind only says
//! "this model builds that entity" through [`Kind::derive`]; it never touches
//! locks, weak references or stamps.
//!
//! ```rust,ignore
//! impl Kind for Role {
//!     const NAME: &'static str = "role";
//!     type Model = RoleModel;
//!     type Derived = RoleLinks;
//!
//!     fn derive(ctx: &ConstructionContext<'_, Self>, model: &RoleModel) -> Result<RoleLinks, FrameworkError> {
//!         let guild_id = ctx.path().require::<Guild>(Self::NAME, model.id)?;
//!         Ok(RoleLinks { guild: ctx.actor_of::<Guild>(CachePath::root(), guild_id) })
//!     }
//!
//!     fn fetch_route(path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
//!         let guild_id = path.require::<Guild>(Self::NAME, id)?;
//!         Ok(Route::get(format!("/guilds/{guild_id}/roles/{id}")))
//!     }
//! }
//! ```

use crate::entity::ConstructionContext;
use crate::error::FrameworkError;
use crate::id::Id;
use crate::model::EntityModel;
use crate::path::{CacheKey, CachePath};
use crate::transport::Route;

/// Trait that any entity type must implement to be managed by the cache.
pub trait Kind: Sized + Send + Sync + 'static {
    /// Stable name of the kind. Part of every [`CacheKey`](crate::path::CacheKey).
    const NAME: &'static str;

    /// The decoded wire snapshot.
    type Model: EntityModel;

    /// State computed from the model and its construction context, such as actors
    /// for referenced entities. Recomputed whenever an update is routed through the
    /// cache. Use `()` if the kind has none.
    type Derived: Clone + Send + Sync + 'static;

    /// Computes derived state. Must be pure: no I/O, no blocking.
    fn derive(
        ctx: &ConstructionContext<'_, Self>,
        model: &Self::Model,
    ) -> Result<Self::Derived, FrameworkError>;

    /// Parent whose ids partition this kind. Ids are client-wide by default;
    /// a kind keyed by something only unique inside a parent (a ban is keyed by
    /// the banned user) returns that parent's key from `path`, and each parent
    /// then gets its own actor for the same id.
    fn scope(_path: &CachePath) -> Option<CacheKey> {
        None
    }

    /// Route used by [`Actor::fetch`](crate::actor::Actor::fetch).
    fn fetch_route(path: &CachePath, id: Id) -> Result<Route, FrameworkError>;

    /// Route used by [`Actor::modify`](crate::actor::Actor::modify).
    fn modify_route(_path: &CachePath, _id: Id) -> Result<Route, FrameworkError> {
        Err(FrameworkError::Unsupported {
            kind: Self::NAME,
            operation: "modify",
        })
    }

    /// Route used by [`Actor::delete`](crate::actor::Actor::delete).
    fn delete_route(_path: &CachePath, _id: Id) -> Result<Route, FrameworkError> {
        Err(FrameworkError::Unsupported {
            kind: Self::NAME,
            operation: "delete",
        })
    }
}
