//! # Entity Framework
//!
//! The identity, caching and update-propagation engine of a chat-platform client.
//! Remote objects (guilds, channels, roles, users, ...) are observed through two
//! channels that race each other: REST calls issued by the application and push
//! events from a persistent Gateway connection. This crate keeps exactly one live
//! object per remote id and folds both streams into it, newest first.
//!
//! ## Core Abstractions
//!
//! - [`Kind`] - what a cacheable type is: its wire model, derived state and routes
//! - [`EntityModel`] - a decoded wire snapshot that knows how to fold a delta
//! - [`Entity`] - the materialized object; owns the current model
//! - [`Actor`] - a handle for an id, loaded or not; the only way to do I/O
//! - [`Identity`] - a kind-tagged id with optional shortcuts to entity and actor
//! - [`Cache`] - the identity map; holds actors strongly and entities weakly
//! - [`Client`] - owns the cache, the transport and the stamp clock
//! - [`GatewayDispatcher`] - ordered, bounded delivery of push events
//!
//! ## Ownership
//!
//! ```text
//! Client ──> Cache ──> ActorCell ──(weak)──> Entity
//!                          │
//!                          └──> PendingModelSlot, traits
//! Application ──(Arc)──> Entity ──(weak)──> Client
//! ```
//!
//! Nothing inside the cache keeps an entity alive. Drop every `Arc<Entity<_>>`
//! and the entity is gone; the next fetch or push rebuilds it.
//!
//! ## Ordering
//!
//! Every model is stamped when issued (REST: at request time, Gateway: at
//! receipt). Folds carrying an older stamp than the entity's are discarded, so a
//! slow fetch never overwrites a newer push.
//!
//! ## Quick Start
//!
//! ```rust
//! use entity_framework::fixtures::{fixture_client, folder_path, note, Note};
//! use entity_framework::{Field, Id};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (client, _mock) = fixture_client();
//! let actor = client.actor::<Note>(folder_path(1), Id(7));
//!
//! // A push arrives before anybody looked at the note: it is buffered.
//! actor.deliver_model(note(7, "draft")).unwrap();
//!
//! // The first local access materializes it.
//! let entity = actor.try_get_precached_entity().unwrap();
//! assert_eq!(entity.current_model().title, Field::Specified("draft".to_string()));
//! # }
//! ```

pub mod actor;
pub mod cache;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod field;
pub mod fixtures;
pub mod id;
pub mod identity;
pub mod kind;
pub mod mock;
pub mod model;
pub mod path;
pub mod slot;
pub mod stamp;
pub mod telemetry;
pub mod traits;
pub mod transport;

pub use actor::{Actor, DeliveryOutcome};
pub use cache::{Cache, CacheStats};
pub use client::{Client, ClientRef};
pub use config::ClientConfig;
pub use dispatch::{
    DispatchClient, DispatchHandler, DispatchReport, GatewayDispatcher, GatewayEvent,
};
pub use entity::{ConstructionContext, Entity, FoldOutcome};
pub use error::{FrameworkError, TransportError};
pub use field::Field;
pub use id::Id;
pub use identity::{DetailLevel, Identity};
pub use kind::Kind;
pub use model::EntityModel;
pub use path::{CacheKey, CachePath};
pub use slot::PendingModelSlot;
pub use stamp::{Stamp, Stamped};
pub use traits::TraitKey;
pub use transport::{CancelToken, HttpMethod, RawModel, RequestOptions, RestRequest, RestTransport, Route};
