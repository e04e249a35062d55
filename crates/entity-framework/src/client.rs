//! # Client
//!
//! The [`Client`] owns the cache, the REST transport, the configuration and the
//! stamp clock. It is cheap to clone; all clones share one instance.
//!
//! Actors and entities only keep a [`ClientRef`] (a weak handle) so that
//! dropping the last `Client` tears the whole graph down. Operations attempted
//! afterwards fail with [`FrameworkError::ClientDropped`].

use crate::actor::Actor;
use crate::cache::Cache;
use crate::config::ClientConfig;
use crate::entity::Entity;
use crate::error::FrameworkError;
use crate::id::Id;
use crate::kind::Kind;
use crate::path::CachePath;
use crate::stamp::{Stamp, StampClock};
use crate::transport::{CancelToken, RawModel, RequestOptions, RestRequest, RestTransport};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

struct ClientShared {
    cache: Cache,
    rest: Arc<dyn RestTransport>,
    config: ClientConfig,
    clock: StampClock,
}

/// Entry point of the engine.
#[derive(Clone)]
pub struct Client {
    shared: Arc<ClientShared>,
}

/// Weak handle to a [`Client`].
#[derive(Clone, Default)]
pub struct ClientRef {
    shared: Weak<ClientShared>,
}

impl ClientRef {
    pub fn upgrade(&self) -> Option<Client> {
        self.shared.upgrade().map(|shared| Client { shared })
    }
}

impl fmt::Debug for ClientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRef")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl Client {
    pub fn new(rest: Arc<dyn RestTransport>, config: ClientConfig) -> Self {
        Self {
            shared: Arc::new(ClientShared {
                cache: Cache::new(),
                rest,
                config,
                clock: StampClock::new(),
            }),
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.shared.cache
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Issues the next delivery stamp.
    pub fn next_stamp(&self) -> Stamp {
        self.shared.clock.issue()
    }

    pub fn downgrade(&self) -> ClientRef {
        ClientRef {
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn ptr_eq(&self, other: &Client) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// The actor for `(K, id)`, created on first use.
    pub fn actor<K: Kind>(&self, path: CachePath, id: Id) -> Actor<K> {
        self.cache().actor::<K>(self, path, id)
    }

    /// The live cached entity for `(K, id)`, if any.
    pub fn lookup<K: Kind>(&self, id: Id) -> Option<Arc<Entity<K>>> {
        self.cache().lookup::<K>(id)
    }

    /// The live cached entity for `id` under the parent named in `path`. See
    /// [`Kind::scope`].
    pub fn lookup_in<K: Kind>(&self, path: &CachePath, id: Id) -> Option<Arc<Entity<K>>> {
        self.cache().lookup_in::<K>(path, id)
    }

    /// Materializes `model` into the cache. See [`Cache::create_latent`].
    pub fn create_latent<K: Kind>(
        &self,
        model: K::Model,
        path: &CachePath,
    ) -> Result<Arc<Entity<K>>, FrameworkError> {
        self.cache().create_latent::<K>(self, None, model, path)
    }

    /// Sends `request` through the transport.
    ///
    /// `options` falls back to the configured defaults. `cancel` aborts the wait
    /// for the response; the transport's own future is dropped.
    pub async fn send(
        &self,
        request: RestRequest,
        options: Option<&RequestOptions>,
        cancel: Option<&CancelToken>,
    ) -> Result<Option<RawModel>, FrameworkError> {
        let options = options.unwrap_or(&self.shared.config.default_request_options);
        let route = request.route.clone();

        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(FrameworkError::Cancelled);
        }

        let response = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(%route, "Request cancelled");
                    return Err(FrameworkError::Cancelled);
                }
                response = self.shared.rest.send(request, options) => response,
            },
            None => self.shared.rest.send(request, options).await,
        };

        response.map_err(|e| {
            warn!(%route, error = %e, "Request failed");
            FrameworkError::Transport(e)
        })
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("cache", &self.shared.cache)
            .field("config", &self.shared.config)
            .field("stamp", &self.shared.clock.current())
            .finish_non_exhaustive()
    }
}

/// Decodes a raw response body into `K`'s model.
pub(crate) fn decode<K: Kind>(raw: RawModel) -> Result<K::Model, FrameworkError> {
    serde_json::from_value(raw).map_err(|source| FrameworkError::Decode {
        kind: K::NAME,
        source,
    })
}
