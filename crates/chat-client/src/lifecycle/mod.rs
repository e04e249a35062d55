//! # System Lifecycle
//!
//! Wires the pieces of a running chat client together:
//!
//! 1. **Client** - the cache and the REST transport, shared by everything else
//! 2. **Dispatcher** - the single task folding Gateway events into the cache
//! 3. **Shutdown** - closing the dispatch queue and waiting for the task
//!
//! ```rust,ignore
//! let system = ChatSystem::new(transport, ClientConfig::from_env());
//! system.dispatch.dispatch(event).await?;
//! system.shutdown().await?;
//! ```
//!
//! ## Graceful Shutdown
//!
//! The dispatcher stops when the last [`DispatchClient`] is dropped. Events
//! already queued are still processed before the task ends, so no accepted
//! event is lost. Clones of the dispatch handle held elsewhere keep the
//! dispatcher alive and delay shutdown.

use crate::gateway::ChatDispatchHandler;
use entity_framework::{Client, ClientConfig, DispatchClient, GatewayDispatcher, RestTransport};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// A client plus its running Gateway dispatcher.
pub struct ChatSystem {
    pub client: Client,
    pub dispatch: DispatchClient,
    dispatcher: JoinHandle<()>,
}

impl ChatSystem {
    /// Builds the client and spawns its dispatcher. Must be called inside a
    /// Tokio runtime.
    pub fn new(rest: Arc<dyn RestTransport>, config: ClientConfig) -> Self {
        let client = Client::new(rest, config);
        let (dispatcher, dispatch) = GatewayDispatcher::new(client.clone(), ChatDispatchHandler);
        let dispatcher = tokio::spawn(dispatcher.run());
        info!(dispatch_buffer = client.config().dispatch_buffer, "Chat system started");

        Self {
            client,
            dispatch,
            dispatcher,
        }
    }

    /// Closes the dispatch queue and waits for queued events to drain.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down chat system");
        drop(self.dispatch);
        self.dispatcher
            .await
            .map_err(|e| format!("Dispatcher task failed: {e}"))?;
        info!(stats = %self.client.cache().stats(), "Chat system stopped");
        Ok(())
    }
}
