//! # Gateway Dispatch
//!
//! Push events must reach the cache in the order they were received, and the
//! caller must learn what became of them. The [`GatewayDispatcher`] is a single
//! task draining a bounded queue: one event is fully folded before the next one
//! starts, and a full queue makes senders wait instead of dropping events.
//!
//! ## Flow
//!
//! 1. [`DispatchClient::dispatch`] stamps the event (receipt order) and enqueues it.
//!    Stamping and enqueueing happen under one lock, so concurrent senders
//!    never queue an event behind one with a newer stamp.
//! 2. The dispatcher hands it to the [`DispatchHandler`], which decodes the payload
//!    and delivers models to actors under that stamp.
//! 3. The resulting [`DispatchReport`] goes back over a oneshot channel.
//!
//! A handler failure is logged and reported to the caller; it does not stop the
//! loop.

use crate::actor::DeliveryOutcome;
use crate::client::{Client, ClientRef};
use crate::error::FrameworkError;
use crate::path::CacheKey;
use crate::stamp::Stamp;
use crate::transport::RawModel;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Type alias for the one-shot response channel used by the dispatcher.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// One push event as received from the Gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayEvent {
    /// Event name, e.g. `GUILD_UPDATE`.
    pub name: String,
    #[serde(default)]
    pub sequence: Option<u64>,
    pub payload: RawModel,
}

impl GatewayEvent {
    pub fn new(name: impl Into<String>, payload: RawModel) -> Self {
        Self {
            name: name.into(),
            sequence: None,
            payload,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }
}

/// What one event did to the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub event: String,
    /// Stamp every delivery of this event was issued under.
    pub stamp: Stamp,
    pub deliveries: Vec<(CacheKey, DeliveryOutcome)>,
    pub evicted: Vec<CacheKey>,
    /// Set when the handler does not know the event.
    pub ignored: bool,
}

impl DispatchReport {
    pub fn new(event: impl Into<String>, stamp: Stamp) -> Self {
        Self {
            event: event.into(),
            stamp,
            deliveries: Vec::new(),
            evicted: Vec::new(),
            ignored: false,
        }
    }

    pub fn record(&mut self, key: CacheKey, outcome: DeliveryOutcome) {
        self.deliveries.push((key, outcome));
    }

    pub fn record_eviction(&mut self, key: CacheKey) {
        self.evicted.push(key);
    }

    pub fn ignore(&mut self) {
        self.ignored = true;
    }

    /// Outcome of the last delivery to `key` in this event.
    pub fn outcome_for(&self, key: &CacheKey) -> Option<DeliveryOutcome> {
        self.deliveries
            .iter()
            .rev()
            .find(|(delivered, _)| delivered == key)
            .map(|(_, outcome)| *outcome)
    }
}

/// Decodes events and delivers their models to the cache.
#[async_trait]
pub trait DispatchHandler: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn handle(
        &self,
        client: &Client,
        event: &GatewayEvent,
        report: &mut DispatchReport,
    ) -> Result<(), Self::Error>;
}

#[derive(Debug)]
pub enum DispatchRequest {
    Event {
        event: GatewayEvent,
        stamp: Stamp,
        respond_to: Option<Response<DispatchReport>>,
    },
}

/// Single consumer of the dispatch queue.
pub struct GatewayDispatcher<H: DispatchHandler> {
    receiver: mpsc::Receiver<DispatchRequest>,
    client: Client,
    handler: H,
}

impl<H: DispatchHandler> GatewayDispatcher<H> {
    /// Creates the dispatcher and its sending half. The queue holds
    /// `client.config().dispatch_buffer` events.
    pub fn new(client: Client, handler: H) -> (Self, DispatchClient) {
        let (sender, receiver) = mpsc::channel(client.config().dispatch_buffer.max(1));
        let dispatch_client = DispatchClient {
            sender,
            client: client.downgrade(),
            order: Arc::new(Mutex::new(())),
        };
        let dispatcher = Self {
            receiver,
            client,
            handler,
        };
        (dispatcher, dispatch_client)
    }

    /// Processes events until every [`DispatchClient`] is dropped.
    pub async fn run(mut self) {
        info!("Dispatcher started");
        let mut processed: u64 = 0;
        let mut failed: u64 = 0;

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                DispatchRequest::Event {
                    event,
                    stamp,
                    respond_to,
                } => {
                    debug!(event = %event.name, sequence = ?event.sequence, stamp = stamp.get(), "Dispatch");
                    let mut report = DispatchReport::new(event.name.clone(), stamp);
                    let handled = self.handler.handle(&self.client, &event, &mut report).await;
                    let result = handled
                        .map(|()| report)
                        .map_err(|e| FrameworkError::Dispatch(Box::new(e)));

                    match &result {
                        Ok(report) if report.ignored => {
                            processed += 1;
                            debug!(event = %event.name, "Ignored");
                        }
                        Ok(report) => {
                            processed += 1;
                            debug!(
                                event = %event.name,
                                deliveries = report.deliveries.len(),
                                evicted = report.evicted.len(),
                                "Applied"
                            );
                        }
                        Err(e) => {
                            failed += 1;
                            warn!(event = %event.name, error = %e, "Dispatch failed");
                        }
                    }

                    if let Some(respond_to) = respond_to {
                        let _ = respond_to.send(result);
                    }
                }
            }
        }

        info!(processed, failed, "Shutdown");
    }
}

/// Sending half of the dispatch queue. Cheap to clone.
#[derive(Clone)]
pub struct DispatchClient {
    sender: mpsc::Sender<DispatchRequest>,
    client: ClientRef,
    /// Shared by every clone; held while stamping and enqueueing.
    order: Arc<Mutex<()>>,
}

impl DispatchClient {
    /// Waits for queue capacity, then stamps and enqueues `event` in one step.
    async fn enqueue(
        &self,
        event: GatewayEvent,
        respond_to: Option<Response<DispatchReport>>,
    ) -> Result<(), FrameworkError> {
        let permit = self
            .sender
            .reserve()
            .await
            .map_err(|_| FrameworkError::DispatcherClosed)?;
        let client = self.client.upgrade().ok_or(FrameworkError::ClientDropped)?;
        {
            let _order = self.order.lock();
            permit.send(DispatchRequest::Event {
                event,
                stamp: client.next_stamp(),
                respond_to,
            });
        }
        Ok(())
    }

    /// Enqueues `event` and waits for its report.
    pub async fn dispatch(&self, event: GatewayEvent) -> Result<DispatchReport, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.enqueue(event, Some(respond_to)).await?;
        response.await.map_err(|_| FrameworkError::DispatcherDropped)?
    }

    /// Enqueues `event` without waiting for it to be processed.
    pub async fn submit(&self, event: GatewayEvent) -> Result<(), FrameworkError> {
        self.enqueue(event, None).await
    }
}
