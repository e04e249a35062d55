//! # REST Transport Seam
//!
//! The HTTP client, its per-route rate limiter and its 429 backoff live outside
//! this crate. The cache only needs an asynchronous "send this request, give me a
//! decoded JSON body or nothing" operation, which is what [`RestTransport`]
//! describes. Retries, if any, belong to the transport.

use crate::error::TransportError;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::{self, Display};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// A decoded-but-untyped response body.
pub type RawModel = serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Method and path of one REST endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
}

impl Route {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// A route plus an optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub route: Route,
    pub body: Option<RawModel>,
}

impl RestRequest {
    pub fn new(route: Route) -> Self {
        Self { route, body: None }
    }

    pub fn with_body(route: Route, body: RawModel) -> Self {
        Self {
            route,
            body: Some(body),
        }
    }
}

/// Per-request knobs passed through to the transport untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Upper bound the transport should apply to the whole request, including any
    /// rate-limit wait.
    pub timeout: Option<Duration>,
    /// Reason recorded in the guild audit log for mutating requests.
    pub audit_log_reason: Option<String>,
}

/// Asynchronous request/response transport.
#[async_trait]
pub trait RestTransport: Send + Sync + 'static {
    /// Sends `request`. `Ok(None)` means the resource does not exist (a 404) or the
    /// endpoint returned no body.
    async fn send(
        &self,
        request: RestRequest,
        options: &RequestOptions,
    ) -> Result<Option<RawModel>, TransportError>;
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation signal for transport calls.
///
/// Honored only while a request is in flight: once a model has been obtained
/// the in-memory fold always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let notified = self.state.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel is not missed.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}
