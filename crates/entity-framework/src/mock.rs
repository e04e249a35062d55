//! # Mock Transport
//!
//! A scripted [`RestTransport`] for testing actors and kinds without a network.
//!
//! Expectations are consumed in order. Each one names the method and path it
//! expects and the reply to give; a request that does not match the next
//! expectation fails with a transport error naming both.
//!
//! ```rust
//! use entity_framework::mock::MockTransport;
//! use entity_framework::transport::HttpMethod;
//! use serde_json::json;
//!
//! let mock = MockTransport::new();
//! mock.expect(HttpMethod::Get, "/guilds/1").return_ok(json!({ "id": "1" }));
//! mock.expect(HttpMethod::Delete, "/guilds/1").return_none();
//! // hand `Arc::new(mock.clone())` to a Client, run the code under test...
//! # mock.clear();
//! mock.verify(); // panics if expectations remain
//! ```

use crate::error::TransportError;
use crate::transport::{HttpMethod, RawModel, RequestOptions, RestRequest, RestTransport};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

enum Reply {
    Model(RawModel),
    Nothing,
    Failure(String),
}

struct Expectation {
    method: HttpMethod,
    path: String,
    reply: Reply,
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    requests: Vec<RestRequest>,
}

/// Scripted transport. Clones share their expectations and request log.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects the next request to be `method path`.
    pub fn expect(&self, method: HttpMethod, path: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            method,
            path: path.into(),
            gate: None,
            delay: None,
            state: self.state.clone(),
        }
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<RestRequest> {
        self.state.lock().requests.clone()
    }

    pub fn remaining(&self) -> usize {
        self.state.lock().expectations.len()
    }

    /// Drops all outstanding expectations.
    pub fn clear(&self) {
        self.state.lock().expectations.clear();
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = self.remaining();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

/// Builder returned by [`MockTransport::expect`].
pub struct ExpectationBuilder {
    method: HttpMethod,
    path: String,
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
    state: Arc<Mutex<MockState>>,
}

impl ExpectationBuilder {
    /// Holds the reply until `gate` is notified.
    pub fn after(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Sleeps for `delay` before replying.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn return_ok(self, model: RawModel) {
        self.push(Reply::Model(model));
    }

    /// Replies with no body, like a 404 or a 204.
    pub fn return_none(self) {
        self.push(Reply::Nothing);
    }

    pub fn return_err(self, message: impl Into<String>) {
        self.push(Reply::Failure(message.into()));
    }

    fn push(self, reply: Reply) {
        self.state.lock().expectations.push_back(Expectation {
            method: self.method,
            path: self.path,
            reply,
            gate: self.gate,
            delay: self.delay,
        });
    }
}

#[async_trait]
impl RestTransport for MockTransport {
    async fn send(
        &self,
        request: RestRequest,
        _options: &RequestOptions,
    ) -> Result<Option<RawModel>, TransportError> {
        let expectation = {
            let mut state = self.state.lock();
            state.requests.push(request.clone());
            state.expectations.pop_front()
        };

        let Some(expectation) = expectation else {
            return Err(format!("unexpected request: {}", request.route).into());
        };
        if expectation.method != request.route.method || expectation.path != request.route.path {
            return Err(format!(
                "expected {} {}, got {}",
                expectation.method, expectation.path, request.route
            )
            .into());
        }

        if let Some(gate) = expectation.gate {
            gate.notified().await;
        }
        if let Some(delay) = expectation.delay {
            tokio::time::sleep(delay).await;
        }

        match expectation.reply {
            Reply::Model(model) => Ok(Some(model)),
            Reply::Nothing => Ok(None),
            Reply::Failure(message) => Err(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Route;
    use serde_json::json;

    fn get(path: &str) -> RestRequest {
        RestRequest::new(Route::get(path))
    }

    #[tokio::test]
    async fn test_replies_in_order() {
        let mock = MockTransport::new();
        mock.expect(HttpMethod::Get, "/a").return_ok(json!(1));
        mock.expect(HttpMethod::Get, "/b").return_none();

        let options = RequestOptions::default();
        assert_eq!(mock.send(get("/a"), &options).await.unwrap(), Some(json!(1)));
        assert_eq!(mock.send(get("/b"), &options).await.unwrap(), None);
        mock.verify();
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mismatch_and_unexpected_fail() {
        let mock = MockTransport::new();
        mock.expect(HttpMethod::Delete, "/a").return_none();

        let options = RequestOptions::default();
        let err = mock.send(get("/a"), &options).await.unwrap_err();
        assert_eq!(err.to_string(), "expected DELETE /a, got GET /a");

        let err = mock.send(get("/a"), &options).await.unwrap_err();
        assert_eq!(err.to_string(), "unexpected request: GET /a");
    }

    #[tokio::test]
    #[should_panic(expected = "Not all expectations were met. 1 remaining")]
    async fn test_verify_panics_on_leftovers() {
        let mock = MockTransport::new();
        mock.expect(HttpMethod::Get, "/a").return_err("boom");
        mock.verify();
    }
}
