//! # Client Configuration
//!
//! Defaults are sensible for tests and small bots. [`ClientConfig::from_env`]
//! overrides them from the environment:
//!
//! | Variable                   | Field                                |
//! |----------------------------|--------------------------------------|
//! | `ENTITY_DISPATCH_BUFFER`   | `dispatch_buffer`                    |
//! | `ENTITY_REQUEST_TIMEOUT_MS`| `default_request_options.timeout`    |
//!
//! Malformed values are logged and ignored.

use crate::transport::RequestOptions;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::warn;

pub const DISPATCH_BUFFER_VAR: &str = "ENTITY_DISPATCH_BUFFER";
pub const REQUEST_TIMEOUT_VAR: &str = "ENTITY_REQUEST_TIMEOUT_MS";

const DEFAULT_DISPATCH_BUFFER: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Capacity of the Gateway dispatch queue. Senders wait when it is full.
    pub dispatch_buffer: usize,
    /// Options used for requests issued without explicit ones.
    pub default_request_options: RequestOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dispatch_buffer: DEFAULT_DISPATCH_BUFFER,
            default_request_options: RequestOptions::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(DISPATCH_BUFFER_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(buffer) if buffer > 0 => config.dispatch_buffer = buffer,
                _ => warn!(variable = DISPATCH_BUFFER_VAR, value = %raw, "Ignoring invalid dispatch buffer"),
            }
        }

        if let Some(raw) = lookup(REQUEST_TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(millis) => {
                    config.default_request_options.timeout = Some(Duration::from_millis(millis))
                }
                Err(e) => warn!(variable = REQUEST_TIMEOUT_VAR, value = %raw, error = %e, "Ignoring invalid request timeout"),
            }
        }

        config
    }

    pub fn with_dispatch_buffer(mut self, buffer: usize) -> Self {
        self.dispatch_buffer = buffer.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.default_request_options.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.dispatch_buffer, 256);
        assert_eq!(config.default_request_options.timeout, None);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (DISPATCH_BUFFER_VAR, "16"),
            (REQUEST_TIMEOUT_VAR, "1500"),
        ]));
        assert_eq!(config.dispatch_buffer, 16);
        assert_eq!(
            config.default_request_options.timeout,
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[
            (DISPATCH_BUFFER_VAR, "0"),
            (REQUEST_TIMEOUT_VAR, "soon"),
        ]));
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ClientConfig = serde_json::from_str(r#"{ "dispatch_buffer": 8 }"#).unwrap();
        assert_eq!(config.dispatch_buffer, 8);
        assert_eq!(config.default_request_options, RequestOptions::default());
    }
}
