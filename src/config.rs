//! Relay configuration
//!
//! Loaded from a JSON file named by `CHAT_RELAY_CONFIG`; every field has a
//! default so an empty object (or no file at all) is a valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::RelayError;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "CHAT_RELAY_CONFIG";

/// Default listen address
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// How the broadcast engine is woken up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Wake as soon as a message is enqueued
    Notify,
    /// Check the queue on a fixed interval
    Poll { interval_ms: u64 },
}

impl Activation {
    /// Polling interval, if any
    pub fn poll_interval(&self) -> Option<Duration> {
        match self {
            Activation::Notify => None,
            Activation::Poll { interval_ms } => Some(Duration::from_millis(*interval_ms)),
        }
    }
}

/// What a broadcast pass does when one recipient cannot be written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Abort the pass and stop the broadcast engine
    FailFast,
    /// Log the failed recipient and keep delivering to the rest
    Continue,
}

/// Relay configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Transport listen address
    pub bind_addr: String,

    /// Broadcast engine wake-up mode
    pub activation: Activation,

    /// Per-recipient write failure handling
    pub delivery: DeliveryPolicy,

    /// Capacity of each client's outbound channel (non-zero)
    pub outbound_buffer: usize,

    /// Capacity of the shared inbound channel (non-zero)
    pub inbound_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            activation: Activation::Notify,
            delivery: DeliveryPolicy::FailFast,
            outbound_buffer: 32,
            inbound_buffer: 256,
        }
    }
}

impl RelayConfig {
    /// Parse and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, RelayError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime cannot work with
    ///
    /// A zero polling interval or a zero channel capacity would panic
    /// inside tokio when the relay starts.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.activation.poll_interval() == Some(Duration::ZERO) {
            return Err(RelayError::InvalidConfig("poll interval_ms must be non-zero".to_string()));
        }
        if self.outbound_buffer == 0 {
            return Err(RelayError::InvalidConfig("outbound_buffer must be non-zero".to_string()));
        }
        if self.inbound_buffer == 0 {
            return Err(RelayError::InvalidConfig("inbound_buffer must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Read, parse and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load the file named by `CHAT_RELAY_CONFIG`, or the defaults when unset
    pub fn load() -> Result<Self, RelayError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_file(path),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Set the bind address
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Set the activation mode
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Set the delivery policy
    pub fn with_delivery(mut self, delivery: DeliveryPolicy) -> Self {
        self.delivery = delivery;
        self
    }

    /// Set the outbound channel capacity
    pub fn with_outbound_buffer(mut self, capacity: usize) -> Self {
        self.outbound_buffer = capacity;
        self
    }

    /// Set the inbound channel capacity
    pub fn with_inbound_buffer(mut self, capacity: usize) -> Self {
        self.inbound_buffer = capacity;
        self
    }
}
