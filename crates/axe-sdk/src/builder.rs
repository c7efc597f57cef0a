//! Client builder
//!
//! Fluent configuration for [`AxeClient`] with sensible defaults and
//! validation before any socket is opened.
//!
//! # Example
//!
//! ```
//! use axe_sdk::builder::AxeClientBuilder;
//! use std::time::Duration;
//!
//! let builder = AxeClientBuilder::new("127.0.0.1:9995")
//!     .with_ack_timeout(Duration::from_secs(3))
//!     .with_connect_timeout(Duration::from_secs(5));
//! ```

use crate::client::AxeClient;
use crate::journal::{Journal, MemoryJournal};
use axe_session::{ResendPolicy, Session, SessionConfig, TcpTransport, Transport};
use std::sync::Arc;
use std::time::Duration;

/// Configuration validation error
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// No endpoint specified
    #[error("endpoint must not be empty")]
    EmptyEndpoint,

    /// Ack deadline of zero can never be met
    #[error("ack timeout must be non-zero")]
    ZeroAckTimeout,

    /// A poll longer than the overall deadline makes the deadline moot
    #[error("poll timeout must not exceed the ack timeout")]
    PollExceedsAckTimeout,

    /// Timeout too short
    #[error("connection timeout must be at least 1 second")]
    TimeoutTooShort,
}

/// Builder for configuring an [`AxeClient`]
pub struct AxeClientBuilder {
    /// Exchange endpoint, `host:port`
    pub endpoint: String,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Overall deadline for the ack after a send
    pub ack_timeout: Duration,

    /// Upper bound on a single blocking read
    pub poll_timeout: Duration,

    /// Backoff policy for the transparent resend
    pub resend_policy: ResendPolicy,

    /// Journal backing store (in-memory by default)
    pub journal: Arc<dyn Journal>,
}

impl AxeClientBuilder {
    /// Create a builder targeting `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Self {
        let session = SessionConfig::default();
        Self {
            endpoint: endpoint.into(),
            connect_timeout: Duration::from_secs(10),
            ack_timeout: session.ack_timeout,
            poll_timeout: session.poll_timeout,
            resend_policy: ResendPolicy::default(),
            journal: Arc::new(MemoryJournal::new()),
        }
    }

    /// Set the TCP connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the ack deadline
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Set the per-read timeout
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set the resend backoff policy
    pub fn with_resend_policy(mut self, policy: ResendPolicy) -> Self {
        self.resend_policy = policy;
        self
    }

    /// Use a specific journal backing store
    pub fn with_journal(mut self, journal: Arc<dyn Journal>) -> Self {
        self.journal = journal;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if self.ack_timeout.is_zero() {
            return Err(ConfigError::ZeroAckTimeout);
        }
        if self.poll_timeout > self.ack_timeout {
            return Err(ConfigError::PollExceedsAckTimeout);
        }
        if self.connect_timeout < Duration::from_secs(1) {
            return Err(ConfigError::TimeoutTooShort);
        }
        Ok(())
    }

    /// Build a client over a real TCP transport
    ///
    /// Connection happens lazily on the first send.
    pub fn build(self) -> Result<AxeClient<TcpTransport>, ConfigError> {
        self.validate()?;
        let transport =
            TcpTransport::new(self.endpoint.clone()).with_timeout(self.connect_timeout);
        Ok(self.assemble(transport))
    }

    /// Build a client over an injected transport, for tests
    pub fn build_with_transport<T: Transport>(
        self,
        transport: T,
    ) -> Result<AxeClient<T>, ConfigError> {
        if self.ack_timeout.is_zero() {
            return Err(ConfigError::ZeroAckTimeout);
        }
        if self.poll_timeout > self.ack_timeout {
            return Err(ConfigError::PollExceedsAckTimeout);
        }
        Ok(self.assemble(transport))
    }

    fn assemble<T: Transport>(self, transport: T) -> AxeClient<T> {
        let session_config = SessionConfig::new()
            .with_ack_timeout(self.ack_timeout)
            .with_poll_timeout(self.poll_timeout)
            .with_resend_policy(self.resend_policy);
        AxeClient::from_parts(Session::new(transport, session_config), self.journal)
    }
}
