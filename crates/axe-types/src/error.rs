//! Error types for the AXE SDK

use std::time::Duration;
use thiserror::Error;

/// Main error type for AXE SDK operations
#[derive(Error, Debug)]
pub enum AxeError {
    // === Codec Errors ===
    /// Unknown type tag encountered while decoding or splitting a packet.
    ///
    /// This aborts the whole decode: a single unrecognized byte desynchronizes
    /// the fixed-width framing of everything after it, so skipping is not a
    /// recovery option.
    #[error("unsupported message type {tag:?} at byte {offset}")]
    UnsupportedMessageType { tag: char, offset: usize },

    /// A field failed validation at encode time
    #[error("cannot encode field {field}: {reason}")]
    Encoding { field: &'static str, reason: String },

    /// Buffer ended in the middle of a declared frame
    #[error("truncated packet: type {tag:?} frame needs {expected} bytes, {remaining} remain")]
    Truncated {
        tag: char,
        expected: usize,
        remaining: usize,
    },

    // === Session Errors ===
    /// Transport failure that survived the single reconnect-and-resend attempt
    #[error("connection to {endpoint} failed: {reason}")]
    Connection { endpoint: String, reason: String },

    /// No acknowledgement decoded within the overall deadline
    #[error("no acknowledgement within {timeout:?}")]
    AckTimeout { timeout: Duration },

    /// Operation attempted in the wrong session state
    #[error("invalid session state: expected {expected}, got {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },
}

impl AxeError {
    /// Returns true if this error is potentially recoverable by retrying the
    /// same logical call.
    ///
    /// Note that retrying after [`AxeError::AckTimeout`] can double-submit an
    /// order: the protocol has no client-side idempotency key before the
    /// server assigns an order number, so the retry decision is left to the
    /// caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AckTimeout { .. } | Self::Connection { .. })
    }

    /// Returns true if this error indicates the transport must be rebuilt
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Create a connection error
    pub fn connection(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Create an encode-time field error
    pub fn encoding(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Encoding {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for AXE operations
pub type AxeResult<T> = Result<T, AxeError>;
