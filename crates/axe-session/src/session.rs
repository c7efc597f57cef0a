//! Order session over a [`Transport`]
//!
//! One session per exchange connection. The send path is exactly-once: a
//! frame is written a single time, then the session reads until the matching
//! ack arrives or the ack deadline passes. If the transport fails mid-wait
//! the session transparently reconnects and resends once; a second failure
//! surfaces to the caller, who must decide whether resubmitting is safe.

use crate::resend::ResendPolicy;
use crate::transport::{Transport, TransportError};
use axe_types::{codec, fields, AxeError, AxeResult, Message, ResponseCode};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, instrument, warn};

/// Raw packet that tells the exchange simulator to clear its state
///
/// Not a protocol frame; it bypasses the codec entirely and produces no
/// ledger rows.
pub const RESET_PACKET: &[u8] = b"reset";

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No usable connection
    Disconnected,
    /// Connection attempt in flight
    Connecting,
    /// Connected, nothing sent yet
    Connected,
    /// Instruction sent, waiting for its ack
    AwaitingAck,
    /// At least one exchange completed, ready for the next send
    Idle,
    /// Closed by the caller; terminal
    Closed,
}

impl SessionState {
    /// Short name, used in state-mismatch errors
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::AwaitingAck => "awaiting-ack",
            Self::Idle => "idle",
            Self::Closed => "closed",
        }
    }
}

/// Session tuning knobs
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Overall deadline for the ack after a send
    pub ack_timeout: Duration,
    /// Upper bound on a single blocking read
    pub poll_timeout: Duration,
    /// Backoff policy for the transparent reconnect
    pub resend: ResendPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(5),
            poll_timeout: Duration::from_millis(500),
            resend: ResendPolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
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
        self.resend = policy;
        self
    }
}

/// Outcome of a completed [`Session::send_and_await`]
///
/// "Completed" means an ack arrived; check [`success`](Self::success) for
/// whether the exchange actually accepted the instruction.
#[derive(Debug, Clone)]
pub struct SendResult {
    /// Every message decoded while waiting, in wire order
    pub messages: Vec<Message>,
    /// Server-assigned order number, when the sent instruction had none
    pub order_no: Option<String>,
    /// Response code of the first ack received
    pub response_code: Option<ResponseCode>,
    /// True if any ack carried a success response code
    pub success: bool,
    /// True if the transparent reconnect-and-resend path was taken
    pub reconnected: bool,
}

/// Exchange session bound to a transport
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
    state: SessionState,
}

impl<T: Transport> Session<T> {
    /// Create a session; connection happens lazily on first send
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            state: SessionState::Disconnected,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Endpoint the underlying transport targets
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Direct access to the transport, for test scripting
    #[cfg(any(test, feature = "test-utils"))]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Connect eagerly
    pub async fn connect(&mut self) -> AxeResult<()> {
        if self.state == SessionState::Closed {
            return Err(self.closed_error());
        }
        self.state = SessionState::Connecting;
        if let Err(e) = self.transport.connect().await {
            self.state = SessionState::Disconnected;
            return Err(self.connection_error(e));
        }
        self.state = SessionState::Connected;
        Ok(())
    }

    /// Close the connection; the session cannot be used afterwards
    pub async fn close(&mut self) -> AxeResult<()> {
        let result = self.transport.close().await;
        self.state = SessionState::Closed;
        result.map_err(|e| self.connection_error(e))
    }

    /// Send one instruction and wait for its ack
    ///
    /// The response packet may batch the ack together with fills for earlier
    /// orders; everything decoded before the loop stops is returned so the
    /// caller can fold it all into the ledger. Returns
    /// [`AxeError::AckTimeout`] only when the deadline passes with no ack
    /// seen at all.
    #[instrument(skip(self, message), fields(msg_type = %message.msg_type()))]
    pub async fn send_and_await(&mut self, message: &Message) -> AxeResult<SendResult> {
        let frame = codec::encode(message)?;
        self.ensure_connected().await?;

        let mut reconnected = false;
        if let Err(e) = self.transport.send(&frame).await {
            warn!(error = %e, "send failed; attempting recovery");
            self.recover(&frame).await?;
            reconnected = true;
        }
        self.state = SessionState::AwaitingAck;

        let mut messages = Vec::new();
        let mut order_no = None;
        let mut response_code = None;
        let mut success = false;
        let deadline = Instant::now() + self.config.ack_timeout;

        while response_code.is_none() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let window = self.config.poll_timeout.min(deadline - now);

            let packet = match timeout(window, self.transport.recv()).await {
                Err(_) => continue, // poll window elapsed; re-check deadline
                Ok(Ok(None)) => continue,
                Ok(Ok(Some(packet))) => packet,
                Ok(Err(e)) => {
                    if reconnected {
                        self.state = SessionState::Disconnected;
                        return Err(self.connection_error(e));
                    }
                    warn!(error = %e, "receive failed; attempting recovery");
                    self.recover(&frame).await?;
                    reconnected = true;
                    self.state = SessionState::AwaitingAck;
                    continue;
                }
            };

            let decoded = match codec::decode_all(&packet) {
                Ok(decoded) => decoded,
                Err(e) => {
                    // an unrecognized tag poisons the rest of the packet;
                    // nothing past it can be framed, so the decode is fatal
                    self.state = SessionState::Idle;
                    return Err(e);
                }
            };
            for decoded in decoded {
                if let Some(ack) = decoded.as_ack() {
                    if response_code.is_none() {
                        response_code = Some(ack.response_code);
                    }
                    success |= ack.is_success();
                    if order_no.is_none() && !fields::is_unassigned(&ack.order_no) {
                        order_no = Some(ack.order_no.clone());
                    }
                }
                messages.push(decoded);
            }
        }

        self.state = SessionState::Idle;
        if response_code.is_none() {
            return Err(AxeError::AckTimeout {
                timeout: self.config.ack_timeout,
            });
        }

        debug!(received = messages.len(), success, reconnected, "ack received");
        Ok(SendResult {
            messages,
            order_no,
            response_code,
            success,
            reconnected,
        })
    }

    /// Send the raw reset sentinel
    ///
    /// The simulator echoes an ack-like blob after clearing its book; one
    /// poll window is spent waiting for it and whatever arrives is handed
    /// back raw, never decoded. `None` if the echo did not arrive in time.
    #[instrument(skip(self))]
    pub async fn send_reset(&mut self) -> AxeResult<Option<Vec<u8>>> {
        self.ensure_connected().await?;
        self.transport
            .send(RESET_PACKET)
            .await
            .map_err(|e| self.connection_error(e))?;

        let echo = match timeout(self.config.poll_timeout, self.transport.recv()).await {
            Err(_) | Ok(Ok(None)) => None,
            Ok(Ok(Some(bytes))) => Some(bytes),
            Ok(Err(e)) => {
                self.state = SessionState::Disconnected;
                return Err(self.connection_error(e));
            }
        };

        self.state = SessionState::Idle;
        info!(echoed = echo.is_some(), "reset sent");
        Ok(echo)
    }

    async fn ensure_connected(&mut self) -> AxeResult<()> {
        match self.state {
            SessionState::Closed => Err(self.closed_error()),
            _ if self.transport.is_connected() => Ok(()),
            _ => self.connect().await,
        }
    }

    /// Drop the broken connection, reconnect with backoff, resend the frame
    async fn recover(&mut self, frame: &[u8]) -> AxeResult<()> {
        let _ = self.transport.close().await;
        self.state = SessionState::Disconnected;

        let mut attempt = 0u32;
        loop {
            if !self.config.resend.allows(attempt) {
                return Err(AxeError::connection(
                    self.transport.endpoint(),
                    format!("gave up after {attempt} reconnect attempts"),
                ));
            }
            attempt += 1;
            sleep(self.config.resend.backoff(attempt)).await;

            match self.transport.connect().await {
                Ok(()) => break,
                Err(e) => warn!(attempt, error = %e, "reconnect attempt failed"),
            }
        }
        self.state = SessionState::Connected;
        info!(attempt, "reconnected; resending frame");

        if let Err(e) = self.transport.send(frame).await {
            self.state = SessionState::Disconnected;
            return Err(self.connection_error(e));
        }
        Ok(())
    }

    fn connection_error(&self, e: TransportError) -> AxeError {
        AxeError::connection(self.transport.endpoint(), e.to_string())
    }

    fn closed_error(&self) -> AxeError {
        AxeError::InvalidState {
            expected: SessionState::Idle.as_str(),
            actual: SessionState::Closed.as_str(),
        }
    }
}
