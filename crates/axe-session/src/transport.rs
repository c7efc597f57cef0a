//! TCP transport abstraction
//!
//! This module provides a trait-based abstraction over the exchange socket,
//! enabling unit testing of session logic without real network calls.
//!
//! # Example
//!
//! ```no_run
//! use axe_session::transport::{Transport, TcpTransport, TransportError};
//!
//! async fn example() -> Result<(), TransportError> {
//!     let mut transport = TcpTransport::new("127.0.0.1:9995");
//!     transport.connect().await?;
//!     transport.send(b"0000000006606000000020").await?;
//!     if let Some(packet) = transport.recv().await? {
//!         println!("received {} bytes", packet.len());
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument};

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed by the peer
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Connection timeout
    #[error("connection timeout after {0:?}")]
    Timeout(Duration),

    /// Not connected
    #[error("not connected")]
    NotConnected,
}

/// Trait for TCP transport abstraction
///
/// This trait enables unit testing of session logic by allowing mock
/// implementations to be injected instead of real sockets. Packets are
/// opaque byte blobs here; framing belongs to the codec, not the transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the exchange endpoint
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Send one packet
    async fn send(&mut self, packet: &[u8]) -> Result<(), TransportError>;

    /// Receive one packet
    ///
    /// Returns `None` if the connection was closed gracefully. A single
    /// packet may carry several back-to-back frames.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Check if currently connected
    fn is_connected(&self) -> bool;

    /// Get the endpoint address
    fn endpoint(&self) -> &str;
}

/// Real TCP transport using tokio
pub struct TcpTransport {
    addr: String,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
    recv_buf_size: usize,
}

impl TcpTransport {
    /// Create a new TCP transport
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            stream: None,
            connect_timeout: Duration::from_secs(10),
            recv_buf_size: 4096,
        }
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for TcpTransport {
    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn connect(&mut self) -> Result<(), TransportError> {
        debug!("connecting");

        let stream = timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| TransportError::Timeout(self.connect_timeout))?
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        self.stream = Some(stream);
        debug!("connected");
        Ok(())
    }

    #[instrument(skip(self, packet), fields(len = packet.len()))]
    async fn send(&mut self, packet: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        stream
            .write_all(packet)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        let mut buf = vec![0u8; self.recv_buf_size];
        match stream.read(&mut buf).await {
            Ok(0) => {
                self.stream = None;
                Ok(None)
            }
            Ok(n) => {
                buf.truncate(n);
                Ok(Some(buf))
            }
            Err(e) => {
                self.stream = None;
                Err(TransportError::ReceiveFailed(e.to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.take() {
            stream
                .shutdown()
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn endpoint(&self) -> &str {
        &self.addr
    }
}

/// Mock transport for testing
///
/// Allows injecting predefined responses and capturing sent packets. An
/// exhausted script behaves like a quiet socket (`Ok(None)`), so timeout
/// paths can be exercised without real delays.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockTransport {
    addr: String,
    connected: bool,
    /// Packets to return on recv()
    pub responses: std::collections::VecDeque<Result<Option<Vec<u8>>, TransportError>>,
    /// Packets captured from send()
    pub sent_packets: Vec<Vec<u8>>,
    /// Simulate connection failure
    pub fail_connect: bool,
    /// Simulate send failure
    pub fail_send: bool,
    /// Number of connect() calls observed
    pub connect_calls: u32,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockTransport {
    /// Create a new mock transport
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connected: false,
            responses: std::collections::VecDeque::new(),
            sent_packets: Vec::new(),
            fail_connect: false,
            fail_send: false,
            connect_calls: 0,
        }
    }

    /// Add a packet to be returned on recv()
    pub fn push_response(&mut self, packet: impl Into<Vec<u8>>) {
        self.responses.push_back(Ok(Some(packet.into())));
    }

    /// Add multiple packets
    pub fn push_responses(&mut self, packets: impl IntoIterator<Item = impl Into<Vec<u8>>>) {
        for packet in packets {
            self.push_response(packet);
        }
    }

    /// Simulate a graceful close
    pub fn push_close(&mut self) {
        self.responses.push_back(Ok(None));
    }

    /// Simulate a receive error
    pub fn push_error(&mut self, error: TransportError) {
        self.responses.push_back(Err(error));
    }

    /// Get sent packets, clearing the capture buffer
    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.sent_packets)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.connect_calls += 1;
        if self.fail_connect {
            return Err(TransportError::ConnectionFailed("mock connection failure".into()));
        }
        self.connected = true;
        Ok(())
    }

    async fn send(&mut self, packet: &[u8]) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        if self.fail_send {
            return Err(TransportError::SendFailed("mock send failure".into()));
        }
        self.sent_packets.push(packet.to_vec());
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.responses.pop_front().unwrap_or(Ok(None))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn endpoint(&self) -> &str {
        &self.addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_send_recv() {
        let mut transport = MockTransport::new("127.0.0.1:9995");
        transport.push_response(b"2000010".to_vec());

        transport.connect().await.unwrap();
        assert!(transport.is_connected());

        transport.send(b"0000000006606000000020").await.unwrap();
        assert_eq!(transport.sent_packets.len(), 1);
        assert_eq!(transport.sent_packets[0], b"0000000006606000000020");

        let packet = transport.recv().await.unwrap();
        assert_eq!(packet.as_deref(), Some(&b"2000010"[..]));
    }

    #[tokio::test]
    async fn test_mock_transport_quiet_when_script_exhausted() {
        let mut transport = MockTransport::new("127.0.0.1:9995");
        transport.connect().await.unwrap();

        assert!(transport.recv().await.unwrap().is_none());
        assert!(transport.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mock_transport_connection_failure() {
        let mut transport = MockTransport::new("127.0.0.1:9995");
        transport.fail_connect = true;

        assert!(transport.connect().await.is_err());
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_mock_transport_requires_connect() {
        let mut transport = MockTransport::new("127.0.0.1:9995");
        let result = transport.send(b"x").await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
    }
}
