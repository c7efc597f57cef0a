//! TCP session layer for the AXE order protocol
//!
//! Wraps a byte-oriented [`transport::Transport`] with the protocol's
//! conversational rules: encode and send an instruction exactly once, read
//! packets until the ack arrives or a deadline passes, and transparently
//! reconnect-and-resend a single time when the socket drops mid-wait.
//!
//! The transport is a trait so the whole session can run against
//! [`transport::MockTransport`] in tests (enable the `test-utils` feature
//! from other crates).
//!
//! # Example
//!
//! ```no_run
//! use axe_session::{Session, SessionConfig};
//! use axe_session::transport::TcpTransport;
//! use axe_types::{Message, OrderInstruction};
//!
//! # async fn example() -> axe_types::AxeResult<()> {
//! let transport = TcpTransport::new("127.0.0.1:9995");
//! let mut session = Session::new(transport, SessionConfig::default());
//!
//! let order = Message::NewOrder(OrderInstruction::new("000660", "60000", "00020"));
//! let result = session.send_and_await(&order).await?;
//! println!("assigned order number: {:?}", result.order_no);
//! # Ok(())
//! # }
//! ```

pub mod resend;
pub mod session;
pub mod transport;

// Re-export main types
pub use resend::ResendPolicy;
pub use session::{SendResult, Session, SessionConfig, SessionState, RESET_PACKET};
pub use transport::{TcpTransport, Transport, TransportError};

#[cfg(any(test, feature = "test-utils"))]
pub use transport::MockTransport;
