//! High-level SDK for the AXE exchange-order protocol
//!
//! This crate ties the protocol layers into one client: a TCP session with
//! ack-driven sends and transparent reconnect, an append-only journal of
//! every message that crosses the wire, and a queryable order ledger rebuilt
//! incrementally from the journal streams.
//!
//! # Quick Start
//!
//! ```no_run
//! use axe_sdk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = AxeClient::builder("127.0.0.1:9995").build()?;
//!
//!     // Submit 20 shares of 000660 at 60,000 and wait for the ack
//!     let order = client.submit_order("000660", 60000, 20).await?;
//!     println!("accepted as {}", order.order_no);
//!
//!     // Cancel half of it
//!     client.cancel_order(&order.order_no, "000660", 60000, 10).await?;
//!
//!     // 10 shares still working
//!     assert_eq!(client.unexecuted_qty_by_ticker("000660"), 10);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - **Exactly-once sends**: an instruction is written once, then the session
//!   reads until its ack arrives or the deadline passes
//! - **Transparent recovery**: a dropped socket triggers one
//!   reconnect-and-resend before errors surface
//! - **Durable history**: every message is journaled by class before it is
//!   folded into the ledger, so state survives restarts with [`FileJournal`]
//! - **Indexed queries**: AND/NOT queries over order history without
//!   rescanning, plus canonical unexecuted-quantity views
//!
//! [`FileJournal`]: journal::FileJournal

pub mod builder;
pub mod client;
pub mod journal;
pub mod prelude;

// Re-export main types
pub use builder::{AxeClientBuilder, ConfigError};
pub use client::{AxeClient, SdkError, SdkResult, CLASS_KEYS};
pub use journal::{FileJournal, Journal, JournalError, MemoryJournal};

// Re-export commonly used types from the lower layers
pub use axe_ledger::{Order, OrderLedger, QueryError};
pub use axe_session::{ResendPolicy, SendResult, SessionConfig, SessionState};
pub use axe_types::{AxeError, AxeResult, Message, MsgType, OrderInstruction, ResponseCode};
