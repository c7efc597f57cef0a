//! Wire types and fixed-width codec for the AXE order protocol
//!
//! This crate provides the core type definitions and the packet codec used
//! across the AXE SDK. It has minimal dependencies and performs no I/O.
//!
//! # Key Types
//!
//! - [`Message`] - Decoded wire message (new order, cancel, ack, fill)
//! - [`MsgType`] - Type tag with per-variant frame lengths
//! - [`ResponseCode`] - Server success/fail code carried by acks
//! - [`PacketSplitter`] - Iterator over concatenated wire frames
//! - [`AxeError`] - Error taxonomy shared by the SDK
//!
//! # Wire Format
//!
//! Every message is a fixed-width run of ASCII decimal digits. The leading
//! byte is the type tag and determines the total frame length, so a server
//! response batching several messages is demultiplexed by repeatedly peeking
//! the tag and cutting that many bytes:
//!
//! ```
//! use axe_types::{decode_all, Message};
//!
//! // An ack for order 00001 followed by a fill of 10 units
//! let packet = b"200001030000100010";
//! let messages = decode_all(packet).unwrap();
//! assert_eq!(messages.len(), 2);
//! assert!(matches!(messages[0], Message::OrderAck(_)));
//! assert!(matches!(messages[1], Message::OrderFill(_)));
//! ```

pub mod codec;
pub mod error;
pub mod fields;
pub mod message;

// Re-export commonly used items
pub use codec::{decode_all, decode_one, encode, split, PacketSplitter};
pub use error::{AxeError, AxeResult};
pub use fields::{
    ORDER_NO_UNASSIGNED, ORDER_NO_WIDTH, PRICE_WIDTH, QTY_WIDTH, QTY_ZERO, TICKER_WIDTH,
};
pub use message::{Message, MsgType, OrderAck, OrderFill, OrderInstruction, ResponseCode};
