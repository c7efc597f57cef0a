//! Replay-based order ledger for the AXE SDK
//!
//! This crate reconstructs a durable, queryable view of order state from the
//! accumulated message stream: every message ever seen becomes an immutable
//! row, and a derived unexecuted-quantity counter per order is folded forward
//! as cancels and fills arrive. A per-field bucket index is maintained
//! incrementally alongside, so AND/NOT queries never re-scan full history.
//!
//! No networking, no I/O; feeding the ledger is the caller's job.
//!
//! # Example
//!
//! ```
//! use axe_ledger::OrderLedger;
//! use axe_types::{Message, OrderAck, OrderFill, OrderInstruction, ResponseCode};
//!
//! let mut ledger = OrderLedger::new();
//! ledger.apply_messages(
//!     &[
//!         Message::NewOrder(OrderInstruction::new("000660", "60000", "00020").with_order_no("00001")),
//!         Message::OrderAck(OrderAck { order_no: "00001".into(), response_code: ResponseCode::Success }),
//!         Message::OrderFill(OrderFill { order_no: "00001".into(), qty: "00010".into() }),
//!     ],
//!     "2024-01-01T00:00:00Z",
//! );
//! assert_eq!(ledger.unexecuted_qty_by_ticker("000660"), 10);
//! ```

pub mod index;
pub mod ledger;
pub mod order;
pub mod query;

// Re-export main types
pub use index::{Field, FieldIndex};
pub use ledger::OrderLedger;
pub use order::Order;
pub use query::{QueryError, QueryResult};
