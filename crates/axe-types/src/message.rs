//! Typed wire messages
//!
//! Each variant carries an explicit record of its fields; field order is a
//! compile-time contract enforced by the codec, not a runtime map.

use crate::fields::{
    MSG_TYPE_WIDTH, ORDER_NO_UNASSIGNED, ORDER_NO_WIDTH, PRICE_WIDTH, QTY_WIDTH,
    RESPONSE_CODE_WIDTH, TICKER_WIDTH,
};
use serde::{Deserialize, Serialize};

/// Wire message type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgType {
    /// Client order submission, tag `0`
    NewOrder,
    /// Client cancel request, tag `1`
    CancelOrder,
    /// Server acknowledgement ("Received"), tag `2`
    OrderAck,
    /// Server execution notice ("Executed"), tag `3`
    OrderFill,
}

impl MsgType {
    /// The leading tag byte for this variant
    pub const fn tag(self) -> u8 {
        match self {
            Self::NewOrder => b'0',
            Self::CancelOrder => b'1',
            Self::OrderAck => b'2',
            Self::OrderFill => b'3',
        }
    }

    /// Look up a variant by its tag byte
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'0' => Some(Self::NewOrder),
            b'1' => Some(Self::CancelOrder),
            b'2' => Some(Self::OrderAck),
            b'3' => Some(Self::OrderFill),
            _ => None,
        }
    }

    /// Total frame length in bytes, including the tag
    pub const fn frame_len(self) -> usize {
        match self {
            Self::NewOrder | Self::CancelOrder => {
                MSG_TYPE_WIDTH + ORDER_NO_WIDTH + TICKER_WIDTH + PRICE_WIDTH + QTY_WIDTH
            }
            Self::OrderAck => MSG_TYPE_WIDTH + ORDER_NO_WIDTH + RESPONSE_CODE_WIDTH,
            Self::OrderFill => MSG_TYPE_WIDTH + ORDER_NO_WIDTH + QTY_WIDTH,
        }
    }

    /// The tag as a one-character string, as stored in ledger rows
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewOrder => "0",
            Self::CancelOrder => "1",
            Self::OrderAck => "2",
            Self::OrderFill => "3",
        }
    }

    /// Class name used as the journal key for messages of this type
    pub const fn class_key(self) -> &'static str {
        match self {
            Self::NewOrder => "NewOrder",
            Self::CancelOrder => "CancelOrder",
            Self::OrderAck => "OrderAck",
            Self::OrderFill => "OrderFill",
        }
    }
}

impl std::fmt::Display for MsgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.class_key())
    }
}

/// Ack response code: `"0"` success, `"1"` fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseCode {
    /// Order accepted
    Success,
    /// Order rejected
    Fail,
}

impl ResponseCode {
    /// Parse from the single wire byte
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'0' => Some(Self::Success),
            b'1' => Some(Self::Fail),
            _ => None,
        }
    }

    /// The wire representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "0",
            Self::Fail => "1",
        }
    }

    /// True for [`ResponseCode::Success`]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Fields shared by NewOrder and CancelOrder frames
///
/// `order_no` is empty (all zeros) at client-send time; the server assigns
/// the real number and the client back-fills it from the correlated ack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInstruction {
    /// Server-assigned order number, `00000` until acked
    pub order_no: String,
    /// Ticker symbol, 6 digits
    pub ticker: String,
    /// Limit price, 5 digits zero-padded
    pub price: String,
    /// Order quantity, 5 digits zero-padded
    pub qty: String,
}

impl OrderInstruction {
    /// Create an instruction with the order number still unassigned
    pub fn new(ticker: impl Into<String>, price: impl Into<String>, qty: impl Into<String>) -> Self {
        Self {
            order_no: ORDER_NO_UNASSIGNED.to_string(),
            ticker: ticker.into(),
            price: price.into(),
            qty: qty.into(),
        }
    }

    /// Set the order number (back-fill from an ack, or target of a cancel)
    pub fn with_order_no(mut self, order_no: impl Into<String>) -> Self {
        self.order_no = order_no.into();
        self
    }
}

/// Server acknowledgement of a submitted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Assigned order number
    pub order_no: String,
    /// Success or fail
    pub response_code: ResponseCode,
}

impl OrderAck {
    /// True if the ack reports success
    pub fn is_success(&self) -> bool {
        self.response_code.is_success()
    }
}

/// Server notice of (partial) execution against an order
///
/// Fills carry no response code on the wire; an execution is always treated
/// as successful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFill {
    /// Order number the execution applies to
    pub order_no: String,
    /// Executed quantity, 5 digits zero-padded
    pub qty: String,
}

/// A decoded wire message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// New order submission
    NewOrder(OrderInstruction),
    /// Cancel request
    CancelOrder(OrderInstruction),
    /// Acknowledgement
    OrderAck(OrderAck),
    /// Execution notice
    OrderFill(OrderFill),
}

impl Message {
    /// The message's type tag
    pub fn msg_type(&self) -> MsgType {
        match self {
            Self::NewOrder(_) => MsgType::NewOrder,
            Self::CancelOrder(_) => MsgType::CancelOrder,
            Self::OrderAck(_) => MsgType::OrderAck,
            Self::OrderFill(_) => MsgType::OrderFill,
        }
    }

    /// The order number carried by any variant
    pub fn order_no(&self) -> &str {
        match self {
            Self::NewOrder(m) | Self::CancelOrder(m) => &m.order_no,
            Self::OrderAck(m) => &m.order_no,
            Self::OrderFill(m) => &m.order_no,
        }
    }

    /// Journal key for this message
    pub fn class_key(&self) -> &'static str {
        self.msg_type().class_key()
    }

    /// Borrow the ack payload, if this is an ack
    pub fn as_ack(&self) -> Option<&OrderAck> {
        match self {
            Self::OrderAck(ack) => Some(ack),
            _ => None,
        }
    }
}
