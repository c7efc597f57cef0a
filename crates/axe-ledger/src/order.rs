//! Ledger rows
//!
//! Every wire message becomes an [`Order`] row. Rows are immutable history
//! once written; the derived `unexecuted_qty` counter is the only field the
//! ledger ever mutates afterwards.

use axe_types::{fields, Message, MsgType, ResponseCode};
use serde::{Deserialize, Serialize};

/// One row of order history
///
/// Rows derived from ack and fill messages carry only the fields their wire
/// frame has; absent fields simply never appear in the corresponding index
/// bucket. The row serializes to the flat JSON field map used as the journal
/// entry format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Wire type tag, `"0"`..`"3"`
    pub msg_type: String,
    /// Server-assigned order number (placeholder zeros until acked)
    pub order_no: String,
    /// Ticker symbol (instruction rows only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    /// Limit price (instruction rows only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Quantity the message carried
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<String>,
    /// `"0"` success / `"1"` fail; `None` while unresolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,
    /// Remaining quantity, zero-padded; live NewOrder rows only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unexecuted_qty: Option<String>,
    /// When the client recorded the message, RFC 3339
    pub submitted_at: String,
}

impl Order {
    /// Build a row from a decoded message
    ///
    /// Instructions start with no response code; it is back-filled from the
    /// correlated ack before the row reaches the ledger, or resolved by the
    /// ledger itself when the ack is replayed after it. Fills carry no code
    /// on the wire and are always successful.
    pub fn from_message(message: &Message, submitted_at: impl Into<String>) -> Self {
        let submitted_at = submitted_at.into();
        match message {
            Message::NewOrder(m) | Message::CancelOrder(m) => Self {
                msg_type: message.msg_type().as_str().to_string(),
                order_no: m.order_no.clone(),
                ticker: Some(m.ticker.clone()),
                price: Some(m.price.clone()),
                qty: Some(m.qty.clone()),
                response_code: None,
                unexecuted_qty: None,
                submitted_at,
            },
            Message::OrderAck(m) => Self {
                msg_type: MsgType::OrderAck.as_str().to_string(),
                order_no: m.order_no.clone(),
                ticker: None,
                price: None,
                qty: None,
                response_code: Some(m.response_code.as_str().to_string()),
                unexecuted_qty: None,
                submitted_at,
            },
            Message::OrderFill(m) => Self {
                msg_type: MsgType::OrderFill.as_str().to_string(),
                order_no: m.order_no.clone(),
                ticker: None,
                price: None,
                qty: Some(m.qty.clone()),
                response_code: Some(ResponseCode::Success.as_str().to_string()),
                unexecuted_qty: None,
                submitted_at,
            },
        }
    }

    /// Back-fill the response code (client-side, from the correlated ack)
    pub fn with_response_code(mut self, code: ResponseCode) -> Self {
        self.response_code = Some(code.as_str().to_string());
        self
    }

    /// Back-fill the order number (client-side, from the correlated ack)
    pub fn with_order_no(mut self, order_no: impl Into<String>) -> Self {
        self.order_no = order_no.into();
        self
    }

    /// The row's message type, if the tag is recognized
    pub fn msg_type(&self) -> Option<MsgType> {
        self.msg_type.as_bytes().first().and_then(|b| MsgType::from_tag(*b))
    }

    /// True if the response code is present and reports success
    pub fn is_success(&self) -> bool {
        self.response_code.as_deref() == Some("0")
    }

    /// Remaining quantity as an integer; zero when not tracked
    pub fn unexecuted_qty_int(&self) -> u32 {
        self.unexecuted_qty
            .as_deref()
            .and_then(|q| q.parse::<u32>().ok())
            .unwrap_or(0)
    }

    /// True once the remaining quantity has been consumed entirely
    pub fn fully_executed(&self) -> bool {
        self.unexecuted_qty.is_some() && self.unexecuted_qty_int() == 0
    }

    /// The journal key for rows of this message class
    pub fn class_key(&self) -> &'static str {
        match self.msg_type() {
            Some(mt) => mt.class_key(),
            None => "Unknown",
        }
    }

    /// Quantity carried by the message, parsed; zero when absent
    pub(crate) fn qty_int(&self) -> u32 {
        self.qty
            .as_deref()
            .and_then(|q| q.parse::<u32>().ok())
            .unwrap_or(0)
    }

    /// Price parsed base-10, for numeric ordering
    pub(crate) fn price_int(&self) -> u32 {
        self.price
            .as_deref()
            .and_then(|p| p.parse::<u32>().ok())
            .unwrap_or(0)
    }
}

/// Re-pad helper used when writing the counter back to its wire width
pub(crate) fn pad_unexecuted(qty: u32) -> String {
    fields::pad_qty(qty)
}
