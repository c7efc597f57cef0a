//! Append-only order ledger
//!
//! Rows are appended in arrival order and never deleted. The only mutation
//! after a row is written is resolving a pending response code from its ack
//! and folding cancel/fill quantities into the derived unexecuted counter,
//! and both happen atomically with the matching index update.

use crate::index::{Field, FieldIndex};
use crate::order::{pad_unexecuted, Order};
use axe_types::{fields, Message, MsgType};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

/// Replay-based model of all orders ever seen
///
/// Feed it decoded messages (or journal rows) in arrival order; query it
/// through the façade methods in [`crate::query`]. Single writer at a time;
/// readers observe a consistent snapshot between `apply` calls.
#[derive(Debug, Default)]
pub struct OrderLedger {
    /// All rows, in application order; owns the data
    rows: Vec<Order>,
    /// Secondary index over the rows (handles only)
    index: FieldIndex,
    /// Active order rows (successful NewOrder) by order number
    live_by_order_no: HashMap<String, usize>,
    /// Instruction rows awaiting their ack, FIFO per order number
    pending_rc: HashMap<String, VecDeque<usize>>,
    /// High-water mark per source, for idempotent incremental loads
    watermarks: HashMap<String, u64>,
}

impl OrderLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if no row has been applied yet
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows, in application order
    pub fn rows(&self) -> &[Order] {
        &self.rows
    }

    /// Row by handle
    pub fn get(&self, handle: usize) -> Option<&Order> {
        self.rows.get(handle)
    }

    /// The secondary index
    pub fn index(&self) -> &FieldIndex {
        &self.index
    }

    /// Last applied offset for a source (0 if never seen)
    pub fn watermark(&self, source: &str) -> u64 {
        self.watermarks.get(source).copied().unwrap_or(0)
    }

    /// Apply decoded messages in wire order, stamping them with `submitted_at`
    pub fn apply_messages(&mut self, messages: &[Message], submitted_at: &str) -> usize {
        for message in messages {
            self.apply_order(Order::from_message(message, submitted_at));
        }
        messages.len()
    }

    /// Apply journal rows read from `source` starting at `start_offset`
    ///
    /// Entries below the source's high-water mark have already been applied
    /// and are skipped, so overlapping reads and repeated refreshes never
    /// double-subtract. Returns the number of rows actually applied.
    pub fn apply_from(
        &mut self,
        source: &str,
        start_offset: u64,
        rows: Vec<Order>,
    ) -> usize {
        let watermark = self.watermark(source);
        let total = rows.len() as u64;
        let mut applied = 0;

        for (i, row) in rows.into_iter().enumerate() {
            let offset = start_offset + i as u64;
            if offset < watermark {
                continue;
            }
            self.apply_order(row);
            applied += 1;
        }

        let end = start_offset + total;
        if end > watermark {
            self.watermarks.insert(source.to_string(), end);
        }
        applied
    }

    /// Apply a single row
    ///
    /// The row is recorded unconditionally; what else happens depends on its
    /// type: successful new orders start unexecuted tracking, successful
    /// cancels and fills consume quantity from their target, and acks resolve
    /// whichever instruction row is still awaiting a response code.
    pub fn apply_order(&mut self, row: Order) {
        let handle = self.rows.len();

        self.index.insert(Field::MsgType, &row.msg_type, handle);
        self.index.insert(Field::OrderNo, &row.order_no, handle);
        if let Some(ticker) = &row.ticker {
            self.index.insert(Field::Ticker, ticker, handle);
        }
        if let Some(price) = &row.price {
            self.index.insert(Field::Price, price, handle);
        }
        if let Some(code) = &row.response_code {
            self.index.insert(Field::ResponseCode, code, handle);
        }

        let msg_type = row.msg_type();
        self.rows.push(row);

        match msg_type {
            Some(MsgType::NewOrder) | Some(MsgType::CancelOrder) => {
                self.apply_instruction(handle);
            }
            Some(MsgType::OrderAck) => self.resolve_pending(handle),
            Some(MsgType::OrderFill) => {
                let order_no = self.rows[handle].order_no.clone();
                let qty = self.rows[handle].qty_int();
                self.consume(&order_no, qty);
            }
            None => warn!(msg_type = %self.rows[handle].msg_type, "row with unknown type tag recorded but not folded"),
        }
    }

    /// Handle a freshly recorded instruction row
    fn apply_instruction(&mut self, handle: usize) {
        let row = &self.rows[handle];
        match row.response_code.as_deref() {
            Some("0") => {
                if row.msg_type() == Some(MsgType::NewOrder) {
                    self.activate(handle);
                } else {
                    let order_no = row.order_no.clone();
                    let qty = row.qty_int();
                    self.consume(&order_no, qty);
                }
            }
            Some(_) => {} // rejected; history only
            None => {
                // unresolved: wait for the ack to be replayed
                let order_no = row.order_no.clone();
                self.pending_rc.entry(order_no).or_default().push_back(handle);
            }
        }
    }

    /// Resolve the oldest pending instruction with this ack's response code
    fn resolve_pending(&mut self, ack_handle: usize) {
        let order_no = self.rows[ack_handle].order_no.clone();
        let Some(code) = self.rows[ack_handle].response_code.clone() else {
            return;
        };

        let pending = match self.pending_rc.get_mut(&order_no).and_then(VecDeque::pop_front) {
            Some(handle) => handle,
            None => return, // nothing awaited this ack; history row only
        };

        self.rows[pending].response_code = Some(code.clone());
        self.index.insert(Field::ResponseCode, &code, pending);

        if code == "0" {
            if self.rows[pending].msg_type() == Some(MsgType::NewOrder) {
                self.activate(pending);
            } else {
                let qty = self.rows[pending].qty_int();
                self.consume(&order_no, qty);
            }
        }
    }

    /// Begin unexecuted-quantity tracking for a successful new order
    fn activate(&mut self, handle: usize) {
        let order_no = self.rows[handle].order_no.clone();
        if fields::is_unassigned(&order_no) {
            warn!(handle, "successful order without an assigned number; not tracking");
            return;
        }
        if let Some(existing) = self.live_by_order_no.get(&order_no) {
            warn!(order_no = %order_no, existing, "duplicate live order number; keeping first");
            return;
        }

        let qty = self.rows[handle]
            .qty
            .clone()
            .unwrap_or_else(|| fields::QTY_ZERO.to_string());
        self.rows[handle].unexecuted_qty = Some(qty.clone());
        self.index.insert(Field::UnexecutedQty, &qty, handle);
        self.live_by_order_no.insert(order_no, handle);
    }

    /// Subtract quantity from the live order, clamped at zero
    ///
    /// An unknown order number is expected (the message predates this
    /// session's visibility window) and is ignored without error. The counter
    /// and its index bucket move together.
    fn consume(&mut self, order_no: &str, qty: u32) {
        let Some(&handle) = self.live_by_order_no.get(order_no) else {
            debug!(order_no = %order_no, qty, "consumption for unknown order ignored");
            return;
        };

        let old = self.rows[handle].unexecuted_qty_int();
        let new = old.saturating_sub(qty);
        let old_key = pad_unexecuted(old);
        let new_key = pad_unexecuted(new);

        self.rows[handle].unexecuted_qty = Some(new_key.clone());
        self.index
            .reassign(Field::UnexecutedQty, &old_key, &new_key, handle);

        debug!(order_no = %order_no, consumed = qty, remaining = new, "unexecuted quantity updated");
    }
}
