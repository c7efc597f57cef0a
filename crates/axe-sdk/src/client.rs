//! High-level AXE client
//!
//! Ties the three layers together: the session talks to the exchange, every
//! message that crosses the wire is journaled by class, and the ledger is
//! caught up from the journal streams. Queries read the ledger through a
//! lock and hand back owned rows.

use crate::builder::AxeClientBuilder;
use crate::journal::{Journal, JournalError};
use axe_ledger::{Order, OrderLedger, QueryError};
use axe_session::{SendResult, Session, Transport};
use axe_types::{fields, AxeError, Message, OrderInstruction};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

/// Journal stream keys, in the order refresh folds them into the ledger
///
/// New orders before acks before cancels and fills, so a stream batch never
/// subtracts from an order the ledger has not seen yet.
pub const CLASS_KEYS: [&str; 4] = ["NewOrder", "OrderAck", "CancelOrder", "OrderFill"];

/// Client-level errors
#[derive(Debug, Error)]
pub enum SdkError {
    /// Protocol, session, or codec failure
    #[error(transparent)]
    Protocol(#[from] AxeError),

    /// Journal storage failure
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Bad query
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Result alias for client operations
pub type SdkResult<T> = Result<T, SdkError>;

/// High-level client for the AXE order protocol
///
/// # Example
///
/// ```no_run
/// use axe_sdk::AxeClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut client = AxeClient::builder("127.0.0.1:9995").build()?;
///
///     let order = client.submit_order("000660", 60000, 20).await?;
///     println!("order {} accepted", order.order_no);
///
///     let outstanding = client.unexecuted_qty_by_ticker("000660");
///     println!("outstanding quantity: {outstanding}");
///     Ok(())
/// }
/// ```
pub struct AxeClient<T: Transport> {
    session: Session<T>,
    journal: Arc<dyn Journal>,
    ledger: Arc<RwLock<OrderLedger>>,
}

impl AxeClient<axe_session::TcpTransport> {
    /// Create a new client builder
    pub fn builder(endpoint: impl Into<String>) -> AxeClientBuilder {
        AxeClientBuilder::new(endpoint)
    }
}

impl<T: Transport> AxeClient<T> {
    pub(crate) fn from_parts(session: Session<T>, journal: Arc<dyn Journal>) -> Self {
        Self {
            session,
            journal,
            ledger: Arc::new(RwLock::new(OrderLedger::new())),
        }
    }

    /// Endpoint this client targets
    pub fn endpoint(&self) -> &str {
        self.session.endpoint()
    }

    /// The underlying session
    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    /// Submit a new limit order and wait for its ack
    ///
    /// Returns the journaled instruction row, with the server-assigned order
    /// number and the ack's response code folded in. On
    /// [`AxeError::AckTimeout`] nothing is journaled and the ledger is left
    /// untouched; whether resubmitting is safe is the caller's call, since
    /// the exchange may still have accepted the order.
    #[instrument(skip(self))]
    pub async fn submit_order(&mut self, ticker: &str, price: u32, qty: u32) -> SdkResult<Order> {
        let message = Message::NewOrder(OrderInstruction::new(
            ticker,
            fields::pad_price(price),
            fields::pad_qty(qty),
        ));
        self.send_and_record(message).await
    }

    /// Cancel quantity on a previously accepted order
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &mut self,
        order_no: &str,
        ticker: &str,
        price: u32,
        qty: u32,
    ) -> SdkResult<Order> {
        let message = Message::CancelOrder(
            OrderInstruction::new(ticker, fields::pad_price(price), fields::pad_qty(qty))
                .with_order_no(order_no),
        );
        self.send_and_record(message).await
    }

    /// Tell the exchange simulator to clear its state
    ///
    /// The local journal and ledger are not touched; the sentinel is not a
    /// protocol message and produces no rows.
    pub async fn reset(&mut self) -> SdkResult<()> {
        self.session.send_reset().await?;
        Ok(())
    }

    async fn send_and_record(&mut self, message: Message) -> SdkResult<Order> {
        let outcome = self.session.send_and_await(&message).await?;
        let row = self.record(&message, &outcome)?;
        self.refresh()?;
        Ok(row)
    }

    /// Journal the sent instruction and everything received alongside it
    fn record(&self, sent: &Message, outcome: &SendResult) -> SdkResult<Order> {
        let submitted_at = chrono::Utc::now().to_rfc3339();

        let mut row = Order::from_message(sent, &submitted_at);
        if let Some(order_no) = &outcome.order_no {
            row = row.with_order_no(order_no.clone());
        }
        if let Some(code) = outcome.response_code {
            row = row.with_response_code(code);
        }
        self.journal.append(row.class_key(), &row)?;

        for message in &outcome.messages {
            let received = Order::from_message(message, &submitted_at);
            self.journal.append(received.class_key(), &received)?;
        }

        info!(
            class = row.class_key(),
            order_no = %row.order_no,
            received = outcome.messages.len(),
            "instruction recorded"
        );
        Ok(row)
    }

    /// Fold journal entries the ledger has not seen yet
    ///
    /// Safe to call at any time and from a background task via
    /// [`spawn_refresh`](Self::spawn_refresh); watermarks make overlapping
    /// refreshes idempotent.
    pub fn refresh(&self) -> SdkResult<usize> {
        refresh_ledger(&self.journal, &self.ledger)
    }

    /// Periodically refresh the ledger from the journal
    ///
    /// Useful when another process appends to a shared [`FileJournal`]
    /// directory. The task runs until the handle is aborted.
    ///
    /// [`FileJournal`]: crate::journal::FileJournal
    pub fn spawn_refresh(&self, period: Duration) -> JoinHandle<()> {
        let journal = Arc::clone(&self.journal);
        let ledger = Arc::clone(&self.ledger);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if let Err(e) = refresh_ledger(&journal, &ledger) {
                    warn!(error = %e, "background ledger refresh failed");
                }
            }
        })
    }

    /// All live orders with quantity still left to execute
    pub fn unexecuted_orders(&self) -> Vec<Order> {
        cloned(self.ledger.read().unexecuted_orders())
    }

    /// Live orders for a ticker with quantity still left to execute
    pub fn unexecuted_orders_by_ticker(&self, ticker: &str) -> Vec<Order> {
        cloned(self.ledger.read().unexecuted_orders_by_ticker(ticker))
    }

    /// Live orders for a ticker at an exact price with quantity left
    pub fn unexecuted_orders_by_ticker_and_price(&self, ticker: &str, price: u32) -> Vec<Order> {
        let price = fields::pad_price(price);
        cloned(
            self.ledger
                .read()
                .unexecuted_orders_by_ticker_and_price(ticker, &price),
        )
    }

    /// Total unexecuted quantity across a ticker's live orders
    pub fn unexecuted_qty_by_ticker(&self, ticker: &str) -> u32 {
        self.ledger.read().unexecuted_qty_by_ticker(ticker)
    }

    /// Total unexecuted quantity for a ticker at an exact price
    pub fn unexecuted_qty_by_ticker_and_price(&self, ticker: &str, price: u32) -> u32 {
        self.ledger
            .read()
            .unexecuted_qty_by_ticker_and_price(ticker, &fields::pad_price(price))
    }

    /// A ticker's unexecuted orders sorted by price, then submission time
    pub fn order_book_by_ticker(&self, ticker: &str) -> Vec<Order> {
        cloned(self.ledger.read().order_book_by_ticker(ticker))
    }

    /// A single order looked up by ticker and order number
    pub fn order_by_ticker_and_order_no(&self, ticker: &str, order_no: &str) -> Option<Order> {
        self.ledger
            .read()
            .order_by_ticker_and_order_no(ticker, order_no)
            .cloned()
    }

    /// Rows matching every `(field, value)` criterion, by field name
    pub fn query_by_names(&self, criteria: &[(&str, &str)]) -> SdkResult<Vec<Order>> {
        Ok(cloned(self.ledger.read().query_by_names(criteria)?))
    }

    /// Rows that do NOT carry `value` in the named field
    pub fn exclude_by_name(&self, name: &str, value: &str) -> SdkResult<Vec<Order>> {
        Ok(cloned(self.ledger.read().exclude_by_name(name, value)?))
    }
}

fn refresh_ledger(
    journal: &Arc<dyn Journal>,
    ledger: &Arc<RwLock<OrderLedger>>,
) -> SdkResult<usize> {
    let mut applied = 0;
    for key in CLASS_KEYS {
        let offset = ledger.read().watermark(key);
        let rows = journal.read_since(key, offset)?;
        if !rows.is_empty() {
            applied += ledger.write().apply_from(key, offset, rows);
        }
    }
    Ok(applied)
}

fn cloned(rows: Vec<&Order>) -> Vec<Order> {
    rows.into_iter().cloned().collect()
}
