//! Query façade over the ledger
//!
//! Thin combinators over the secondary index: every method resolves to an
//! intersection of index buckets (optionally minus an exclusion set) and then
//! materializes the matching rows. Handles come back in insertion order, so
//! results are deterministic for a given ledger state.

use crate::index::Field;
use crate::ledger::OrderLedger;
use crate::order::Order;
use axe_types::{fields, MsgType, ResponseCode};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors from the string-keyed query surface
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A query with no criteria matches nothing meaningful; reject it
    #[error("query has no criteria")]
    EmptyQuery,

    /// The caller named a field the index does not maintain
    #[error("unsupported query parameter: {name}")]
    UnsupportedParam { name: String },
}

/// Result alias for query operations
pub type QueryResult<T> = Result<T, QueryError>;

impl OrderLedger {
    /// Rows matching every `(field, value)` criterion, by field name
    ///
    /// This is the raw string-keyed surface; the typed methods below are
    /// built from the same primitives and should be preferred where they fit.
    pub fn query_by_names(&self, criteria: &[(&str, &str)]) -> QueryResult<Vec<&Order>> {
        if criteria.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        let mut parsed = Vec::with_capacity(criteria.len());
        for (name, value) in criteria {
            parsed.push((Field::parse(name)?, *value));
        }
        Ok(self.materialize(self.index().query(&parsed)?))
    }

    /// Rows that do NOT carry `value` in the named field
    ///
    /// Rows missing the field entirely are not part of the result either;
    /// exclusion only considers rows the field is indexed for.
    pub fn exclude_by_name(&self, name: &str, value: &str) -> QueryResult<Vec<&Order>> {
        let field = Field::parse(name)?;
        Ok(self.materialize(self.index().exclude(field, value)))
    }

    /// All live orders with quantity still left to execute
    pub fn unexecuted_orders(&self) -> Vec<&Order> {
        self.materialize(self.unexecuted_set(&[]))
    }

    /// Live orders for a ticker with quantity still left to execute
    pub fn unexecuted_orders_by_ticker(&self, ticker: &str) -> Vec<&Order> {
        self.materialize(self.unexecuted_set(&[(Field::Ticker, ticker)]))
    }

    /// Live orders for a ticker at an exact price with quantity left
    pub fn unexecuted_orders_by_ticker_and_price(&self, ticker: &str, price: &str) -> Vec<&Order> {
        self.materialize(self.unexecuted_set(&[(Field::Ticker, ticker), (Field::Price, price)]))
    }

    /// Total unexecuted quantity across a ticker's live orders
    pub fn unexecuted_qty_by_ticker(&self, ticker: &str) -> u32 {
        self.sum_unexecuted(self.unexecuted_set(&[(Field::Ticker, ticker)]))
    }

    /// Total unexecuted quantity for a ticker at an exact price
    pub fn unexecuted_qty_by_ticker_and_price(&self, ticker: &str, price: &str) -> u32 {
        self.sum_unexecuted(self.unexecuted_set(&[(Field::Ticker, ticker), (Field::Price, price)]))
    }

    /// A ticker's unexecuted orders sorted by price, then submission time
    ///
    /// Same membership as [`unexecuted_orders_by_ticker`](Self::unexecuted_orders_by_ticker);
    /// only the ordering differs. An order that fully executes drops out of
    /// the book.
    pub fn order_book_by_ticker(&self, ticker: &str) -> Vec<&Order> {
        let mut rows = self.materialize(self.unexecuted_set(&[(Field::Ticker, ticker)]));
        rows.sort_by(|a, b| {
            a.price_int()
                .cmp(&b.price_int())
                .then_with(|| a.submitted_at.cmp(&b.submitted_at))
        });
        rows
    }

    /// A new-order row looked up by ticker and order number
    ///
    /// Matches on identity only: rejected and fully executed orders are
    /// still found.
    pub fn order_by_ticker_and_order_no(&self, ticker: &str, order_no: &str) -> Option<&Order> {
        let handles = self.index().intersect(&[
            (Field::MsgType, MsgType::NewOrder.as_str()),
            (Field::Ticker, ticker),
            (Field::OrderNo, order_no),
        ]);
        handles.into_iter().next().and_then(|handle| self.get(handle))
    }

    /// Handles of successful new orders with a nonzero unexecuted counter,
    /// narrowed by any extra criteria
    fn unexecuted_set(&self, extra: &[(Field, &str)]) -> BTreeSet<usize> {
        let mut criteria = vec![
            (Field::MsgType, MsgType::NewOrder.as_str()),
            (Field::ResponseCode, ResponseCode::Success.as_str()),
        ];
        criteria.extend_from_slice(extra);

        let live = self.index().intersect(&criteria);
        let nonzero = self.index().exclude(Field::UnexecutedQty, fields::QTY_ZERO);
        live.intersection(&nonzero).copied().collect()
    }

    fn sum_unexecuted(&self, handles: BTreeSet<usize>) -> u32 {
        handles
            .into_iter()
            .filter_map(|handle| self.get(handle))
            .map(Order::unexecuted_qty_int)
            .sum()
    }

    fn materialize(&self, handles: BTreeSet<usize>) -> Vec<&Order> {
        handles
            .into_iter()
            .filter_map(|handle| self.get(handle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axe_types::{Message, OrderFill, OrderInstruction};

    fn acked(order_no: &str, ticker: &str, price: &str, qty: &str, at: &str) -> Order {
        Order::from_message(
            &Message::NewOrder(OrderInstruction::new(ticker, price, qty).with_order_no(order_no)),
            at,
        )
        .with_response_code(ResponseCode::Success)
    }

    fn populated() -> OrderLedger {
        let mut ledger = OrderLedger::new();
        ledger.apply_order(acked("00001", "000660", "60000", "00020", "2024-01-01T00:00:00Z"));
        ledger.apply_order(acked("00002", "000660", "59500", "00030", "2024-01-01T00:00:01Z"));
        ledger.apply_order(acked("00003", "005930", "71000", "00010", "2024-01-01T00:00:02Z"));
        ledger
    }

    fn fill(ledger: &mut OrderLedger, order_no: &str, qty: &str) {
        ledger.apply_messages(
            &[Message::OrderFill(OrderFill {
                order_no: order_no.into(),
                qty: qty.into(),
            })],
            "2024-01-01T00:01:00Z",
        );
    }

    #[test]
    fn test_unexecuted_qty_by_ticker_sums_live_orders() {
        let mut ledger = populated();
        assert_eq!(ledger.unexecuted_qty_by_ticker("000660"), 50);

        fill(&mut ledger, "00001", "00010");
        assert_eq!(ledger.unexecuted_qty_by_ticker("000660"), 40);
        assert_eq!(ledger.unexecuted_qty_by_ticker("005930"), 10);
        assert_eq!(ledger.unexecuted_qty_by_ticker("035720"), 0);
    }

    #[test]
    fn test_unexecuted_qty_by_ticker_and_price() {
        let ledger = populated();
        assert_eq!(ledger.unexecuted_qty_by_ticker_and_price("000660", "60000"), 20);
        assert_eq!(ledger.unexecuted_qty_by_ticker_and_price("000660", "59500"), 30);
        assert_eq!(ledger.unexecuted_qty_by_ticker_and_price("000660", "61000"), 0);
    }

    #[test]
    fn test_fully_executed_orders_leave_unexecuted_views() {
        let mut ledger = populated();
        fill(&mut ledger, "00001", "00020");

        let remaining = ledger.unexecuted_orders_by_ticker("000660");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].order_no, "00002");
    }

    #[test]
    fn test_order_book_excludes_fully_executed_orders() {
        let mut ledger = populated();
        fill(&mut ledger, "00001", "00020");

        let book = ledger.order_book_by_ticker("000660");
        let order_nos: Vec<&str> = book.iter().map(|o| o.order_no.as_str()).collect();
        assert_eq!(order_nos, ["00002"]);

        fill(&mut ledger, "00002", "00030");
        assert!(ledger.order_book_by_ticker("000660").is_empty());
    }

    #[test]
    fn test_unexecuted_orders_spans_tickers() {
        let mut ledger = populated();
        assert_eq!(ledger.unexecuted_orders().len(), 3);
        fill(&mut ledger, "00003", "00010");
        assert_eq!(ledger.unexecuted_orders().len(), 2);
    }

    #[test]
    fn test_order_book_sorted_by_price_then_time() {
        let mut ledger = populated();
        ledger.apply_order(acked("00004", "000660", "59500", "00005", "2024-01-01T00:00:03Z"));

        let book = ledger.order_book_by_ticker("000660");
        let order_nos: Vec<&str> = book.iter().map(|o| o.order_no.as_str()).collect();
        assert_eq!(order_nos, ["00002", "00004", "00001"]);
    }

    #[test]
    fn test_order_lookup_by_ticker_and_order_no() {
        let ledger = populated();
        let order = ledger.order_by_ticker_and_order_no("000660", "00001");
        assert_eq!(order.map(|o| o.price.as_deref()), Some(Some("60000")));
        assert!(ledger.order_by_ticker_and_order_no("005930", "00001").is_none());
        assert!(ledger.order_by_ticker_and_order_no("000660", "99999").is_none());
    }

    #[test]
    fn test_order_lookup_ignores_outcome() {
        let mut ledger = populated();
        let rejected = acked("00009", "035720", "50000", "00010", "2024-01-01T00:00:09Z")
            .with_response_code(ResponseCode::Fail);
        ledger.apply_order(rejected);
        fill(&mut ledger, "00001", "00020");

        // rejected and fully executed orders are still addressable by number
        assert!(ledger.order_by_ticker_and_order_no("035720", "00009").is_some());
        assert!(ledger.order_by_ticker_and_order_no("000660", "00001").is_some());
    }

    #[test]
    fn test_query_by_names() {
        let ledger = populated();
        let rows = ledger
            .query_by_names(&[("ticker", "000660"), ("price", "59500")])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_no, "00002");
    }

    #[test]
    fn test_empty_query_is_rejected() {
        let ledger = populated();
        assert_eq!(ledger.query_by_names(&[]), Err(QueryError::EmptyQuery));
    }

    #[test]
    fn test_unknown_field_name_is_rejected() {
        let ledger = populated();
        let err = ledger.query_by_names(&[("venue", "KRX")]).unwrap_err();
        assert_eq!(err, QueryError::UnsupportedParam { name: "venue".into() });
    }

    #[test]
    fn test_exclude_by_name() {
        let mut ledger = populated();
        fill(&mut ledger, "00001", "00020");

        let nonzero = ledger.exclude_by_name("unexecuted_qty", "00000").unwrap();
        let order_nos: Vec<&str> = nonzero.iter().map(|o| o.order_no.as_str()).collect();
        assert_eq!(order_nos, ["00002", "00003"]);
    }
}
