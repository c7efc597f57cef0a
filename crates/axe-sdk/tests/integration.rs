//! End-to-end client scenarios over a scripted transport

use axe_sdk::prelude::*;
use axe_session::MockTransport;
use std::sync::Arc;
use std::time::Duration;

fn fast_builder() -> AxeClientBuilder {
    AxeClientBuilder::new("127.0.0.1:9995")
        .with_ack_timeout(Duration::from_millis(50))
        .with_poll_timeout(Duration::from_millis(5))
}

fn client_with(responses: &[&[u8]]) -> AxeClient<MockTransport> {
    let mut transport = MockTransport::new("127.0.0.1:9995");
    for packet in responses {
        transport.push_response(packet.to_vec());
    }
    fast_builder().build_with_transport(transport).unwrap()
}

#[tokio::test]
async fn test_submit_order_round_trip() {
    let mut client = client_with(&[b"2000010"]);

    let order = client.submit_order("000660", 60000, 20).await.unwrap();
    assert_eq!(order.order_no, "00001");
    assert!(order.is_success());

    assert_eq!(client.unexecuted_qty_by_ticker("000660"), 20);
    assert_eq!(client.unexecuted_qty_by_ticker_and_price("000660", 60000), 20);
    assert_eq!(client.unexecuted_orders().len(), 1);

    let sent = client.session_mut().transport_mut().take_sent();
    assert_eq!(sent, vec![b"0000000006606000000020".to_vec()]);
}

#[tokio::test]
async fn test_rejected_order_stays_out_of_unexecuted_views() {
    // placeholder order number, response code 1
    let mut client = client_with(&[b"2000001"]);

    let order = client.submit_order("000660", 60000, 20).await.unwrap();
    assert!(!order.is_success());
    assert_eq!(order.order_no, "00000");

    assert_eq!(client.unexecuted_qty_by_ticker("000660"), 0);
    assert!(client.unexecuted_orders().is_empty());
}

#[tokio::test]
async fn test_fill_rides_along_with_next_ack() {
    let mut client = client_with(&[
        b"2000010",
        // fill for order 00001 batched in front of order 00002's ack
        b"300001000102000020",
    ]);

    client.submit_order("000660", 60000, 20).await.unwrap();
    let second = client.submit_order("000660", 59500, 30).await.unwrap();
    assert_eq!(second.order_no, "00002");

    assert_eq!(client.unexecuted_qty_by_ticker_and_price("000660", 60000), 10);
    assert_eq!(client.unexecuted_qty_by_ticker("000660"), 40);
}

#[tokio::test]
async fn test_cancel_consumes_quantity() {
    let mut client = client_with(&[b"2000010", b"2000010", b"2000010"]);

    let order = client.submit_order("000660", 60000, 20).await.unwrap();
    client
        .cancel_order(&order.order_no, "000660", 60000, 10)
        .await
        .unwrap();
    assert_eq!(client.unexecuted_qty_by_ticker("000660"), 10);

    client
        .cancel_order(&order.order_no, "000660", 60000, 10)
        .await
        .unwrap();
    assert_eq!(client.unexecuted_qty_by_ticker("000660"), 0);

    // gone from the outstanding views and from the book
    assert!(client.unexecuted_orders_by_ticker("000660").is_empty());
    assert!(client.order_book_by_ticker("000660").is_empty());
    // but still addressable by number
    assert!(client
        .order_by_ticker_and_order_no("000660", &order.order_no)
        .is_some());
}

#[tokio::test]
async fn test_ack_timeout_leaves_state_untouched() {
    let journal: Arc<MemoryJournal> = Arc::new(MemoryJournal::new());
    let transport = MockTransport::new("127.0.0.1:9995");
    let mut client = fast_builder()
        .with_journal(journal.clone())
        .build_with_transport(transport)
        .unwrap();

    let err = client.submit_order("000660", 60000, 20).await.unwrap_err();
    assert!(matches!(
        err,
        SdkError::Protocol(AxeError::AckTimeout { .. })
    ));

    // nothing journaled, nothing in the ledger
    assert_eq!(journal.len("NewOrder").unwrap(), 0);
    assert!(client.unexecuted_orders().is_empty());
}

#[tokio::test]
async fn test_query_facade_passthrough() {
    let mut client = client_with(&[b"2000010", b"2000020"]);

    client.submit_order("000660", 60000, 20).await.unwrap();
    client.submit_order("005930", 71000, 10).await.unwrap();

    let rows = client
        .query_by_names(&[("ticker", "000660"), ("msg_type", "0")])
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].order_no, "00001");

    let found = client.order_by_ticker_and_order_no("005930", "00002");
    assert_eq!(found.map(|o| o.price), Some(Some("71000".to_string())));

    assert!(matches!(
        client.query_by_names(&[]),
        Err(SdkError::Query(QueryError::EmptyQuery))
    ));
}

#[tokio::test]
async fn test_refresh_is_idempotent() {
    let mut client = client_with(&[b"2000010"]);
    client.submit_order("000660", 60000, 20).await.unwrap();

    assert_eq!(client.unexecuted_qty_by_ticker("000660"), 20);
    let applied = client.refresh().unwrap();
    assert_eq!(applied, 0);
    let applied = client.refresh().unwrap();
    assert_eq!(applied, 0);
    assert_eq!(client.unexecuted_qty_by_ticker("000660"), 20);
}

#[tokio::test]
async fn test_ledger_rebuilds_from_file_journal() {
    let dir = tempfile::tempdir().unwrap();
    let journal = Arc::new(FileJournal::new(dir.path()).unwrap());

    {
        let mut transport = MockTransport::new("127.0.0.1:9995");
        transport.push_response(b"2000010".to_vec());
        let mut client = fast_builder()
            .with_journal(journal.clone())
            .build_with_transport(transport)
            .unwrap();
        client.submit_order("000660", 60000, 20).await.unwrap();
        assert_eq!(client.unexecuted_qty_by_ticker("000660"), 20);
    }

    // fresh client over the same journal directory
    let client = fast_builder()
        .with_journal(journal)
        .build_with_transport(MockTransport::new("127.0.0.1:9995"))
        .unwrap();
    assert_eq!(client.unexecuted_qty_by_ticker("000660"), 0);
    client.refresh().unwrap();
    assert_eq!(client.unexecuted_qty_by_ticker("000660"), 20);
}

#[tokio::test]
async fn test_reset_produces_no_rows() {
    let mut client = client_with(&[]);
    client.reset().await.unwrap();

    assert!(client.unexecuted_orders().is_empty());
    let sent = client.session_mut().transport_mut().take_sent();
    assert_eq!(sent, vec![b"reset".to_vec()]);
}

#[tokio::test]
async fn test_transport_drop_recovers_transparently() {
    let mut transport = MockTransport::new("127.0.0.1:9995");
    transport.push_error(axe_session::TransportError::ReceiveFailed(
        "mock reset by peer".into(),
    ));
    transport.push_response(b"2000010".to_vec());

    let mut client = fast_builder()
        .with_resend_policy(
            ResendPolicy::new()
                .with_base_delay(Duration::from_millis(1))
                .with_jitter(0.0)
                .with_max_attempts(2),
        )
        .build_with_transport(transport)
        .unwrap();

    let order = client.submit_order("000660", 60000, 20).await.unwrap();
    assert_eq!(order.order_no, "00001");
    assert_eq!(client.unexecuted_qty_by_ticker("000660"), 20);

    // original send plus the resend after reconnecting
    assert_eq!(client.session_mut().transport_mut().take_sent().len(), 2);
}
