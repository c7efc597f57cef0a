//! Submit an order against a local exchange simulator and query the ledger
//!
//! Run with: cargo run --example submit_and_query

use axe_sdk::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut client = AxeClient::builder("127.0.0.1:9995")
        .with_ack_timeout(Duration::from_secs(3))
        .build()?;

    println!("Submitting 20 shares of 000660 at 60,000...");
    let order = client.submit_order("000660", 60000, 20).await?;
    println!("Accepted as order {}", order.order_no);

    println!("Cancelling 10 shares...");
    client
        .cancel_order(&order.order_no, "000660", 60000, 10)
        .await?;

    println!(
        "Unexecuted quantity for 000660: {}",
        client.unexecuted_qty_by_ticker("000660")
    );
    for row in client.order_book_by_ticker("000660") {
        println!(
            "  order {} @ {} remaining {:?}",
            row.order_no,
            row.price.as_deref().unwrap_or("-"),
            row.unexecuted_qty
        );
    }

    Ok(())
}
