// tests/broker_memory.rs

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use mom_broker::{
    // ---
    handler_fn,
    Broker,
    BrokerConfig,
    Message,
};

#[tokio::test]
async fn memory_subscribe_then_publish_delivers() {
    // ---
    // Arrange
    // ---
    let config = BrokerConfig::memory("mstpd");

    let broker = mom_broker::create_memory_broker(config)
        .await
        .expect("failed to create memory broker");

    let (tx, mut rx) = mpsc::channel(100);

    let _sub = broker
        .subscribe(
            "orders",
            handler_fn(move |event| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(event).await;
                    Ok(())
                }
            }),
        )
        .await
        .expect("subscribe failed");

    let payload = Bytes::from_static(b"hello");
    let message = Message::new(payload.clone()).with_header("type", "created");

    // ---
    // Act
    // ---
    broker
        .publish("orders", message.clone())
        .await
        .expect("publish failed");

    // ---
    // Assert
    // ---
    let received = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("subscription channel closed unexpectedly");

    assert_eq!(received.topic(), "orders");
    assert_eq!(received.message().body, payload);
    assert_eq!(
        received.message().header.get("type").map(String::as_str),
        Some("created")
    );
    assert_eq!(*received.message(), message);
}

#[tokio::test]
async fn memory_publish_without_subscribers_is_noop() {
    // ---
    // Arrange
    // ---
    let broker = mom_broker::create_memory_broker(BrokerConfig::memory("noop"))
        .await
        .expect("failed to create memory broker");

    // ---
    // Act / Assert
    // ---
    broker
        .publish("unused", Message::new(b"nobody listens".to_vec()))
        .await
        .expect("publish to empty topic must succeed");
}
