//! Topic-addressed publish/subscribe with a pluggable backend
//!
//! This library provides a simple, ergonomic API for fanning messages out
//! to topic subscribers. It handles safe concurrent registration and
//! removal of subscribers while dispatch is in flight, per-subscriber
//! failure isolation, and broker lifecycle (open → serving → closed).
//!
//! The in-memory backend is the reference implementation: best-effort,
//! in-process, at-most-once-per-subscriber delivery. Additional backends
//! (networked queues, external brokers) can implement the [`Broker`]
//! trait without changing caller code.
//!
//! # Quick example
//!
//! ```
//! use mom_broker::{handler_fn, Broker, BrokerBuilder, Message};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> mom_broker::Result<()> {
//! let broker = BrokerBuilder::new().name("app").build().await?;
//!
//! let (tx, mut rx) = mpsc::channel(16);
//! let sub = broker
//!     .subscribe(
//!         "orders",
//!         handler_fn(move |event| {
//!             let tx = tx.clone();
//!             async move {
//!                 let _ = tx.send(event).await;
//!                 Ok(())
//!             }
//!         }),
//!     )
//!     .await?;
//!
//! broker
//!     .publish(
//!         "orders",
//!         Message::new(b"created".to_vec()).with_header("type", "created"),
//!     )
//!     .await?;
//!
//! let event = rx.recv().await.expect("delivery");
//! assert_eq!(event.topic(), "orders");
//!
//! sub.unsubscribe()?;
//! broker.close().await?;
//! # Ok(())
//! # }
//! ```

// Import all sub modules once...
mod backend;
mod domain;

mod broker_builder;
mod broker_config;

mod error;
mod macros;
mod subscription_id;

// Re-export main types
pub use broker_builder::BrokerBuilder;
pub use broker_config::BrokerConfig;

pub use error::{Error, Result};
pub use subscription_id::SubscriptionId;

pub use backend::create_memory_broker;

pub(crate) use macros::{log_debug, log_error, log_info, log_warn};

// --- public re-exports
pub use domain::{
    //
    handler_fn,
    BoxFuture,
    Broker,
    BrokerPtr,
    Event,
    Handler,
    HandlerPtr,
    Message,
    RemoveFn,
    Subscription,
};

/// Create a broker from a [`BrokerConfig`], dispatching on its `backend`
/// field. The in-memory backend is the fallback when no backend is named.
pub async fn create_broker(config: BrokerConfig) -> Result<BrokerPtr> {
    // ---
    match config.backend.as_deref() {
        Some("memory") | None => create_memory_broker(config).await,
        Some(other) => Err(Error::Backend(format!(
            "unrecognized backend: {other}, valid values: memory"
        ))),
    }
}
