//! Domain layer public interface.
//!
//! This module defines domain-level abstractions that are independent of
//! backend implementations, protocols, or infrastructure concerns.
//!
//! All domain consumers must import symbols via this module, not by
//! referencing individual files directly.

mod broker;

// --- Broker domain re-exports ---

#[allow(unused)]
pub use broker::{
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
