//! Backend implementations.
//!
//! This module provides concrete implementations of the domain-level
//! `Broker` trait. All backends are exposed only through constructor
//! functions.
//!
//! Domain code must not depend on backend-specific types.

mod memory;

#[allow(unused)]
pub use memory::create_memory_broker;
