// src/backend/memory.rs

//! In-memory broker implementation.
//!
//! This module provides a pure in-process implementation of the
//! domain-level `Broker` trait. It is intended for testing, local
//! execution, and as the reference for broker semantics.
//!
//! ## Reference Semantics
//!
//! The in-memory broker defines the **reference behavior** for the broker
//! layer. Other backends are expected to approximate this behavior as
//! closely as their underlying systems allow and to document any
//! unavoidable deviations.
//!
//! In particular, the in-memory broker establishes the following
//! expectations:
//!
//! - Once `subscribe()` returns successfully, messages published *after*
//!   that point on the same topic are delivered to the new subscription.
//! - Dispatch runs against a point-in-time snapshot of a topic's
//!   subscriber list: subscribers added mid-dispatch do not receive the
//!   in-flight publish, and an unsubscribe racing an already-taken
//!   snapshot may be delivered to once more.
//! - Fan-out is synchronous and sequential in registration order:
//!   `publish()` returns only after every handler in the snapshot has
//!   run. The backend offers no queuing or backpressure, so this is the
//!   only policy that keeps error reporting deterministic.
//! - A handler failure or panic is confined to that subscriber.
//!
//! ## Non-Goals
//!
//! Persistence, delivery across process restarts, exactly-once semantics,
//! ordering across different topics, or emulation of any specific
//! networked broker. Delivery is best-effort, in-process, at most once
//! per subscriber.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

#[allow(unused_imports)]
use crate::{
    // ---
    log_debug,
    log_error,
    log_info,
    log_warn,
    Broker,
    BrokerConfig,
    BrokerPtr,
    Error,
    Event,
    HandlerPtr,
    Message,
    Result,
    Subscription,
    SubscriptionId,
};

/// One registered handler under a topic.
#[derive(Clone)]
struct SubscriberEntry {
    id: SubscriptionId,
    handler: HandlerPtr,
}

/// Topic → registration-ordered subscriber list.
///
/// `DashMap` shards give mutual exclusion per topic without a global
/// lock, so publish/subscribe traffic on unrelated topics does not
/// contend. Shard locks are only ever held to copy or mutate a list,
/// never across a handler invocation.
type Registry = DashMap<Arc<str>, Vec<SubscriberEntry>>;

/// State shared by every broker clone and, via `Weak`, by every
/// outstanding `Subscription` handle.
struct Inner {
    name: String,
    topics: Registry,
    closed: AtomicBool,
}

impl Inner {
    /// Remove one subscription from a topic, pruning the topic's slot
    /// once its list empties. Safe to call after `close()` cleared the
    /// registry; removing an absent entry is a no-op.
    fn remove(&self, topic: &str, id: &SubscriptionId) {
        let emptied = match self.topics.get_mut(topic) {
            Some(mut subs) => {
                subs.retain(|sub| sub.id != *id);
                subs.is_empty()
            }
            None => false,
        };

        // Shard lock released above; re-check under the lock so a
        // concurrent subscribe that repopulated the list is kept.
        if emptied {
            self.topics.remove_if(topic, |_, subs| subs.is_empty());
        }
    }
}

/// In-memory broker.
///
/// Simulates a message broker entirely within the process. All clones of
/// the returned [`BrokerPtr`] share one registry, exactly as callers
/// connected to a real broker would share its topics.
struct MemoryBroker {
    // ---
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBroker")
            .field("name", &self.inner.name)
            .field("closed", &self.inner.closed.load(Ordering::Acquire))
            .finish()
    }
}

#[async_trait::async_trait]
impl Broker for MemoryBroker {
    // ---

    /// Publish a message to every subscriber in the topic's snapshot.
    ///
    /// Handler failures are logged and never surface here; see the
    /// module docs for the dispatch policy.
    async fn publish(&self, topic: &str, message: Message) -> Result<()> {
        // ---
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        if topic.is_empty() {
            return Err(Error::InvalidArgument("topic must not be empty".into()));
        }

        // Point-in-time copy of the subscriber list. The shard lock is
        // released before any handler runs, so handlers are free to
        // subscribe or unsubscribe without deadlocking.
        let snapshot = self
            .inner
            .topics
            .get(topic)
            .map(|entry| (entry.key().clone(), entry.value().clone()));

        let Some((topic, subscribers)) = snapshot else {
            // Zero subscribers: a successful no-op, never an error.
            return Ok(());
        };

        let message = Arc::new(message);

        for SubscriberEntry { id, handler } in subscribers {
            let event = Event::new(topic.clone(), message.clone());

            // Each handler runs in its own task so a panic is contained
            // to that subscriber; the await keeps fan-out synchronous.
            let outcome = tokio::spawn(async move { handler.call(event).await }).await;

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    log_error!(
                        "{}: handler {id} failed on topic {topic}: {err}",
                        self.inner.name
                    );
                }
                Err(join_err) if join_err.is_panic() => {
                    log_error!(
                        "{}: handler {id} panicked on topic {topic}",
                        self.inner.name
                    );
                }
                Err(_join_err) => {
                    // Cancelled: the runtime is shutting down.
                }
            }
        }

        Ok(())
    }

    /// Register a subscription.
    ///
    /// Once this function returns successfully, any subsequent publish on
    /// the same topic is delivered to the new handler. Publishes whose
    /// snapshot was taken before registration completed do not see it.
    async fn subscribe(&self, topic: &str, handler: HandlerPtr) -> Result<Subscription> {
        // ---
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        if topic.is_empty() {
            return Err(Error::InvalidArgument("topic must not be empty".into()));
        }

        let key: Arc<str> = Arc::from(topic);
        let id = SubscriptionId::generate();

        log_debug!("{}: subscribe {id} to topic {topic}", self.inner.name);

        self.inner.topics.entry(key.clone()).or_default().push(SubscriberEntry {
            id: id.clone(),
            handler,
        });

        // close() may have cleared the registry between the flag check
        // and the insert; back out so a closed broker holds no entries.
        if self.inner.closed.load(Ordering::Acquire) {
            self.inner.remove(&key, &id);
            return Err(Error::Closed);
        }

        // The handle holds only a Weak reference: an outstanding
        // Subscription must not keep a dropped broker's registry alive.
        let weak = Arc::downgrade(&self.inner);
        let remove = {
            let key = key.clone();
            let id = id.clone();
            move || {
                if let Some(inner) = weak.upgrade() {
                    log_debug!("{}: unsubscribe {id} from topic {key}", inner.name);
                    inner.remove(&key, &id);
                }
            }
        };

        Ok(Subscription::new(id, key, Box::new(remove)))
    }

    /// Close the broker.
    ///
    /// Clears the registry, forcibly unsubscribing everyone. A dispatch
    /// already running from an earlier snapshot is not interrupted.
    /// Idempotent.
    async fn close(&self) -> Result<()> {
        // ---
        // First close wins; repeat calls are no-ops.
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            log_debug!("{}: closing broker...", self.inner.name);
            self.inner.topics.clear();
        }
        Ok(())
    }
}

/// Create a new in-memory broker.
///
/// Always available and requires no external resources. The config's
/// `uri` is ignored; `name` prefixes the broker's log lines.
///
/// # Errors
///
/// Currently infallible — always returns `Ok`.
pub async fn create_memory_broker(config: BrokerConfig) -> Result<BrokerPtr> {
    // ---
    log_debug!("{}: create memory broker", config.name);

    let broker = MemoryBroker {
        // ---
        inner: Arc::new(Inner {
            name: config.name,
            topics: DashMap::new(),
            closed: AtomicBool::new(false),
        }),
    };

    Ok(Arc::new(broker))
}
