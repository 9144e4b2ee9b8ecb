// src/domain/broker.rs

//! Broker domain abstractions.
//!
//! This module defines the domain-level publish/subscribe contract used by
//! callers to exchange messages. It intentionally avoids any reference to
//! concrete backends, brokers, or client libraries.
//!
//! The broker layer is responsible only for delivering opaque messages to
//! subscribed handlers. Higher-level semantics such as acknowledgment,
//! retries, or timeouts are the caller's concern.
//!
//! Concrete implementations of this interface live under `src/backend/`.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, SubscriptionId};

/// Acquire mutex guard, ignoring poisoning
pub(crate) fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// An immutable message envelope.
///
/// A `Message` is the unit of exchange between publishers and subscribers.
/// It carries a flat string-to-string header for metadata (content type,
/// correlation id, a `"type"` discriminator for the body's schema, ...)
/// and an opaque byte payload.
///
/// The broker never interprets, encodes, or decodes the body; its format
/// is entirely the caller's concern. An empty header is valid; absence
/// of a key means "unset", not an error.
///
/// Once handed to `publish()`, a message is logically shared read-only by
/// every receiving handler. No handler may assume exclusive mutation
/// rights over a message it receives.
///
/// # Examples
///
/// ```
/// use mom_broker::Message;
///
/// let msg = Message::new(b"payload".to_vec()).with_header("type", "created");
/// assert_eq!(msg.header.get("type").map(String::as_str), Some("created"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Metadata as a flat string-to-string mapping, keys unique.
    pub header: HashMap<String, String>,

    /// Opaque payload bytes, never interpreted by the broker.
    pub body: Bytes,
}

impl Message {
    /// Create a message with the given body and an empty header.
    pub fn new(body: impl Into<Bytes>) -> Self {
        // ---
        Self {
            header: HashMap::new(),
            body: body.into(),
        }
    }

    /// Add a header entry (consumes and returns the message).
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.insert(key.into(), value.into());
        self
    }

    /// Create a message whose body is the JSON encoding of `body`.
    ///
    /// This is a caller-side convenience; the broker itself never touches
    /// the encoding. Pair it with a `"type"` header when subscribers need
    /// a schema discriminator:
    ///
    /// ```
    /// use mom_broker::Message;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Person {
    ///     name: String,
    ///     age: u32,
    /// }
    ///
    /// # fn example() -> mom_broker::Result<()> {
    /// let person = Person { name: "jack".into(), age: 22 };
    /// let msg = Message::json(&person)?.with_header("type", "person");
    /// # Ok(())
    /// # }
    /// ```
    pub fn json<T: Serialize>(body: &T) -> Result<Self> {
        // ---
        let bytes = serde_json::to_vec(body)?;
        Ok(Self::new(bytes))
    }
}

/// A received occurrence delivered to a subscriber.
///
/// An `Event` wraps the topic a message arrived on and the message itself.
/// The topic always equals the topic the subscriber registered on; the
/// broker performs no rewriting.
///
/// It additionally carries a mutable error slot a handler may set to
/// signal a processing failure to its own downstream consumers (manual
/// acknowledgment-style flows). The broker never reads the slot and never
/// rethrows from it.
///
/// Events are created fresh per publish, per subscriber, and are cheap to
/// clone (the inner state is shared).
#[derive(Clone, Debug)]
pub struct Event {
    inner: Arc<EventInner>,
}

#[derive(Debug)]
struct EventInner {
    topic: Arc<str>,
    message: Arc<Message>,
    error: Mutex<Option<Arc<Error>>>,
}

impl Event {
    /// Create an event for `topic` carrying `message`.
    ///
    /// Called by backends during dispatch; callers normally only consume
    /// events inside handlers.
    pub fn new(topic: Arc<str>, message: Arc<Message>) -> Self {
        // ---
        Self {
            inner: Arc::new(EventInner {
                topic,
                message,
                error: Mutex::new(None),
            }),
        }
    }

    /// The topic this event was published under.
    pub fn topic(&self) -> &str {
        &self.inner.topic
    }

    /// The delivered message.
    pub fn message(&self) -> &Message {
        &self.inner.message
    }

    /// Record a processing failure on this event.
    ///
    /// Later calls overwrite earlier ones; the last error set wins.
    pub fn set_error(&self, err: Error) {
        let mut slot = lock_ignore_poison(&self.inner.error);
        *slot = Some(Arc::new(err));
    }

    /// The processing failure recorded on this event, if any.
    pub fn error(&self) -> Option<Arc<Error>> {
        lock_ignore_poison(&self.inner.error).clone()
    }
}

/// Boxed future returned by type-erased handler invocations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A subscriber callback.
///
/// A `Handler` processes one [`Event`] and reports success or failure.
/// The broker treats a failure as local to that subscriber: no retry, no
/// propagation to the publisher, no removal of the subscription. The
/// failure is logged and dispatch to the remaining subscribers continues.
///
/// Any `Fn(Event) -> impl Future<Output = Result<()>>` closure implements
/// this trait; see [`handler_fn`] for wrapping one into a [`HandlerPtr`].
pub trait Handler: Send + Sync {
    /// Process one delivered event.
    fn call(&self, event: Event) -> BoxFuture<'static, Result<()>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Event) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn call(&self, event: Event) -> BoxFuture<'static, Result<()>> {
        Box::pin((self)(event))
    }
}

/// Shared handler pointer.
///
/// This is an `Arc<dyn Handler>`, so `.clone()` is cheap and the same
/// handler may be registered under several topics.
pub type HandlerPtr = Arc<dyn Handler>;

/// Wrap an async closure into a [`HandlerPtr`].
///
/// # Example
///
/// ```
/// use mom_broker::handler_fn;
///
/// let handler = handler_fn(|event| async move {
///     println!("got {} bytes on {}", event.message().body.len(), event.topic());
///     Ok(())
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerPtr
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(f)
}

/// Removal hook a backend installs into a [`Subscription`].
pub type RemoveFn = Box<dyn Fn() + Send + Sync>;

/// A live registration of one handler under one topic.
///
/// The handle's sole operation is [`unsubscribe`](Subscription::unsubscribe);
/// it exposes no registry state. Dropping the handle also unsubscribes, so
/// a subscription can be scoped to a block and is released on every exit
/// path.
///
/// Once removed, the subscription is never delivered to again, though a
/// dispatch whose snapshot was taken before removal may still complete.
pub struct Subscription {
    // ---
    id: SubscriptionId,
    topic: Arc<str>,
    removed: AtomicBool,
    remove: RemoveFn,
}

impl Subscription {
    /// Create a subscription handle.
    ///
    /// Called by backends after inserting the registry entry; `remove`
    /// must delete exactly that entry and must tolerate the broker having
    /// been closed in the meantime.
    pub fn new(id: SubscriptionId, topic: Arc<str>, remove: RemoveFn) -> Self {
        // ---
        Self {
            id,
            topic,
            removed: AtomicBool::new(false),
            remove,
        }
    }

    /// The unique identity of this subscription.
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    /// The topic this subscription was registered on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Remove this subscription from its broker.
    ///
    /// Idempotent: calling it again after removal is a no-op returning
    /// `Ok`, so unsubscribe-on-every-exit-path cleanup is harmless. After
    /// this returns, no future publish will include the subscription; a
    /// publish snapshot taken concurrently may deliver once more.
    pub fn unsubscribe(&self) -> Result<()> {
        if !self.removed.swap(true, Ordering::SeqCst) {
            (self.remove)();
        }
        Ok(())
    }
}

impl Drop for Subscription {
    /// Dropping the handle unsubscribes (scoped acquisition).
    fn drop(&mut self) {
        let _ = self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("removed", &self.removed.load(Ordering::SeqCst))
            .finish()
    }
}

/// Broker abstraction.
///
/// A `Broker` provides best-effort, in-process, at-most-once-per-subscriber
/// delivery of messages from publishers to topic subscribers. It defines
/// the minimal contract required by callers without committing to any
/// specific backend; additional backends (networked queues, external
/// brokers) can satisfy it without changing caller code.
///
/// Implementations must ensure that:
/// - Once `subscribe()` returns successfully, messages published *after*
///   that point on the same topic are delivered to the new subscription.
/// - A handler failure or panic is isolated to that subscriber and never
///   aborts dispatch to the others, nor surfaces through `publish()`.
/// - Registry locks are never held across a handler invocation, so a
///   handler may unsubscribe itself without deadlocking.
/// - No assumptions are made about ordering across topics, durability, or
///   retries beyond what is explicitly documented.
///
/// The in-memory backend serves as the reference implementation of these
/// semantics.
///
/// # Available Implementations
///
/// - [`create_memory_broker`](crate::create_memory_broker) - in-process
///   backend (always available)
///
/// # Notes
///
/// This trait uses `async_trait`; the expanded documentation may show
/// explicit lifetimes and a boxed `Future`. This is an implementation
/// detail — consumers should treat methods as normal `async fn`s.
#[async_trait::async_trait]
pub trait Broker: Send + Sync + fmt::Debug {
    // ---

    /// Publish a message to every current subscriber of `topic`.
    ///
    /// Dispatch runs against a point-in-time snapshot of the topic's
    /// subscriber set. Publishing to a topic with no subscribers succeeds
    /// trivially.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] after `close()`, or
    /// [`Error::InvalidArgument`] for an empty topic. Individual handler
    /// failures are never surfaced here.
    async fn publish(&self, topic: &str, message: Message) -> Result<()>;

    /// Register `handler` under `topic` and return the handle that owns
    /// the registration's lifecycle.
    ///
    /// Never blocks on in-flight dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] after `close()`, or
    /// [`Error::InvalidArgument`] for an empty topic.
    async fn subscribe(&self, topic: &str, handler: HandlerPtr) -> Result<Subscription>;

    /// Close the broker and forcibly unsubscribe everyone.
    ///
    /// After close, `publish()` and `subscribe()` fail with
    /// [`Error::Closed`]. A dispatch already in progress is not
    /// interrupted. Idempotent.
    async fn close(&self) -> Result<()>;
}

/// Shared broker pointer.
///
/// This is an `Arc<dyn Broker>`, which means:
/// - `.clone()` is cheap (only increments a reference count)
/// - Multiple clones share the same underlying registry
/// - Used to erase concrete backend types behind a stable domain interface.
pub type BrokerPtr = Arc<dyn Broker>;

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_message_builder() {
        // ---
        let msg = Message::new(b"abc".to_vec())
            .with_header("type", "person")
            .with_header("content-type", "application/json");

        assert_eq!(msg.body, Bytes::from_static(b"abc"));
        assert_eq!(msg.header.get("type").map(String::as_str), Some("person"));
        assert_eq!(msg.header.get("missing"), None);
    }

    #[test]
    fn test_message_json_body() {
        // ---
        #[derive(Serialize)]
        struct Probe {
            n: u32,
        }

        let msg = Message::json(&Probe { n: 7 }).expect("json encoding failed");
        assert_eq!(&*msg.body, br#"{"n":7}"#);
    }

    #[test]
    fn test_event_error_slot() {
        // ---
        let event = Event::new(
            Arc::from("orders"),
            Arc::new(Message::new(b"x".to_vec())),
        );
        assert!(event.error().is_none());

        event.set_error(Error::Handler("boom".into()));

        let err = event.error().expect("error slot empty");
        assert!(matches!(*err, Error::Handler(_)));
        assert_eq!(event.topic(), "orders");
    }

    #[test]
    fn test_unsubscribe_invokes_remove_once() {
        // ---
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let sub = Subscription::new(
            SubscriptionId::generate(),
            Arc::from("orders"),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        sub.unsubscribe().unwrap();
        sub.unsubscribe().unwrap();
        drop(sub);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
