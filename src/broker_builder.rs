//! Broker builder for creating broker instances.
//!
//! Provides a fluent builder API for constructing brokers with clear
//! separation between required and optional configuration.

use crate::{BrokerConfig, BrokerPtr, Error, Result};

/// Builder for creating broker instances.
///
/// # Examples
///
/// ## In-memory broker (default backend)
/// ```
/// use mom_broker::BrokerBuilder;
///
/// # async fn example() -> mom_broker::Result<()> {
/// let broker = BrokerBuilder::new()
///     .name("worker-7")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// ## Explicit backend selection
/// ```
/// use mom_broker::BrokerBuilder;
///
/// # async fn example() -> mom_broker::Result<()> {
/// let broker = BrokerBuilder::new()
///     .name("worker-7")
///     .backend("memory")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct BrokerBuilder {
    name: Option<String>,
    uri: Option<String>,
    backend: Option<String>,
}

impl BrokerBuilder {
    /// Create a new broker builder.
    pub fn new() -> Self {
        Self {
            name: None,
            uri: None,
            backend: None,
        }
    }

    /// Set the instance name (required).
    ///
    /// Used to prefix log lines emitted by the broker.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the backend connection URI.
    ///
    /// Ignored by the in-memory backend.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set explicit backend name.
    ///
    /// Valid values: `"memory"`
    ///
    /// If not specified, the in-memory backend is used.
    pub fn backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Build the broker (consumes self).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] if `name` was not set, or
    /// [`Error::Backend`] for an unrecognized backend name.
    pub async fn build(self) -> Result<BrokerPtr> {
        // Validate required fields
        let name = self
            .name
            .ok_or_else(|| Error::MissingConfig("name".into()))?;

        let config = BrokerConfig {
            uri: self.uri,
            name,
            backend: self.backend.clone(),
        };

        // Dispatch to the appropriate backend factory.
        //
        // When backend is explicit, use it directly. Memory is the
        // unconditional fallback; networked backends plug in here.
        match self.backend.as_deref() {
            Some("memory") | None => crate::create_memory_broker(config).await,
            Some(other) => Err(Error::Backend(format!(
                "unrecognized backend: {other}, valid values: memory"
            ))),
        }
    }
}

impl Default for BrokerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
