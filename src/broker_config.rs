//! Public, backend-agnostic broker configuration.
//!
//! This type intentionally contains no backend-specific concepts
//! (e.g. connection pooling or queue declarations). Backend layers are
//! responsible for interpreting this config into concrete settings.

/// Broker configuration and connection parameters.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    // ---
    /// Backend connection URI.
    ///
    /// For networked backends this specifies the broker address (e.g.,
    /// "nats://localhost:4222", "amqp://localhost:5672/%2f").
    ///
    /// The in-memory backend needs no connection and ignores this field;
    /// it exists so that networked backends have a configuration seam.
    pub uri: Option<String>,

    /// Instance name, used for logging.
    pub name: String,

    /// Optional backend override (e.g. `"memory"`).
    ///
    /// If `None`, the builder falls back to the in-memory backend.
    pub backend: Option<String>,
}

impl BrokerConfig {
    /// Create a new `BrokerConfig` for a networked backend URI.
    pub fn with_broker(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            name: name.into(),
            backend: None,
        }
    }

    /// Create an in-memory broker config (no connection).
    pub fn memory(name: impl Into<String>) -> Self {
        Self {
            uri: None,
            name: name.into(),
            backend: Some("memory".to_string()),
        }
    }

    /// Set an explicit backend name.
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }
}
