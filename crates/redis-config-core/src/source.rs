//! Source descriptors.
//!
//! A [`RedisConfigSource`] is the validated description of where
//! configuration lives: a connection factory, the hash key to read, and
//! whether to reload on change notifications. Descriptors are inert; no
//! connection is attempted until [`RedisConfigSource::build`] turns one
//! into a provider, and even then only when reload-on-change asks for an
//! eager subscription.
//!
//! [`RedisSourceOptions`] is the plain-data mirror of a descriptor, meant
//! for embedding in application settings files.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::{ConnectFn, ConnectFuture};
use crate::error::{SourceError, SourceResult};
use crate::provider::RedisConfigProvider;

/// Plain-data settings for a Redis configuration source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisSourceOptions {
    /// Connection string understood by the client adapter.
    pub connection_string: String,
    /// Hash key holding the configuration.
    pub key: String,
    /// Reload the snapshot when the key changes. Defaults to off.
    #[serde(default)]
    pub reload_on_change: bool,
}

impl RedisSourceOptions {
    /// Options with reload-on-change disabled.
    pub fn new(connection_string: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            key: key.into(),
            reload_on_change: false,
        }
    }

    /// Toggle reload-on-change.
    pub fn with_reload_on_change(mut self, reload_on_change: bool) -> Self {
        self.reload_on_change = reload_on_change;
        self
    }
}

/// Validated description of a Redis configuration source.
pub struct RedisConfigSource {
    factory: Arc<ConnectFn>,
    key: String,
    reload_on_change: bool,
}

impl RedisConfigSource {
    /// Describe a source using a deferred connection factory.
    ///
    /// The factory is captured, not invoked. Fails if `key` is empty.
    pub fn new<F>(
        factory: F,
        key: impl Into<String>,
        reload_on_change: bool,
    ) -> SourceResult<Self>
    where
        F: Fn() -> ConnectFuture + Send + Sync + 'static,
    {
        let key = key.into();
        if key.is_empty() {
            return Err(SourceError::invalid_source(
                "configuration key must not be empty",
            ));
        }
        Ok(Self {
            factory: Arc::new(factory),
            key,
            reload_on_change,
        })
    }

    /// Hash key holding the configuration.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the built provider will reload on change notifications.
    pub fn reload_on_change(&self) -> bool {
        self.reload_on_change
    }

    /// Build the provider for this source, consuming the descriptor.
    ///
    /// With reload-on-change enabled this connects and subscribes before
    /// returning; otherwise it performs no I/O and the provider connects on
    /// its first load.
    pub async fn build(self) -> SourceResult<RedisConfigProvider> {
        RedisConfigProvider::new(self.factory, self.key, self.reload_on_change).await
    }
}

impl fmt::Debug for RedisConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfigSource")
            .field("key", &self.key)
            .field("reload_on_change", &self.reload_on_change)
            .finish()
    }
}
