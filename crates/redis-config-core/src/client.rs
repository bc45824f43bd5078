//! Capability ports over the remote store.
//!
//! The provider never talks to a concrete Redis client. It goes through the
//! three small traits in this module, which model exactly the capabilities a
//! configuration source needs:
//!
//! - [`RemoteConnection`]: a live connection that can hand out the other two
//! - [`RemoteDatabase`]: the selected logical database, for hash reads
//! - [`RemoteSubscriber`]: pub/sub registration for change notifications
//!
//! Connections are produced by a [`ConnectFn`] factory. The factory is a
//! deferred closure: constructing a source captures it without invoking it,
//! and the provider calls it at most once over its lifetime (retrying only
//! while no call has succeeded). The `redis-config-client` crate supplies
//! the production implementation over the `redis` crate; [`crate::memory`]
//! supplies an in-process one for tests.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::mpsc;

use crate::error::SourceResult;

/// Namespace prefix of keyspace notification channels.
pub const KEYSPACE_PREFIX: &str = "__keyspace";

/// Derive the notification channel for a hash key in a logical database.
///
/// The store publishes an event on this channel whenever any write touches
/// `key` in database `database_index`, provided keyspace notifications are
/// enabled server-side.
pub fn keyspace_channel(database_index: i64, key: &str) -> String {
    format!("{KEYSPACE_PREFIX}@{database_index}__:{key}")
}

/// A message delivered on a subscribed channel.
///
/// For keyspace notifications the payload names the store command that
/// triggered the event (for example `hset` or `del`). The provider treats
/// any message as a reload trigger and never inspects the payload beyond
/// logging it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreMessage {
    /// Channel the message arrived on.
    pub channel: String,
    /// Message payload as UTF-8 text.
    pub payload: String,
}

/// Future returned by a [`ConnectFn`] factory invocation.
pub type ConnectFuture = BoxFuture<'static, SourceResult<Arc<dyn RemoteConnection>>>;

/// Deferred connection factory.
///
/// Stored by the source descriptor and invoked lazily by the provider the
/// first time a connection is needed. A failed invocation leaves the
/// provider unconnected, so the factory runs again on the next attempt.
pub type ConnectFn = dyn Fn() -> ConnectFuture + Send + Sync;

/// A live connection to the remote store.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteConnection: Send + Sync {
    /// The logical database this connection selected.
    fn database(&self) -> Arc<dyn RemoteDatabase>;

    /// A pub/sub registration handle sharing this connection's endpoint.
    fn subscriber(&self) -> Arc<dyn RemoteSubscriber>;
}

/// Read access to one logical database of the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteDatabase: Send + Sync {
    /// Index of the selected logical database.
    fn index(&self) -> i64;

    /// Read every field of the hash stored at `key`.
    ///
    /// A missing key reads as an empty field list, not an error.
    async fn read_hash(&self, key: &str) -> SourceResult<Vec<(String, String)>>;
}

/// Pub/sub registration against the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteSubscriber: Send + Sync {
    /// Subscribe to `channel` and stream its messages into the returned
    /// receiver. The subscription lives until the receiver is dropped.
    async fn subscribe(&self, channel: &str) -> SourceResult<mpsc::Receiver<StoreMessage>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_combines_prefix_database_and_key() {
        assert_eq!(keyspace_channel(0, "appsettings"), "__keyspace@0__:appsettings");
        assert_eq!(keyspace_channel(5, "tenant:alpha"), "__keyspace@5__:tenant:alpha");
    }

    #[test]
    fn test_channel_preserves_key_casing() {
        assert_eq!(keyspace_channel(2, "AppSettings"), "__keyspace@2__:AppSettings");
    }
}
