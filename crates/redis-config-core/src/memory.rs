//! In-process store implementing the remote capability ports.
//!
//! [`MemoryStore`] keeps hashes and pub/sub channels in plain maps behind
//! mutexes, with the same observable behavior as the production adapter:
//! missing hashes read as empty, subscriptions deliver in publish order,
//! and [`MemoryStore::notify_hash_written`] publishes on the exact channel
//! a real store would use for a hash write. Tests build providers against
//! it through [`MemoryStore::factory`] without touching the network.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::client::{
    keyspace_channel, ConnectFuture, RemoteConnection, RemoteDatabase, RemoteSubscriber,
    StoreMessage,
};
use crate::error::SourceResult;

const CHANNEL_CAPACITY: usize = 16;

/// Shared in-process store.
#[derive(Default)]
pub struct MemoryStore {
    database_index: i64,
    hashes: Mutex<HashMap<String, Vec<(String, String)>>>,
    subscribers: Mutex<HashMap<String, Vec<mpsc::Sender<StoreMessage>>>>,
}

impl MemoryStore {
    /// A store selecting logical database 0.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A store selecting the given logical database.
    pub fn with_database_index(index: i64) -> Arc<Self> {
        Arc::new(Self {
            database_index: index,
            ..Self::default()
        })
    }

    /// Replace the hash stored at `key`.
    pub fn set_hash(&self, key: impl Into<String>, fields: Vec<(String, String)>) {
        self.hashes.lock().insert(key.into(), fields);
    }

    /// Delete the hash stored at `key`.
    pub fn remove_hash(&self, key: &str) {
        self.hashes.lock().remove(key);
    }

    /// Publish a message, returning how many subscribers received it.
    pub async fn publish(&self, channel: &str, payload: &str) -> usize {
        let senders: Vec<mpsc::Sender<StoreMessage>> = self
            .subscribers
            .lock()
            .get(channel)
            .map(|subscribed| subscribed.to_vec())
            .unwrap_or_default();

        let mut delivered = 0;
        for sender in senders {
            let message = StoreMessage {
                channel: channel.to_string(),
                payload: payload.to_string(),
            };
            if sender.send(message).await.is_ok() {
                delivered += 1;
            }
        }

        let mut subscribers = self.subscribers.lock();
        if let Some(subscribed) = subscribers.get_mut(channel) {
            subscribed.retain(|sender| !sender.is_closed());
            if subscribed.is_empty() {
                subscribers.remove(channel);
            }
        }

        delivered
    }

    /// Publish the keyspace notification a hash write to `key` would emit.
    pub async fn notify_hash_written(&self, key: &str) -> usize {
        let channel = keyspace_channel(self.database_index, key);
        self.publish(&channel, "hset").await
    }

    /// Number of live subscriptions on `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.subscribers
            .lock()
            .get(channel)
            .map(|subscribed| subscribed.iter().filter(|sender| !sender.is_closed()).count())
            .unwrap_or(0)
    }

    /// Open a connection to this store.
    pub fn connection(self: &Arc<Self>) -> Arc<dyn RemoteConnection> {
        Arc::new(MemoryConnection {
            store: Arc::clone(self),
        })
    }

    /// A connection factory handing out connections to this store.
    pub fn factory(self: &Arc<Self>) -> impl Fn() -> ConnectFuture + Send + Sync + 'static {
        let store = Arc::clone(self);
        move || {
            let store = Arc::clone(&store);
            async move { Ok(store.connection()) }.boxed()
        }
    }
}

struct MemoryConnection {
    store: Arc<MemoryStore>,
}

impl RemoteConnection for MemoryConnection {
    fn database(&self) -> Arc<dyn RemoteDatabase> {
        Arc::new(MemoryDatabase {
            store: Arc::clone(&self.store),
        })
    }

    fn subscriber(&self) -> Arc<dyn RemoteSubscriber> {
        Arc::new(MemorySubscriber {
            store: Arc::clone(&self.store),
        })
    }
}

struct MemoryDatabase {
    store: Arc<MemoryStore>,
}

#[async_trait::async_trait]
impl RemoteDatabase for MemoryDatabase {
    fn index(&self) -> i64 {
        self.store.database_index
    }

    async fn read_hash(&self, key: &str) -> SourceResult<Vec<(String, String)>> {
        Ok(self
            .store
            .hashes
            .lock()
            .get(key)
            .cloned()
            .unwrap_or_default())
    }
}

struct MemorySubscriber {
    store: Arc<MemoryStore>,
}

#[async_trait::async_trait]
impl RemoteSubscriber for MemorySubscriber {
    async fn subscribe(&self, channel: &str) -> SourceResult<mpsc::Receiver<StoreMessage>> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.store
            .subscribers
            .lock()
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }
}
