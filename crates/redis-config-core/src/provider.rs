//! Redis-backed configuration provider.
//!
//! [`RedisConfigProvider`] reads one hash from the remote store into an
//! immutable [`ConfigData`] snapshot and serves lookups from it. Loading
//! replaces the snapshot wholesale; readers holding the previous [`Arc`]
//! keep a consistent view.
//!
//! # Connection lifecycle
//!
//! The provider connects lazily through the [`ConnectFn`] captured by its
//! source. The first operation that needs the store invokes the factory;
//! later operations reuse the cached connection. A failed connect caches
//! nothing, so the next operation invokes the factory again.
//!
//! # Live reload
//!
//! When built with `reload_on_change`, the provider connects eagerly and
//! subscribes to the keyspace notification channel of its hash key. Each
//! notification triggers a full reload on a background task: on success the
//! [`ReloadStamp`] watch channel is bumped, on failure the previous snapshot
//! stays in place and a warning is logged. Notifications are processed one
//! at a time, in arrival order.
//!
//! ```rust,ignore
//! let source = RedisConfigSource::new(factory, "appsettings", true)?;
//! let provider = source.build().await?;
//! provider.load().await?;
//!
//! let mut reloads = provider.watch_reload();
//! tokio::spawn(async move {
//!     while reloads.changed().await.is_ok() {
//!         println!("configuration reloaded: {:?}", *reloads.borrow());
//!     }
//! });
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{mpsc, watch, OnceCell};
use tokio::task::JoinHandle;

use crate::client::{keyspace_channel, ConnectFn, RemoteConnection, RemoteDatabase, StoreMessage};
use crate::data::ConfigData;
use crate::error::SourceResult;

/// Value carried by the reload watch channel.
///
/// The stamp advances exactly once per completed notification-driven
/// reload. Explicit [`RedisConfigProvider::load`] calls never advance it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReloadStamp {
    /// Number of notification-driven reloads completed so far.
    pub generation: u64,
    /// When the latest reload completed.
    pub at: DateTime<Utc>,
}

impl ReloadStamp {
    fn initial() -> Self {
        Self {
            generation: 0,
            at: Utc::now(),
        }
    }
}

/// Contract between configuration providers and the aggregation layer.
#[async_trait::async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Short name identifying the provider kind.
    fn name(&self) -> &str;

    /// Read the backing store and replace the current snapshot.
    async fn load(&self) -> SourceResult<()>;

    /// Look up a value in the current snapshot, ignoring key casing.
    fn get(&self, key: &str) -> Option<String>;

    /// The current snapshot.
    fn data(&self) -> Arc<ConfigData>;

    /// Subscribe to notification-driven reload completions.
    fn watch_reload(&self) -> watch::Receiver<ReloadStamp>;
}

/// Connection state cached after the first successful factory invocation.
struct Connected {
    connection: Arc<dyn RemoteConnection>,
    database: Arc<dyn RemoteDatabase>,
}

struct ProviderState {
    factory: Arc<ConnectFn>,
    key: String,
    connected: OnceCell<Connected>,
    data: RwLock<Arc<ConfigData>>,
    reload_tx: watch::Sender<ReloadStamp>,
}

impl ProviderState {
    /// Connect through the factory at most once. An `Err` caches nothing,
    /// leaving the cell empty for the next attempt.
    async fn ensure_connected(&self) -> SourceResult<&Connected> {
        self.connected
            .get_or_try_init(|| async {
                let connection = (self.factory)().await?;
                let database = connection.database();
                Ok(Connected {
                    connection,
                    database,
                })
            })
            .await
    }

    async fn load_snapshot(&self) -> SourceResult<()> {
        let connected = self.ensure_connected().await?;
        let fields = connected.database.read_hash(&self.key).await?;
        let snapshot = Arc::new(ConfigData::from_fields(fields));
        *self.data.write() = snapshot;
        Ok(())
    }
}

/// Configuration provider backed by one hash in the remote store.
pub struct RedisConfigProvider {
    state: Arc<ProviderState>,
    _listener: Option<ListenerGuard>,
}

impl RedisConfigProvider {
    pub(crate) async fn new(
        factory: Arc<ConnectFn>,
        key: String,
        reload_on_change: bool,
    ) -> SourceResult<Self> {
        let (reload_tx, _) = watch::channel(ReloadStamp::initial());
        let state = Arc::new(ProviderState {
            factory,
            key,
            connected: OnceCell::new(),
            data: RwLock::new(Arc::new(ConfigData::new())),
            reload_tx,
        });

        let listener = if reload_on_change {
            Some(Self::spawn_listener(&state).await?)
        } else {
            None
        };

        Ok(Self {
            state,
            _listener: listener,
        })
    }

    /// Connect now, subscribe to the key's notification channel, and spawn
    /// the listener task that reloads on every message.
    async fn spawn_listener(state: &Arc<ProviderState>) -> SourceResult<ListenerGuard> {
        let connected = state.ensure_connected().await?;
        let channel = keyspace_channel(connected.database.index(), &state.key);
        let notifications = connected.connection.subscriber().subscribe(&channel).await?;
        tracing::debug!(channel = %channel, "subscribed to keyspace notifications");

        let task = tokio::spawn(reload_loop(Arc::downgrade(state), notifications));
        Ok(ListenerGuard { task })
    }

    /// Read the backing hash and replace the snapshot wholesale.
    ///
    /// Connects first if no connection is cached yet. On error the previous
    /// snapshot is left untouched.
    pub async fn load(&self) -> SourceResult<()> {
        self.state.load_snapshot().await
    }

    /// Look up a value in the current snapshot, ignoring key casing.
    pub fn get(&self, key: &str) -> Option<String> {
        self.state.data.read().get(key).map(str::to_string)
    }

    /// The current snapshot. Cheap to call; clones an [`Arc`].
    pub fn data(&self) -> Arc<ConfigData> {
        Arc::clone(&self.state.data.read())
    }

    /// Subscribe to notification-driven reload completions.
    ///
    /// The receiver starts at the current stamp; `changed()` resolves the
    /// next time a notification-driven reload completes.
    pub fn watch_reload(&self) -> watch::Receiver<ReloadStamp> {
        self.state.reload_tx.subscribe()
    }

    /// The hash key this provider reads.
    pub fn key(&self) -> &str {
        &self.state.key
    }

    /// Whether a connection has been established and cached.
    pub fn is_connected(&self) -> bool {
        self.state.connected.initialized()
    }
}

#[async_trait::async_trait]
impl ConfigProvider for RedisConfigProvider {
    fn name(&self) -> &str {
        "redis"
    }

    async fn load(&self) -> SourceResult<()> {
        RedisConfigProvider::load(self).await
    }

    fn get(&self, key: &str) -> Option<String> {
        RedisConfigProvider::get(self, key)
    }

    fn data(&self) -> Arc<ConfigData> {
        RedisConfigProvider::data(self)
    }

    fn watch_reload(&self) -> watch::Receiver<ReloadStamp> {
        RedisConfigProvider::watch_reload(self)
    }
}

impl fmt::Debug for RedisConfigProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfigProvider")
            .field("key", &self.state.key)
            .field("connected", &self.state.connected.initialized())
            .field("entries", &self.state.data.read().len())
            .field("reload_on_change", &self._listener.is_some())
            .finish()
    }
}

/// Background reload driver.
///
/// Holds only a [`Weak`] reference so the provider can be dropped while the
/// task waits for messages. Messages are handled sequentially; a reload must
/// finish before the next notification is taken off the channel.
async fn reload_loop(provider: Weak<ProviderState>, mut notifications: mpsc::Receiver<StoreMessage>) {
    while let Some(message) = notifications.recv().await {
        let Some(state) = provider.upgrade() else {
            break;
        };
        tracing::debug!(
            channel = %message.channel,
            command = %message.payload,
            "change notification received"
        );
        match state.load_snapshot().await {
            Ok(()) => {
                state.reload_tx.send_modify(|stamp| {
                    stamp.generation += 1;
                    stamp.at = Utc::now();
                });
            }
            Err(error) => {
                tracing::warn!(
                    key = %state.key,
                    error = %error,
                    "reload after change notification failed, keeping previous snapshot"
                );
            }
        }
    }
}

/// Aborts the listener task when the provider is dropped.
#[derive(Debug)]
struct ListenerGuard {
    task: JoinHandle<()>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
