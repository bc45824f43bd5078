//! Adapter implementing the core capability ports over the `redis` crate.
//!
//! [`RedisStoreClient`] parses a connection string eagerly and connects
//! lazily. Commands run on a multiplexed connection; the change
//! subscription opens a dedicated pub/sub connection, since a connection
//! in subscribe mode cannot serve commands.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{FutureExt, StreamExt};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::mpsc;

use redis_config_core::{
    ConnectFuture, RedisConfigSource, RedisSourceOptions, RemoteConnection, RemoteDatabase,
    RemoteSubscriber, SourceError, SourceResult, StoreMessage,
};

const MESSAGE_BUFFER: usize = 16;

/// Client for a Redis-compatible store.
///
/// Constructing one validates the connection string without performing any
/// I/O. [`RedisStoreClient::connect`] opens the command connection.
#[derive(Debug, Clone)]
pub struct RedisStoreClient {
    client: redis::Client,
}

impl RedisStoreClient {
    /// Parse a connection string such as `redis://localhost:6379/0`.
    pub fn open(connection_string: &str) -> SourceResult<Self> {
        if connection_string.is_empty() {
            return Err(SourceError::invalid_source(
                "connection string must not be empty",
            ));
        }
        let client = redis::Client::open(connection_string)
            .map_err(|error| SourceError::connection(error.to_string()))?;
        Ok(Self { client })
    }

    /// Logical database index selected by the connection string.
    pub fn database_index(&self) -> i64 {
        self.client.get_connection_info().redis.db
    }

    /// Open the command connection.
    pub async fn connect(&self) -> SourceResult<Arc<dyn RemoteConnection>> {
        let connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| SourceError::connection(error.to_string()))?;
        Ok(Arc::new(RedisConnection {
            client: self.client.clone(),
            connection,
            index: self.database_index(),
        }))
    }
}

struct RedisConnection {
    client: redis::Client,
    connection: MultiplexedConnection,
    index: i64,
}

impl RemoteConnection for RedisConnection {
    fn database(&self) -> Arc<dyn RemoteDatabase> {
        Arc::new(RedisDatabase {
            connection: self.connection.clone(),
            index: self.index,
        })
    }

    fn subscriber(&self) -> Arc<dyn RemoteSubscriber> {
        Arc::new(RedisSubscriber {
            client: self.client.clone(),
        })
    }
}

struct RedisDatabase {
    connection: MultiplexedConnection,
    index: i64,
}

#[async_trait]
impl RemoteDatabase for RedisDatabase {
    fn index(&self) -> i64 {
        self.index
    }

    async fn read_hash(&self, key: &str) -> SourceResult<Vec<(String, String)>> {
        let mut connection = self.connection.clone();
        // Decode as ordered pairs: case-colliding fields resolve by reply
        // position, so the reply's field order has to survive the decode.
        let fields: Vec<(String, String)> = connection
            .hgetall(key)
            .await
            .map_err(|error| SourceError::read(error.to_string()))?;
        Ok(fields)
    }
}

struct RedisSubscriber {
    client: redis::Client,
}

#[async_trait]
impl RemoteSubscriber for RedisSubscriber {
    async fn subscribe(&self, channel: &str) -> SourceResult<mpsc::Receiver<StoreMessage>> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|error| SourceError::subscription(error.to_string()))?;
        pubsub
            .subscribe(channel)
            .await
            .map_err(|error| SourceError::subscription(error.to_string()))?;

        let (tx, rx) = mpsc::channel(MESSAGE_BUFFER);
        let subscribed = channel.to_string();
        tokio::spawn(async move {
            let mut messages = pubsub.into_on_message();
            while let Some(message) = messages.next().await {
                let message = StoreMessage {
                    channel: message.get_channel_name().to_string(),
                    payload: message.get_payload::<String>().unwrap_or_default(),
                };
                if tx.send(message).await.is_err() {
                    break;
                }
            }
            tracing::debug!(channel = %subscribed, "pub/sub message stream ended");
        });

        Ok(rx)
    }
}

/// Deferred factory connecting through [`RedisStoreClient`].
///
/// Nothing is parsed or connected until the factory is invoked.
pub fn connection_factory(
    connection_string: impl Into<String>,
) -> impl Fn() -> ConnectFuture + Send + Sync + 'static {
    let connection_string = connection_string.into();
    move || {
        let connection_string = connection_string.clone();
        async move {
            let client = RedisStoreClient::open(&connection_string)?;
            client.connect().await
        }
        .boxed()
    }
}

/// Describe a Redis configuration source from a connection string.
///
/// Validates both strings up front; the connection itself stays deferred.
pub fn redis_source(
    connection_string: impl Into<String>,
    key: impl Into<String>,
    reload_on_change: bool,
) -> SourceResult<RedisConfigSource> {
    let connection_string = connection_string.into();
    if connection_string.is_empty() {
        return Err(SourceError::invalid_source(
            "connection string must not be empty",
        ));
    }
    RedisConfigSource::new(connection_factory(connection_string), key, reload_on_change)
}

/// Describe a source from deserialized [`RedisSourceOptions`].
pub fn redis_source_from_options(options: RedisSourceOptions) -> SourceResult<RedisConfigSource> {
    redis_source(options.connection_string, options.key, options.reload_on_change)
}
