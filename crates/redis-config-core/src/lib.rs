//! Redis-backed configuration source.
//!
//! This crate loads application configuration from a single hash in a
//! Redis-compatible store and serves it as a flat, case-insensitive
//! key-value snapshot. It is the store-agnostic core: all I/O goes through
//! small capability traits, with the production adapter living in
//! `redis-config-client` and an in-process store in [`memory`] for tests.
//!
//! # Features
//!
//! - **Lazy connections**: a source captures a connection factory without
//!   invoking it; the provider connects on first use and caches the result
//!   for its lifetime, retrying only while no connect has succeeded.
//! - **Snapshot loading**: every load reads the whole hash and replaces the
//!   previous snapshot atomically. Lookups ignore key casing.
//! - **Live reload**: a provider built with reload-on-change subscribes to
//!   the hash key's keyspace notification channel and reloads on every
//!   message, surfacing completions through a watch channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use redis_config_core::{ConfigProvider, RedisConfigSource};
//!
//! let source = RedisConfigSource::new(factory, "appsettings", true)?;
//! let provider = source.build().await?;
//! provider.load().await?;
//!
//! if let Some(level) = provider.get("Logging:Level") {
//!     println!("log level: {level}");
//! }
//! ```

pub mod client;
pub mod data;
pub mod error;
pub mod memory;
pub mod provider;
pub mod source;

pub use client::{
    keyspace_channel, ConnectFn, ConnectFuture, RemoteConnection, RemoteDatabase,
    RemoteSubscriber, StoreMessage, KEYSPACE_PREFIX,
};
pub use data::ConfigData;
pub use error::{SourceError, SourceResult};
pub use provider::{ConfigProvider, RedisConfigProvider, ReloadStamp};
pub use source::{RedisConfigSource, RedisSourceOptions};
