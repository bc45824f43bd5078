//! Redis client adapter for `redis-config-core`.
//!
//! Connects the store-agnostic provider to a real Redis-compatible server
//! through the [`redis`] crate. The usual entry point is [`redis_source`],
//! which mirrors registering the source in application startup code:
//!
//! ```rust,ignore
//! use redis_config_client::redis_source;
//!
//! let source = redis_source("redis://localhost:6379/0", "appsettings", true)?;
//! let provider = source.build().await?;
//! provider.load().await?;
//! ```
//!
//! # Server-side requirement for reload
//!
//! Keyspace notifications are off by default. For reload-on-change to see
//! hash writes and deletions, the server must run with
//! `CONFIG SET notify-keyspace-events Kgh` (or the equivalent in its
//! configuration file). Without it the subscription stays silent and the
//! provider simply keeps its last snapshot.

mod client;

pub use client::{
    connection_factory, redis_source, redis_source_from_options, RedisStoreClient,
};
