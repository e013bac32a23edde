//! Redis backend.
//!
//! Uses a [`ConnectionManager`], which multiplexes commands over one
//! connection and reconnects transparently after a dropped connection.
//! The manager is cheap to clone; every call works on its own clone.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionInfo, IntoConnectionInfo};
use tracing::{debug, info};

use crate::backend::KeyValue;
use crate::error::{Error, Result};

/// Key/value backend talking to a Redis server.
#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
}

impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend").finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Connect to the Redis server at `url` (e.g. `redis://localhost:6379/0`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unreachable`] if the URL is invalid or no connection
    /// could be established within `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let info = url.into_connection_info().map_err(|e| Error::Unreachable {
            url: redact(url),
            reason: e.to_string(),
        })?;
        Self::connect_with(info, timeout).await
    }

    /// Connect using already split connection parameters.
    ///
    /// Credentials are passed through as they are, so passwords need no
    /// URL escaping.
    pub async fn connect_with(info: ConnectionInfo, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint(&info);
        let client = Client::open(info).map_err(|e| Error::Unreachable {
            url: endpoint.clone(),
            reason: e.to_string(),
        })?;

        let connection = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| Error::Unreachable {
                url: endpoint.clone(),
                reason: format!("timed out after {:?}", timeout),
            })?
            .map_err(|e| Error::Unreachable {
                url: endpoint.clone(),
                reason: e.to_string(),
            })?;

        info!("Connected to Redis at {}", endpoint);
        Ok(Self { connection })
    }
}

#[async_trait]
impl KeyValue for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        // MGET rejects an empty key list
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        debug!("MGET {} keys", keys.len());
        let mut conn = self.connection.clone();
        // `AsyncCommands::mget` sends GET for a single key, whose nil reply
        // decodes as an empty list. An explicit MGET always yields one
        // entry per key.
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await?;
        if values.len() != keys.len() {
            return Err(Error::Backend(redis::RedisError::from((
                redis::ErrorKind::TypeError,
                "MGET reply length does not match key count",
            ))));
        }
        Ok(values)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn add_member(&self, set: &str, member: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.sadd::<_, _, ()>(set, member).await?;
        Ok(())
    }

    async fn members(&self, set: &str) -> Result<Vec<String>> {
        let mut conn = self.connection.clone();
        Ok(conn.smembers::<_, Vec<String>>(set).await?)
    }

    async fn member_count(&self, set: &str) -> Result<usize> {
        let mut conn = self.connection.clone();
        Ok(conn.scard::<_, usize>(set).await?)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Loggable `redis://host:port/db` form of connection parameters, without credentials.
fn endpoint(info: &ConnectionInfo) -> String {
    format!("redis://{}/{}", info.addr, info.redis.db)
}

/// Strip credentials from a connection URL before it is logged.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
