//! Redis backend over a multiplexed async connection.

use std::time::Duration;

use async_trait::async_trait;
use redis::{Client, aio::MultiplexedConnection};
use tokio::time::timeout;
use tracing::{info, warn};

use super::store::{CacheError, KeyValueCache};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Holds one multiplexed connection; each call works on a cheap clone of it.
pub struct RedisCache {
    connection: MultiplexedConnection,
    prefix: String,
}

impl RedisCache {
    /// Open a connection to `url` and verify the server answers PING.
    pub async fn connect(url: &str, prefix: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)
            .map_err(|err| CacheError::backend(format!("invalid redis url: {err}")))?;
        let mut connection = timeout(CONNECT_TIMEOUT, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| CacheError::backend("timed out acquiring redis connection"))?
            .map_err(|err| CacheError::backend(format!("redis connection failed: {err}")))?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|err| CacheError::backend(format!("redis ping failed: {err}")))?;
        if pong != "PONG" {
            return Err(CacheError::backend("redis ping did not return PONG"));
        }

        info!(target = "plantlog::cache::redis", "Redis cache connected");
        Ok(Self {
            connection,
            prefix: prefix.to_string(),
        })
    }

    fn full_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}", self.prefix, key)
        }
    }

    fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection();
        let full_key = self.full_key(key);

        redis::cmd("GET")
            .arg(&full_key)
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(|err| {
                warn!(key = %full_key, error = %err, "Redis GET failed");
                CacheError::backend(format!("redis get failed: {err}"))
            })
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut conn = self.connection();
        let full_key = self.full_key(key);

        redis::cmd("SET")
            .arg(&full_key)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|err| {
                warn!(key = %full_key, error = %err, "Redis SET failed");
                CacheError::backend(format!("redis set failed: {err}"))
            })
    }
}
