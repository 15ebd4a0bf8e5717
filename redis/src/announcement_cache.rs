//! `Redis`-backed announcement cache.

use conference_core::cache::{AnnouncementCache, CacheError};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::future::Future;
use std::pin::Pin;

/// Reads cached strings with `GET`.
///
/// # Example
///
/// ```no_run
/// use conference_core::cache::{AnnouncementCache, ANNOUNCEMENTS_KEY};
/// use conference_redis::RedisAnnouncementCache;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let conn = conference_redis::connect("redis://127.0.0.1:6379").await?;
/// let cache = RedisAnnouncementCache::new(conn);
/// let announcement = cache.get(ANNOUNCEMENTS_KEY).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisAnnouncementCache {
    conn_manager: ConnectionManager,
}

impl RedisAnnouncementCache {
    /// Create a cache over an existing connection
    #[must_use]
    pub const fn new(conn_manager: ConnectionManager) -> Self {
        Self { conn_manager }
    }
}

impl AnnouncementCache for RedisAnnouncementCache {
    fn get(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, CacheError>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut conn = self.conn_manager.clone();
            let value: Option<String> = conn.get(&key).await.map_err(|e| {
                tracing::warn!(key = %key, error = %e, "Cache read failed");
                CacheError::Unavailable(format!("Failed to read {key}: {e}"))
            })?;

            tracing::debug!(key = %key, hit = value.is_some(), "Cache read");
            Ok(value)
        })
    }
}
