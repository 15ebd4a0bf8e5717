//! `Redis` adapters for Conference Central.
//!
//! - [`RedisAnnouncementCache`]: reads the announcement string written by an
//!   external job
//! - [`RedisTaskQueue`]: pushes tasks as JSON onto a per-queue list that
//!   workers pop from
//!
//! Both share a [`ConnectionManager`](redis::aio::ConnectionManager), which
//! reconnects on failure and is cheap to clone.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod announcement_cache;
mod task_queue;

pub use announcement_cache::RedisAnnouncementCache;
pub use task_queue::{QueuedTask, RedisTaskQueue};

use redis::aio::ConnectionManager;
use redis::Client;

/// Open a managed connection to `redis_url`.
///
/// # Errors
///
/// Returns [`redis::RedisError`] if the URL is invalid or the server cannot
/// be reached.
pub async fn connect(redis_url: &str) -> Result<ConnectionManager, redis::RedisError> {
    let client = Client::open(redis_url)?;
    ConnectionManager::new(client).await
}
