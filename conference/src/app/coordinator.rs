//! Application coordinator - wires the configured backends into a service.

use super::services::ConferenceService;
use crate::config::{CacheBackend, Config, StoreBackend};
use conference_core::cache::AnnouncementCache;
use conference_core::record_store::{RecordStore, RecordStoreError};
use conference_core::task_queue::TaskQueue;
use conference_postgres::PostgresRecordStore;
use conference_redis::{RedisAnnouncementCache, RedisTaskQueue};
use conference_runtime::memory::{InMemoryAnnouncementCache, InMemoryRecordStore, InMemoryTaskQueue};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while starting the application
#[derive(Error, Debug)]
pub enum StartupError {
    /// The record store could not be opened or migrated
    #[error("Record store error: {0}")]
    Store(#[from] RecordStoreError),

    /// `Redis` could not be reached
    #[error("Redis error: {0}")]
    Redis(String),

    /// Configuration is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Main Conference Central application.
///
/// Owns the [`ConferenceService`] built over the configured backends:
/// - Records: in memory or `PostgreSQL`
/// - Announcement cache and task queue: in memory or `Redis`
pub struct ConferenceApp {
    service: Arc<ConferenceService>,
}

impl ConferenceApp {
    /// Connect every backend named in `config`.
    ///
    /// The `PostgreSQL` schema is migrated before the service is built.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if a backend cannot be reached.
    pub async fn new(config: &Config) -> Result<Self, StartupError> {
        let records: Arc<dyn RecordStore> = match config.store.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory record store; data is lost on restart");
                Arc::new(InMemoryRecordStore::new())
            }
            StoreBackend::Postgres => {
                let url = config.store.database_url.as_deref().ok_or_else(|| {
                    StartupError::Config("DATABASE_URL is not set".to_string())
                })?;
                let store = PostgresRecordStore::connect(url, config.store.max_connections).await?;
                store.migrate().await?;
                tracing::info!("✓ PostgreSQL record store ready");
                Arc::new(store)
            }
        };

        let (cache, task_queue): (Arc<dyn AnnouncementCache>, Arc<dyn TaskQueue>) =
            match config.cache.backend {
                CacheBackend::Memory => {
                    tracing::warn!("Using in-memory announcement cache and task queue");
                    (
                        Arc::new(InMemoryAnnouncementCache::new()),
                        Arc::new(InMemoryTaskQueue::new()),
                    )
                }
                CacheBackend::Redis => {
                    let conn = conference_redis::connect(&config.cache.redis_url)
                        .await
                        .map_err(|e| StartupError::Redis(e.to_string()))?;
                    tracing::info!(
                        queue = %config.cache.task_queue_name,
                        "✓ Redis cache and task queue ready"
                    );
                    (
                        Arc::new(RedisAnnouncementCache::new(conn.clone())),
                        Arc::new(RedisTaskQueue::new(conn, config.cache.task_queue_name.clone())),
                    )
                }
            };

        let service = ConferenceService::new(records, cache, task_queue)
            .with_retry_policy(config.registration.retry_policy());

        Ok(Self {
            service: Arc::new(service),
        })
    }

    /// Build an application from already constructed collaborators.
    #[must_use]
    pub const fn from_service(service: Arc<ConferenceService>) -> Self {
        Self { service }
    }

    /// The shared service
    #[must_use]
    pub fn service(&self) -> Arc<ConferenceService> {
        Arc::clone(&self.service)
    }
}
