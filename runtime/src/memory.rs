//! In-memory implementations of the collaborator traits.
//!
//! Used by the `memory` backends of the server and throughout the tests.
//! Each type is a cheap handle: clones share the same underlying data.
//!
//! - [`InMemoryRecordStore`]: versioned profiles and conferences behind a
//!   single lock, so a commit is checked and applied atomically
//! - [`InMemoryAnnouncementCache`]: a string map
//! - [`InMemoryTaskQueue`]: records enqueued tasks for inspection

use conference_core::cache::{AnnouncementCache, CacheError};
use conference_core::query::ConferenceQuery;
use conference_core::record_store::{
    RecordStore, RecordStoreError, RecordWrite, StoreFuture, Versioned,
};
use conference_core::task_queue::{Task, TaskQueue, TaskQueueError};
use conference_core::types::{Conference, ConferenceId, ConferenceKey, Profile, UserId, Version};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

// ============================================================================
// Record store
// ============================================================================

#[derive(Debug, Default)]
struct Records {
    profiles: HashMap<UserId, Versioned<Profile>>,
    conferences: HashMap<ConferenceId, Versioned<Conference>>,
}

impl Records {
    fn conference(&self, key: &ConferenceKey) -> Option<&Versioned<Conference>> {
        self.conferences
            .get(&key.id())
            .filter(|stored| stored.record.key == *key)
    }

    fn current_version(&self, write: &RecordWrite) -> Option<Version> {
        match write {
            RecordWrite::Profile { profile, .. } => {
                self.profiles.get(&profile.user_id).map(|p| p.version)
            }
            RecordWrite::Conference { conference, .. } => {
                self.conferences.get(&conference.key.id()).map(|c| c.version)
            }
        }
    }
}

/// In-memory record store.
///
/// # Example
///
/// ```
/// use conference_runtime::memory::InMemoryRecordStore;
/// use conference_core::record_store::{RecordStore, RecordWrite};
/// use conference_core::types::{Identity, Profile};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryRecordStore::new();
/// let profile = Profile::new_default(&Identity::new("u1", "u1@example.com"));
///
/// store.commit(vec![RecordWrite::profile(profile.clone(), None)]).await?;
/// assert!(store.get_profile(&profile.user_id).await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryRecordStore {
    records: Arc<Mutex<Records>>,
}

impl InMemoryRecordStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conferences
    pub async fn conference_count(&self) -> usize {
        self.records.lock().await.conferences.len()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get_profile(&self, user_id: &UserId) -> StoreFuture<'_, Option<Versioned<Profile>>> {
        let user_id = user_id.clone();
        Box::pin(async move { Ok(self.records.lock().await.profiles.get(&user_id).cloned()) })
    }

    fn get_profiles(&self, user_ids: &[UserId]) -> StoreFuture<'_, Vec<Profile>> {
        let user_ids = user_ids.to_vec();
        Box::pin(async move {
            let records = self.records.lock().await;
            Ok(user_ids
                .iter()
                .filter_map(|id| records.profiles.get(id))
                .map(|stored| stored.record.clone())
                .collect())
        })
    }

    fn get_conference(
        &self,
        key: &ConferenceKey,
    ) -> StoreFuture<'_, Option<Versioned<Conference>>> {
        let key = key.clone();
        Box::pin(async move { Ok(self.records.lock().await.conference(&key).cloned()) })
    }

    fn get_conferences(&self, keys: &[ConferenceKey]) -> StoreFuture<'_, Vec<Conference>> {
        let keys = keys.to_vec();
        Box::pin(async move {
            let records = self.records.lock().await;
            Ok(keys
                .iter()
                .filter_map(|key| records.conference(key))
                .map(|stored| stored.record.clone())
                .collect())
        })
    }

    fn query_conferences(&self, query: &ConferenceQuery) -> StoreFuture<'_, Vec<Conference>> {
        let query = query.clone();
        Box::pin(async move {
            let records = self.records.lock().await;
            Ok(query.apply(records.conferences.values().map(|c| c.record.clone())))
        })
    }

    fn conferences_by_organizer(&self, organizer: &UserId) -> StoreFuture<'_, Vec<Conference>> {
        let organizer = organizer.clone();
        Box::pin(async move {
            let records = self.records.lock().await;
            let mut conferences: Vec<Conference> = records
                .conferences
                .values()
                .filter(|c| c.record.organizer_user_id() == &organizer)
                .map(|c| c.record.clone())
                .collect();
            conferences.sort_by(|a, b| {
                a.name.cmp(&b.name).then_with(|| a.key.id().cmp(&b.key.id()))
            });
            Ok(conferences)
        })
    }

    fn commit(&self, writes: Vec<RecordWrite>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut records = self.records.lock().await;

            // Check every write before applying any of them
            for write in &writes {
                let actual = records.current_version(write);
                if actual != write.expected() {
                    return Err(RecordStoreError::ConcurrencyConflict {
                        record: write.record_name(),
                        expected: write.expected(),
                        actual,
                    });
                }
            }

            for write in writes {
                let next = write.expected().map_or_else(Version::initial, |v| v.next());
                match write {
                    RecordWrite::Profile { profile, .. } => {
                        records
                            .profiles
                            .insert(profile.user_id.clone(), Versioned::new(profile, next));
                    }
                    RecordWrite::Conference { conference, .. } => {
                        records
                            .conferences
                            .insert(conference.key.id(), Versioned::new(conference, next));
                    }
                }
            }

            Ok(())
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

// ============================================================================
// Announcement cache
// ============================================================================

/// In-memory string cache
#[derive(Clone, Debug, Default)]
pub struct InMemoryAnnouncementCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryAnnouncementCache {
    /// Create a new empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key` (stands in for the external writer)
    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().await.insert(key.into(), value.into());
    }

    /// Removes `key`
    pub async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }
}

impl AnnouncementCache for InMemoryAnnouncementCache {
    fn get(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, CacheError>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.entries.read().await.get(&key).cloned()) })
    }
}

// ============================================================================
// Task queue
// ============================================================================

#[derive(Debug)]
struct QueueState {
    tasks: Vec<Task>,
    available: bool,
}

/// In-memory task queue that keeps every accepted task
#[derive(Clone, Debug)]
pub struct InMemoryTaskQueue {
    state: Arc<RwLock<QueueState>>,
}

impl Default for InMemoryTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskQueue {
    /// Create a new, available, empty queue
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(QueueState {
                tasks: Vec::new(),
                available: true,
            })),
        }
    }

    /// Tasks accepted so far, in order
    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    /// Toggle availability; an unavailable queue rejects every task
    pub async fn set_available(&self, available: bool) {
        self.state.write().await.available = available;
    }
}

impl TaskQueue for InMemoryTaskQueue {
    fn enqueue(
        &self,
        task: Task,
    ) -> Pin<Box<dyn Future<Output = Result<(), TaskQueueError>> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if !state.available {
                return Err(TaskQueueError::Unavailable(
                    "in-memory queue disabled".to_string(),
                ));
            }
            state.tasks.push(task);
            Ok(())
        })
    }
}
