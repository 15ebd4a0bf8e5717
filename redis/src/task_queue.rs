//! `Redis` list-backed task queue.
//!
//! Each queue is the list `conference:tasks:{name}`. Producers `LPUSH` a JSON
//! encoded [`QueuedTask`]; workers `BRPOP` from the other end, so tasks are
//! handled in FIFO order.

use chrono::{DateTime, Utc};
use conference_core::task_queue::{Task, TaskQueue, TaskQueueError};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Wire format of an enqueued task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedTask {
    /// Queue the task was pushed to
    pub queue: String,
    /// The task itself
    pub task: Task,
    /// When the task was enqueued
    pub enqueued_at: DateTime<Utc>,
}

/// Pushes tasks onto a `Redis` list.
#[derive(Clone)]
pub struct RedisTaskQueue {
    conn_manager: ConnectionManager,
    queue_name: String,
}

impl RedisTaskQueue {
    /// Create a queue named `queue_name` over an existing connection
    #[must_use]
    pub fn new(conn_manager: ConnectionManager, queue_name: impl Into<String>) -> Self {
        Self {
            conn_manager,
            queue_name: queue_name.into(),
        }
    }

    /// `Redis` key of the list backing `queue_name`
    #[must_use]
    pub fn list_key(queue_name: &str) -> String {
        format!("conference:tasks:{queue_name}")
    }

    fn encode(&self, task: Task) -> Result<String, TaskQueueError> {
        let queued = QueuedTask {
            queue: self.queue_name.clone(),
            task,
            enqueued_at: Utc::now(),
        };
        serde_json::to_string(&queued).map_err(|e| TaskQueueError::Serialization(e.to_string()))
    }
}

impl TaskQueue for RedisTaskQueue {
    fn enqueue(
        &self,
        task: Task,
    ) -> Pin<Box<dyn Future<Output = Result<(), TaskQueueError>> + Send + '_>> {
        Box::pin(async move {
            let url = task.url().to_string();
            let payload = self.encode(task)?;
            let key = Self::list_key(&self.queue_name);

            let mut conn = self.conn_manager.clone();
            let depth: u64 = conn
                .lpush(&key, payload)
                .await
                .map_err(|e| TaskQueueError::Unavailable(format!("Failed to push to {key}: {e}")))?;

            tracing::debug!(queue = %self.queue_name, task = %url, depth, "Task pushed");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_key_is_namespaced_per_queue() {
        assert_eq!(RedisTaskQueue::list_key("default"), "conference:tasks:default");
    }

    #[test]
    #[allow(clippy::unwrap_used)] // Test code
    fn queued_task_wire_format() {
        let queued = QueuedTask {
            queue: "default".to_string(),
            task: Task::new("/tasks/send_confirmation_email").param("email", "a@example.com"),
            enqueued_at: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
        };

        let json: serde_json::Value = serde_json::to_value(&queued).unwrap();
        assert_eq!(json["queue"], "default");
        assert_eq!(json["task"]["url"], "/tasks/send_confirmation_email");
        assert_eq!(json["task"]["params"]["email"], "a@example.com");
        assert_eq!(json["enqueuedAt"], "1970-01-01T00:00:00Z");
    }
}
