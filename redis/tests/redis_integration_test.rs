//! Integration tests for the `Redis` adapters using testcontainers.
//!
//! Marked `#[ignore]` because they need a running Docker daemon:
//!
//! ```bash
//! cargo test -p conference-redis -- --ignored
//! ```

#![allow(clippy::expect_used)] // Test code uses expect for clear failure messages

use conference_core::cache::{AnnouncementCache, ANNOUNCEMENTS_KEY};
use conference_core::task_queue::{Task, TaskQueue, CONFIRMATION_EMAIL_PATH};
use conference_redis::{QueuedTask, RedisAnnouncementCache, RedisTaskQueue};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::redis::Redis;

async fn setup_redis() -> (ContainerAsync<Redis>, ConnectionManager) {
    let container = Redis::default()
        .start()
        .await
        .expect("Failed to start redis container");

    let port = container
        .get_host_port_ipv4(6379)
        .await
        .expect("Failed to get redis port");

    let conn = conference_redis::connect(&format!("redis://127.0.0.1:{port}"))
        .await
        .expect("Failed to connect to redis");

    (container, conn)
}

#[tokio::test]
#[ignore]
async fn test_announcement_absent_then_present() {
    let (_container, mut conn) = setup_redis().await;
    let cache = RedisAnnouncementCache::new(conn.clone());

    let missing = cache.get(ANNOUNCEMENTS_KEY).await.expect("Cache read failed");
    assert_eq!(missing, None);

    let _: () = conn
        .set(ANNOUNCEMENTS_KEY, "Last chance to attend! RustConf")
        .await
        .expect("Failed to seed announcement");

    let present = cache.get(ANNOUNCEMENTS_KEY).await.expect("Cache read failed");
    assert_eq!(present.as_deref(), Some("Last chance to attend! RustConf"));
}

#[tokio::test]
#[ignore]
async fn test_enqueued_tasks_are_popped_in_order() {
    let (_container, mut conn) = setup_redis().await;
    let queue = RedisTaskQueue::new(conn.clone(), "default");

    for email in ["first@example.com", "second@example.com"] {
        queue
            .enqueue(Task::new(CONFIRMATION_EMAIL_PATH).param("email", email))
            .await
            .expect("Failed to enqueue task");
    }

    let key = RedisTaskQueue::list_key("default");
    let mut popped = Vec::new();
    for _ in 0..2 {
        let raw: Option<String> = conn.rpop(&key, None).await.expect("Failed to pop task");
        let queued: QueuedTask =
            serde_json::from_str(&raw.expect("Task should be queued")).expect("Invalid task JSON");
        assert_eq!(queued.queue, "default");
        popped.push(queued.task.get_param("email").map(ToString::to_string));
    }

    assert_eq!(
        popped,
        vec![
            Some("first@example.com".to_string()),
            Some("second@example.com".to_string())
        ]
    );
}
