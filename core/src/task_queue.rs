//! Deferred task queue abstraction.
//!
//! Work that must not block a request (sending the organizer a confirmation
//! email after a conference is created) is pushed onto a queue as a [`Task`]
//! and handled by an external worker. Delivery guarantees belong to the
//! queue implementation.

use crate::types::Conference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Worker path that sends the conference confirmation email
pub const CONFIRMATION_EMAIL_PATH: &str = "/tasks/send_confirmation_email";

/// A unit of deferred work: a worker path plus a small string payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    url: String,
    params: BTreeMap<String, String>,
}

impl Task {
    /// Creates a task targeting `url` with an empty payload
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: BTreeMap::new(),
        }
    }

    /// Adds a payload parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Builds the confirmation email task sent after a conference is created
    #[must_use]
    pub fn confirmation_email(email: &str, conference: &Conference) -> Self {
        Self::new(CONFIRMATION_EMAIL_PATH)
            .param("email", email)
            .param("conferenceInfo", conference.to_string())
    }

    /// Worker path
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Payload parameters
    #[must_use]
    pub const fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Looks up a single payload parameter
    #[must_use]
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Errors raised while enqueueing a task
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskQueueError {
    /// The queue backend could not be reached
    #[error("task queue unavailable: {0}")]
    Unavailable(String),

    /// The task could not be encoded for the backend
    #[error("task serialization failed: {0}")]
    Serialization(String),
}

/// Fire-and-forget task queue.
///
/// Returns a boxed future so the trait stays dyn-compatible and can be held
/// as `Arc<dyn TaskQueue>` by environments.
pub trait TaskQueue: Send + Sync {
    /// Pushes `task` onto the queue.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError`] when the backend rejects or cannot receive
    /// the task.
    fn enqueue(
        &self,
        task: Task,
    ) -> Pin<Box<dyn Future<Output = Result<(), TaskQueueError>> + Send + '_>>;
}
