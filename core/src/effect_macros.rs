//! Shorthand for building effects inside reducers.

/// Builds an `Effect::EnqueueTask`, cloning the queue handle.
///
/// ```rust,ignore
/// use conference_core::enqueue_task;
///
/// enqueue_task! {
///     queue: env.task_queue,
///     task: Task::confirmation_email(&organizer.main_email, &conference),
///     on_success: || Some(CreationAction::ConfirmationQueued),
///     on_error: |error| Some(CreationAction::ConfirmationFailed { error: error.to_string() })
/// }
/// ```
#[macro_export]
macro_rules! enqueue_task {
    (
        queue: $queue:expr,
        task: $task:expr,
        on_success: || $success_body:expr,
        on_error: |$error_param:ident| $error_body:expr
    ) => {
        $crate::effect::Effect::EnqueueTask($crate::effect::TaskQueueOperation {
            task_queue: ::std::sync::Arc::clone(&$queue),
            task: $task,
            on_success: ::std::boxed::Box::new(move |()| $success_body),
            on_error: ::std::boxed::Box::new(move |$error_param| $error_body),
        })
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;
    use crate::task_queue::{Task, TaskQueue, TaskQueueError};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq)]
    enum Feedback {
        Queued,
        QueueFailed { error: String },
    }

    struct NullQueue;

    impl TaskQueue for NullQueue {
        fn enqueue(
            &self,
            _task: Task,
        ) -> Pin<Box<dyn Future<Output = Result<(), TaskQueueError>> + Send + '_>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[test]
    fn enqueue_task_wires_both_callbacks() {
        let queue: Arc<dyn TaskQueue> = Arc::new(NullQueue);
        let effect = enqueue_task! {
            queue: queue,
            task: Task::new("/tasks/ping"),
            on_success: || Some(Feedback::Queued),
            on_error: |error| Some(Feedback::QueueFailed { error: error.to_string() })
        };

        assert_eq!(effect.enqueued_task().map(Task::url), Some("/tasks/ping"));

        let Effect::EnqueueTask(operation) = effect;
        assert_eq!((operation.on_success)(()), Some(Feedback::Queued));
        assert_eq!(
            (operation.on_error)(TaskQueueError::Unavailable("down".to_string())),
            Some(Feedback::QueueFailed {
                error: "task queue unavailable: down".to_string()
            })
        );
    }
}
