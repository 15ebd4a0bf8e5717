//! Business metrics for Conference Central.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `conference_registrations_total{outcome}` - Registration commands by outcome
//! - `conference_conferences_created_total` - Conferences created
//! - `conference_tasks_enqueued_total{outcome}` - Confirmation tasks by enqueue outcome
//! - `conference_commit_conflicts_total` - Optimistic commits that hit a version conflict

use metrics::describe_counter;

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "conference_registrations_total",
        "Registration commands by outcome (registered, unregistered, already_registered, \
         no_seats, not_registered, not_found, unknown)"
    );
    describe_counter!(
        "conference_conferences_created_total",
        "Total number of conferences created"
    );
    describe_counter!(
        "conference_tasks_enqueued_total",
        "Confirmation email tasks by enqueue outcome (queued, failed)"
    );
    describe_counter!(
        "conference_commit_conflicts_total",
        "Optimistic commits rejected because a record changed concurrently"
    );

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record the outcome of a registration command.
///
/// # Arguments
///
/// * `outcome` - Outcome label (e.g., "registered", "no_seats")
pub fn record_registration(outcome: &'static str) {
    metrics::counter!("conference_registrations_total", "outcome" => outcome).increment(1);
    tracing::debug!(outcome, "Recorded registration metric");
}

/// Record a conference created.
pub fn record_conference_created() {
    metrics::counter!("conference_conferences_created_total").increment(1);
    tracing::debug!("Recorded conference_created metric");
}

/// Record the result of enqueueing a confirmation task.
///
/// # Arguments
///
/// * `outcome` - "queued" or "failed"
pub fn record_task_enqueued(outcome: &'static str) {
    metrics::counter!("conference_tasks_enqueued_total", "outcome" => outcome).increment(1);
    tracing::debug!(outcome, "Recorded task_enqueued metric");
}

/// Record a commit that lost an optimistic concurrency race.
pub fn record_commit_conflict() {
    metrics::counter!("conference_commit_conflicts_total").increment(1);
}
