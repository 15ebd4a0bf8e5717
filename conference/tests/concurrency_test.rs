//! Concurrent registrations against the in-memory record store.
//!
//! Every task runs the full read-modify-write cycle; optimistic commits plus
//! retry must hand out each seat exactly once.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use conference_central::ConferenceService;
use conference_core::error::ConferenceError;
use conference_runtime::memory::{InMemoryAnnouncementCache, InMemoryRecordStore, InMemoryTaskQueue};
use conference_runtime::RetryPolicy;
use conference_testing::fixtures::{attendee, conference_form, organizer};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

fn contended_service() -> Arc<ConferenceService> {
    let policy = RetryPolicy::builder()
        .max_retries(100)
        .initial_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(20))
        .build();

    Arc::new(
        ConferenceService::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryAnnouncementCache::new()),
            Arc::new(InMemoryTaskQueue::new()),
        )
        .with_retry_policy(policy),
    )
}

async fn register_all(
    service: &Arc<ConferenceService>,
    key: &str,
    users: usize,
) -> Vec<Result<(), ConferenceError>> {
    let tasks = (0..users).map(|n| {
        let service = Arc::clone(service);
        let key = key.to_string();
        tokio::spawn(async move {
            service
                .register_for_conference(Some(&attendee(n)), &key)
                .await
                .map(|_| ())
        })
    });

    join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("registration task panicked"))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_users_race_for_the_last_seat() {
    let service = contended_service();
    let key = service
        .create_conference(Some(&organizer()), conference_form("Last Seat Conf", 1))
        .await
        .unwrap()
        .key
        .to_websafe();

    let results = register_all(&service, &key, 2).await;

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(ConferenceError::Conflict(message)) if message == "There are no seats available"
    )));
    assert_eq!(service.get_conference(&key).await.unwrap().seats_available, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_users_never_overbook() {
    const SEATS: u32 = 5;
    const USERS: usize = 20;

    let service = contended_service();
    let key = service
        .create_conference(Some(&organizer()), conference_form("Popular Conf", SEATS))
        .await
        .unwrap()
        .key
        .to_websafe();

    let results = register_all(&service, &key, USERS).await;

    let winners: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_ok())
        .map(|(n, _)| n)
        .collect();
    assert_eq!(winners.len(), SEATS as usize);
    assert!(results
        .iter()
        .all(|r| r.is_ok() || matches!(r, Err(ConferenceError::Conflict(_)))));

    let conference = service.get_conference(&key).await.unwrap();
    assert_eq!(conference.seats_available, 0);

    // Exactly the winners list the conference on their profile
    for n in 0..USERS {
        let attending = service
            .get_conferences_to_attend(Some(&attendee(n)))
            .await
            .unwrap();
        assert_eq!(attending.len(), usize::from(winners.contains(&n)));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_register_and_unregister_keep_counts_consistent() {
    const SEATS: u32 = 3;

    let service = contended_service();
    let key = service
        .create_conference(Some(&organizer()), conference_form("Churn Conf", SEATS))
        .await
        .unwrap()
        .key
        .to_websafe();

    // Users 0..3 hold seats, then give them back while users 3..6 register
    for n in 0..3 {
        service
            .register_for_conference(Some(&attendee(n)), &key)
            .await
            .unwrap();
    }

    let leaving = (0..3).map(|n| {
        let service = Arc::clone(&service);
        let key = key.clone();
        tokio::spawn(async move {
            service
                .unregister_from_conference(Some(&attendee(n)), &key)
                .await
                .map(|_| ())
        })
    });
    let joining = (3..6).map(|n| {
        let service = Arc::clone(&service);
        let key = key.clone();
        tokio::spawn(async move {
            service
                .register_for_conference(Some(&attendee(n)), &key)
                .await
                .map(|_| ())
        })
    });
    let all: Vec<_> = leaving.chain(joining).collect();
    let results: Vec<Result<(), ConferenceError>> = join_all(all)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    // Every unregistration succeeds; joiners succeed unless they hit a full house
    assert!(results[..3].iter().all(Result::is_ok));
    let joined = results[3..].iter().filter(|r| r.is_ok()).count();

    let conference = service.get_conference(&key).await.unwrap();
    assert_eq!(conference.seats_available, SEATS - u32::try_from(joined).unwrap());
    assert!(conference.seats_available <= conference.max_attendees);
}
