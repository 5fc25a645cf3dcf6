// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::helpers::setup_db;
use domainrs::domain::models::check_job::{CheckJob, JobKind, JobStatus};
use domainrs::domain::models::domain::Domain;
use domainrs::domain::repositories::check_job_repository::CheckJobRepository;
use domainrs::domain::repositories::domain_repository::DomainRepository;
use domainrs::infrastructure::repositories::check_job_repo_impl::CheckJobRepositoryImpl;
use domainrs::infrastructure::repositories::domain_repo_impl::DomainRepositoryImpl;
use domainrs::queue::job_queue::{CheckQueue, DatabaseCheckQueue, QueueError};
use domainrs::queue::scheduler::JobScheduler;

async fn setup() -> (Arc<CheckJobRepositoryImpl>, Uuid) {
    let db = setup_db().await;
    let domain = DomainRepositoryImpl::new(db.clone())
        .create(&Domain::new(Uuid::new_v4(), "example.com"))
        .await
        .unwrap();
    (Arc::new(CheckJobRepositoryImpl::new(db)), domain.id)
}

#[tokio::test]
async fn test_acquire_next_locks_and_counts_attempt() {
    let (repo, domain_id) = setup().await;
    let job = repo
        .create(&CheckJob::new(domain_id, JobKind::FullCheck, 3))
        .await
        .unwrap();
    let worker_id = Uuid::new_v4();

    let acquired = repo
        .acquire_next(worker_id, ChronoDuration::minutes(10))
        .await
        .unwrap()
        .expect("queued job should be acquired");

    assert_eq!(acquired.id, job.id);
    assert_eq!(acquired.status, JobStatus::Active);
    assert_eq!(acquired.attempt_count, 1);
    assert_eq!(acquired.lock_token, Some(worker_id));
    assert!(acquired.lock_expires_at.unwrap() > Utc::now());
    assert!(acquired.started_at.is_some());

    // An active job is not handed out twice
    let again = repo
        .acquire_next(Uuid::new_v4(), ChronoDuration::minutes(10))
        .await
        .unwrap();
    assert!(again.is_none());
}

#[tokio::test]
async fn test_acquire_next_skips_future_jobs() {
    let (repo, domain_id) = setup().await;
    repo.create(&CheckJob::new(domain_id, JobKind::MetricsOnly, 3).delayed(ChronoDuration::seconds(300)))
        .await
        .unwrap();

    let acquired = repo
        .acquire_next(Uuid::new_v4(), ChronoDuration::minutes(10))
        .await
        .unwrap();
    assert!(acquired.is_none());

    let due = repo
        .create(&CheckJob::new(domain_id, JobKind::FullCheck, 3))
        .await
        .unwrap();
    let acquired = repo
        .acquire_next(Uuid::new_v4(), ChronoDuration::minutes(10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(acquired.id, due.id);
}

#[tokio::test]
async fn test_find_pending_ignores_finished_jobs() {
    let (repo, domain_id) = setup().await;
    let job = repo
        .create(&CheckJob::new(domain_id, JobKind::FullCheck, 3))
        .await
        .unwrap();

    let pending = repo.find_pending(domain_id, JobKind::FullCheck).await.unwrap();
    assert_eq!(pending.map(|j| j.id), Some(job.id));
    assert!(repo
        .find_pending(domain_id, JobKind::MetricsOnly)
        .await
        .unwrap()
        .is_none());

    repo.mark_completed(job.id).await.unwrap();
    assert!(repo
        .find_pending(domain_id, JobKind::FullCheck)
        .await
        .unwrap()
        .is_none());

    let stored = repo.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn test_queue_requeue_delays_and_releases_lock() {
    let (repo, domain_id) = setup().await;
    let queue = DatabaseCheckQueue::new(repo.clone(), Duration::from_secs(600));

    let job = queue
        .enqueue(CheckJob::new(domain_id, JobKind::FullCheck, 3))
        .await
        .unwrap();
    let taken = queue.dequeue(Uuid::new_v4()).await.unwrap();
    assert_eq!(taken.id, job.id);

    queue
        .requeue(job.id, Duration::from_secs(60), "liveness stage timed out")
        .await
        .unwrap();

    let stored = repo.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Queued);
    assert_eq!(stored.attempt_count, 1);
    assert!(stored.lock_token.is_none());
    assert_eq!(stored.last_error.as_deref(), Some("liveness stage timed out"));
    assert!(stored.scheduled_at.unwrap() > Utc::now() + ChronoDuration::seconds(50));

    // Not due yet
    assert!(matches!(
        queue.dequeue(Uuid::new_v4()).await,
        Err(QueueError::Empty)
    ));
}

#[tokio::test]
async fn test_queue_fail_records_error() {
    let (repo, domain_id) = setup().await;
    let queue = DatabaseCheckQueue::new(repo.clone(), Duration::from_secs(600));

    let job = queue
        .enqueue(CheckJob::new(domain_id, JobKind::MetricsOnly, 3))
        .await
        .unwrap();
    queue.dequeue(Uuid::new_v4()).await.unwrap();
    queue.fail(job.id, "every attempted metric provider failed transiently").await.unwrap();

    let stored = repo.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert!(stored.last_error.unwrap().contains("metric provider"));
}

#[tokio::test]
async fn test_empty_queue_reports_empty() {
    let (repo, _) = setup().await;
    let queue = DatabaseCheckQueue::new(repo, Duration::from_secs(600));

    assert!(matches!(
        queue.dequeue(Uuid::new_v4()).await,
        Err(QueueError::Empty)
    ));
}

/// 锁过期的活动任务由维护任务放回队列
#[tokio::test]
async fn test_scheduler_resets_expired_locks() {
    let (repo, domain_id) = setup().await;
    let job = repo
        .create(&CheckJob::new(domain_id, JobKind::FullCheck, 3))
        .await
        .unwrap();
    let held = repo
        .create(&CheckJob::new(domain_id, JobKind::MetricsOnly, 3))
        .await
        .unwrap();

    // Expired lock
    let stuck = repo
        .acquire_next(Uuid::new_v4(), ChronoDuration::seconds(-1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stuck.id, job.id);
    // Live lock
    let live = repo
        .acquire_next(Uuid::new_v4(), ChronoDuration::minutes(10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(live.id, held.id);

    let scheduler = JobScheduler::new(repo.clone(), Duration::from_secs(60));
    assert_eq!(scheduler.run_maintenance().await, 1);

    let reset = repo.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(reset.status, JobStatus::Queued);
    assert!(reset.lock_token.is_none());
    assert_eq!(reset.attempt_count, 1);

    let untouched = repo.find_by_id(held.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, JobStatus::Active);

    let retaken = repo
        .acquire_next(Uuid::new_v4(), ChronoDuration::minutes(10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(retaken.id, job.id);
    assert_eq!(retaken.attempt_count, 2);
}
