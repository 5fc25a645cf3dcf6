// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::helpers::{create_test_app, create_test_app_with, Stages, TestApp};
use domainrs::domain::lookup::dns::{DnsError, DnsFields};
use domainrs::domain::lookup::whois::WhoisLookup;
use domainrs::domain::metrics::provider::ProviderError;
use domainrs::domain::models::check_job::{JobKind, JobStatus};
use domainrs::domain::models::domain::{DomainStatus, MetricsSource, Protocol};
use domainrs::domain::repositories::check_job_repository::CheckJobRepository;
use domainrs::domain::repositories::domain_metric_repository::DomainMetricRepository;
use domainrs::domain::repositories::domain_repository::DomainRepository;
use domainrs::domain::services::pipeline_orchestrator::PipelineConfig;
use domainrs::infrastructure::lookup::whois_client::WhoisClient;
use domainrs::queue::job_queue::CheckQueue;
use domainrs::utils::retry_policy::RetryPolicy;
use domainrs::workers::check_worker::CheckWorker;

fn worker(app: &TestApp) -> CheckWorker {
    CheckWorker::new(
        app.queue.clone() as Arc<dyn CheckQueue>,
        app.orchestrator.clone(),
        Duration::from_millis(10),
    )
}

/// 存活站点：占用、写入 WHOIS 与指标
#[tokio::test]
async fn test_worker_concludes_live_site() {
    let app = create_test_app().await;
    let domain = app.seed_domain("example.com").await;
    let job = app.orchestrator.enqueue_full_check(domain.id).await.unwrap();

    assert!(worker(&app).process_next().await.unwrap());

    let stored = app.domains.find_by_id(domain.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DomainStatus::Occupied);
    assert!(!stored.available);
    assert_eq!(stored.http_status_code, Some(200));
    assert_eq!(stored.protocol, Protocol::Https);
    assert_eq!(stored.title.as_deref(), Some("Example Domain"));
    assert_eq!(stored.registrar.as_deref(), Some("Example Registrar"));
    assert_eq!(stored.ip_address.as_deref(), Some("93.184.216.34"));
    assert_eq!(stored.domain_authority, Some(37.5));
    assert_eq!(stored.metrics_source, Some(MetricsSource::CredentialedApi));
    assert!(stored.metrics_available);

    let metric = app
        .metrics
        .find_by_domain_id(domain.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(metric.rank_domain_authority, Some(37.5));

    let job = app.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.attempt_count, 1);

    assert!(!worker(&app).process_next().await.unwrap());
}

/// 无响应且 DNS 无记录：按未解析处理，不查询 WHOIS
#[tokio::test]
async fn test_unresolvable_domain_is_dead_without_whois() {
    let app = create_test_app_with(Stages {
        http_status: None,
        dns: Ok(DnsFields::default()),
        ..Stages::default()
    })
    .await;
    let domain = app.seed_domain("nothing-here-12345.com").await;
    app.orchestrator.enqueue_full_check(domain.id).await.unwrap();

    assert!(worker(&app).process_next().await.unwrap());

    let stored = app.domains.find_by_id(domain.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DomainStatus::Dead);
    assert_eq!(stored.http_status_code, Some(0));
    assert!(stored.registrar.is_none());
    assert_eq!(app.whois.calls(), 0);
    // Metrics only run for live sites
    assert!(app
        .metrics
        .find_by_domain_id(domain.id)
        .await
        .unwrap()
        .is_none());
}

/// WHOIS 服务器接受连接后不回复：字段为空，任务照常完成
#[tokio::test]
async fn test_stalled_whois_server_leaves_fields_empty() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let client = WhoisClient::new(Duration::from_millis(200)).with_server("127.0.0.1", port);
    let app = create_test_app_with(Stages {
        whois_lookup: Some(Arc::new(client) as Arc<dyn WhoisLookup>),
        config: PipelineConfig {
            availability_timeout: Duration::from_secs(2),
            ..PipelineConfig::default()
        },
        ..Stages::default()
    })
    .await;
    let domain = app.seed_domain("example.com").await;
    let job = app.orchestrator.enqueue_full_check(domain.id).await.unwrap();

    assert!(worker(&app).process_next().await.unwrap());

    let job = app.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);

    let stored = app.domains.find_by_id(domain.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DomainStatus::Occupied);
    assert!(stored.registrar.is_none());
    assert!(stored.registered_at.is_none());
}

/// DNS 查询本身失败时无法判断，交给人工
#[tokio::test]
async fn test_dns_failure_is_in_work() {
    let app = create_test_app_with(Stages {
        http_status: None,
        dns: Err(DnsError::Timeout),
        ..Stages::default()
    })
    .await;
    let domain = app.seed_domain("flaky-dns.com").await;
    app.orchestrator.enqueue_full_check(domain.id).await.unwrap();

    assert!(worker(&app).process_next().await.unwrap());

    let stored = app.domains.find_by_id(domain.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DomainStatus::InWork);
}

/// 关键阶段超时：任务延迟重试，域名停在 checking
#[tokio::test]
async fn test_stage_timeout_requeues_full_check() {
    let app = create_test_app_with(Stages {
        probe_delay: Duration::from_millis(200),
        config: PipelineConfig {
            liveness_timeout: Duration::from_millis(20),
            ..PipelineConfig::default()
        },
        ..Stages::default()
    })
    .await;
    let domain = app.seed_domain("slow.com").await;
    let job = app.orchestrator.enqueue_full_check(domain.id).await.unwrap();

    assert!(worker(&app).process_next().await.unwrap());

    let job = app.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.attempt_count, 1);
    assert!(job.last_error.unwrap().contains("liveness"));
    assert!(job.scheduled_at.unwrap() > Utc::now());

    let stored = app.domains.find_by_id(domain.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DomainStatus::Checking);

    // Backoff keeps it off the queue for now
    assert!(!worker(&app).process_next().await.unwrap());
}

#[tokio::test]
async fn test_exhausted_full_check_marks_dead() {
    let app = create_test_app_with(Stages {
        probe_delay: Duration::from_millis(200),
        config: PipelineConfig {
            liveness_timeout: Duration::from_millis(20),
            full_check_retry: RetryPolicy {
                max_attempts: 1,
                ..RetryPolicy::full_check()
            },
            ..PipelineConfig::default()
        },
        ..Stages::default()
    })
    .await;
    let domain = app.seed_domain("never-answers.com").await;
    let job = app.orchestrator.enqueue_full_check(domain.id).await.unwrap();

    assert!(worker(&app).process_next().await.unwrap());

    let job = app.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);

    let stored = app.domains.find_by_id(domain.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DomainStatus::Dead);
    assert_eq!(stored.http_status_code, Some(0));
}

/// 指标全部瞬时失败：主状态照常写入，另排一个延迟的指标任务
#[tokio::test]
async fn test_transient_metrics_failure_schedules_metrics_job() {
    let app = create_test_app_with(Stages {
        provider: Err(ProviderError::RateLimited),
        ..Stages::default()
    })
    .await;
    let domain = app.seed_domain("example.org").await;
    app.orchestrator.enqueue_full_check(domain.id).await.unwrap();

    assert!(worker(&app).process_next().await.unwrap());

    let stored = app.domains.find_by_id(domain.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DomainStatus::Occupied);
    assert!(stored.metrics_checked_at.is_none());

    let metrics_job = app
        .jobs
        .find_pending(domain.id, JobKind::MetricsOnly)
        .await
        .unwrap()
        .expect("metrics job should be scheduled");
    assert_eq!(metrics_job.status, JobStatus::Queued);
    assert!(metrics_job.scheduled_at.unwrap() > Utc::now() + chrono::Duration::seconds(250));
}

#[tokio::test]
async fn test_enqueue_full_check_reuses_queued_job() {
    let app = create_test_app().await;
    let domain = app.seed_domain("example.net").await;

    let first = app.orchestrator.enqueue_full_check(domain.id).await.unwrap();
    let second = app.orchestrator.enqueue_full_check(domain.id).await.unwrap();

    assert_eq!(first.id, second.id);
}
