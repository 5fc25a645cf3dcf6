// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use super::helpers::setup_db;
use domainrs::domain::lookup::whois::WhoisFields;
use domainrs::domain::models::domain::{
    AvailabilityUpdate, Domain, DomainStatus, MetricsSource, MetricsSummary, Protocol,
};
use domainrs::domain::models::domain_metric::DomainMetric;
use domainrs::domain::repositories::domain_metric_repository::DomainMetricRepository;
use domainrs::domain::repositories::domain_repository::{
    DomainFilter, DomainPage, DomainRepository, PageRequest, Reachability,
};
use domainrs::domain::repositories::RepositoryError;
use domainrs::infrastructure::repositories::domain_metric_repo_impl::DomainMetricRepositoryImpl;
use domainrs::infrastructure::repositories::domain_repo_impl::DomainRepositoryImpl;

fn now() -> DateTime<FixedOffset> {
    Utc::now().into()
}

fn occupied_update() -> AvailabilityUpdate {
    AvailabilityUpdate {
        status: DomainStatus::Occupied,
        available: false,
        http_status_code: Some(200),
        protocol: Protocol::Https,
        ip_address: Some("93.184.216.34".to_string()),
        title: Some("Example Domain".to_string()),
        whois: WhoisFields {
            registrar: Some("Example Registrar".to_string()),
            ..WhoisFields::default()
        },
        nameservers: vec!["ns1.example.net".to_string(), "ns2.example.net".to_string()],
        checked_at: now(),
    }
}

/// 同一项目内重复创建同名域名返回已有记录
#[tokio::test]
async fn test_create_is_idempotent_per_project() {
    let db = setup_db().await;
    let repo = DomainRepositoryImpl::new(db);
    let project_id = Uuid::new_v4();

    let first = repo
        .create(&Domain::new(project_id, "Example.COM"))
        .await
        .unwrap();
    let second = repo
        .create(&Domain::new(project_id, "example.com"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.name, "example.com");
    assert_eq!(first.status, DomainStatus::New);

    // Other projects may hold the same name
    let other = repo
        .create(&Domain::new(Uuid::new_v4(), "example.com"))
        .await
        .unwrap();
    assert_ne!(other.id, first.id);
}

#[tokio::test]
async fn test_find_by_ids_skips_unknown_ids() {
    let db = setup_db().await;
    let repo = DomainRepositoryImpl::new(db);
    let project_id = Uuid::new_v4();

    let a = repo.create(&Domain::new(project_id, "a.com")).await.unwrap();
    let b = repo.create(&Domain::new(project_id, "b.com")).await.unwrap();

    let found = repo
        .find_by_ids(&[a.id, Uuid::new_v4(), b.id])
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
}

/// 可用性字段组写入后不影响指标字段组
#[tokio::test]
async fn test_apply_update_writes_only_availability_columns() {
    let db = setup_db().await;
    let repo = DomainRepositoryImpl::new(db);
    let domain = repo
        .create(&Domain::new(Uuid::new_v4(), "example.com"))
        .await
        .unwrap();

    repo.apply_metrics(
        domain.id,
        &MetricsSummary {
            backlink_count: Some(500),
            referring_domains: Some(40),
            domain_authority: Some(21.0),
            indexed_pages: None,
            metrics_source: MetricsSource::CredentialedApi,
            metrics_available: true,
            metrics_checked_at: now(),
        },
    )
    .await
    .unwrap();

    repo.mark_checking(domain.id).await.unwrap();
    let checking = repo.find_by_id(domain.id).await.unwrap().unwrap();
    assert_eq!(checking.status, DomainStatus::Checking);

    repo.apply_update(domain.id, &occupied_update()).await.unwrap();

    let stored = repo.find_by_id(domain.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DomainStatus::Occupied);
    assert_eq!(stored.http_status_code, Some(200));
    assert_eq!(stored.protocol, Protocol::Https);
    assert_eq!(stored.title.as_deref(), Some("Example Domain"));
    assert_eq!(stored.registrar.as_deref(), Some("Example Registrar"));
    assert_eq!(stored.nameservers.len(), 2);
    assert!(stored.checked_at.is_some());

    assert_eq!(stored.backlink_count, Some(500));
    assert_eq!(stored.domain_authority, Some(21.0));
    assert_eq!(stored.metrics_source, Some(MetricsSource::CredentialedApi));
    assert!(stored.metrics_available);
}

#[tokio::test]
async fn test_mark_dead_clears_stale_page_fields() {
    let db = setup_db().await;
    let repo = DomainRepositoryImpl::new(db);
    let domain = repo
        .create(&Domain::new(Uuid::new_v4(), "gone.com"))
        .await
        .unwrap();
    repo.mark_checking(domain.id).await.unwrap();
    repo.apply_update(domain.id, &occupied_update()).await.unwrap();

    repo.mark_dead(domain.id, now()).await.unwrap();

    let stored = repo.find_by_id(domain.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DomainStatus::Dead);
    assert_eq!(stored.http_status_code, Some(0));
    assert_eq!(stored.protocol, Protocol::Unknown);
    assert!(stored.title.is_none());
    assert!(!stored.available);
    assert!(stored.checked_at.is_some());
    // WHOIS belongs to the registration, not the last page fetch
    assert_eq!(stored.registrar.as_deref(), Some("Example Registrar"));
}

#[tokio::test]
async fn test_updates_on_missing_domain_are_not_found() {
    let db = setup_db().await;
    let repo = DomainRepositoryImpl::new(db);

    let result = repo.mark_checking(Uuid::new_v4()).await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));

    let result = repo.apply_update(Uuid::new_v4(), &occupied_update()).await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

/// 每个域名只有一条指标记录，后写覆盖先写
#[tokio::test]
async fn test_metric_upsert_overwrites_per_domain() {
    let db = setup_db().await;
    let domains = DomainRepositoryImpl::new(db.clone());
    let metrics = DomainMetricRepositoryImpl::new(db);
    let domain = domains
        .create(&Domain::new(Uuid::new_v4(), "example.com"))
        .await
        .unwrap();

    let mut first = DomainMetric::empty(domain.id, now());
    first.authority_backlinks = Some(100);
    first.source = MetricsSource::CredentialedApi;
    metrics.upsert(&first).await.unwrap();

    let mut second = DomainMetric::empty(domain.id, now());
    second.authority_backlinks = Some(250);
    second.archive_age_days = Some(3650);
    second.source = MetricsSource::Mixed;
    let stored = metrics.upsert(&second).await.unwrap();

    assert_eq!(stored.domain_id, domain.id);
    assert_eq!(stored.authority_backlinks, Some(250));
    assert_eq!(stored.archive_age_days, Some(3650));
    assert_eq!(stored.source, MetricsSource::Mixed);

    let found = metrics.find_by_domain_id(domain.id).await.unwrap().unwrap();
    assert_eq!(found.id, stored.id);
    assert!(metrics
        .find_by_domain_id(Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
}

/// 一个项目下三个域名：存活且指标好、存活但指标弱、从未检查
async fn seed_listing(
    domains: &DomainRepositoryImpl,
    metrics: &DomainMetricRepositoryImpl,
) -> Uuid {
    let project_id = Uuid::new_v4();

    let strong = domains
        .create(&Domain::new(project_id, "strong.com"))
        .await
        .unwrap();
    domains.mark_checking(strong.id).await.unwrap();
    domains.apply_update(strong.id, &occupied_update()).await.unwrap();
    domains
        .apply_metrics(strong.id, &summary(Some(500), Some(30.0)))
        .await
        .unwrap();
    let mut metric = DomainMetric::empty(strong.id, now());
    metric.rank_page_authority = Some(40.0);
    metrics.upsert(&metric).await.unwrap();

    let weak = domains
        .create(&Domain::new(project_id, "weak.com"))
        .await
        .unwrap();
    domains.mark_checking(weak.id).await.unwrap();
    domains
        .apply_update(
            weak.id,
            &AvailabilityUpdate {
                http_status_code: Some(404),
                title: None,
                ..occupied_update()
            },
        )
        .await
        .unwrap();
    domains
        .apply_metrics(weak.id, &summary(Some(10), Some(5.0)))
        .await
        .unwrap();
    let mut metric = DomainMetric::empty(weak.id, now());
    metric.rank_page_authority = Some(10.0);
    metrics.upsert(&metric).await.unwrap();

    domains
        .create(&Domain::new(project_id, "fresh.com"))
        .await
        .unwrap();

    // Same names in another project never show up under the filter
    domains
        .create(&Domain::new(Uuid::new_v4(), "strong.com"))
        .await
        .unwrap();

    project_id
}

fn summary(backlinks: Option<i64>, authority: Option<f64>) -> MetricsSummary {
    MetricsSummary {
        backlink_count: backlinks,
        referring_domains: None,
        domain_authority: authority,
        indexed_pages: None,
        metrics_source: MetricsSource::CredentialedApi,
        metrics_available: true,
        metrics_checked_at: now(),
    }
}

fn names(page: &DomainPage) -> Vec<String> {
    let mut names: Vec<String> = page.items.iter().map(|d| d.name.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_list_filters() {
    let db = setup_db().await;
    let domains = DomainRepositoryImpl::new(db.clone());
    let metrics = DomainMetricRepositoryImpl::new(db);
    let project_id = seed_listing(&domains, &metrics).await;

    let list = |filter: DomainFilter| {
        let domains = domains.clone();
        async move {
            domains
                .list(
                    &DomainFilter {
                        project_id: Some(project_id),
                        ..filter
                    },
                    PageRequest::default(),
                )
                .await
                .unwrap()
        }
    };

    let all = list(DomainFilter::default()).await;
    assert_eq!(all.total, 3);
    assert_eq!(names(&all), vec!["fresh.com", "strong.com", "weak.com"]);

    let live = list(DomainFilter {
        reachability: Some(Reachability::Live),
        ..DomainFilter::default()
    })
    .await;
    assert_eq!(names(&live), vec!["strong.com"]);

    // Never fetched counts as dead
    let dead = list(DomainFilter {
        reachability: Some(Reachability::Dead),
        ..DomainFilter::default()
    })
    .await;
    assert_eq!(names(&dead), vec!["fresh.com", "weak.com"]);

    let occupied = list(DomainFilter {
        status: Some(DomainStatus::Occupied),
        ..DomainFilter::default()
    })
    .await;
    assert_eq!(names(&occupied), vec!["strong.com", "weak.com"]);

    let with_metrics = list(DomainFilter {
        has_metrics: Some(true),
        ..DomainFilter::default()
    })
    .await;
    assert_eq!(names(&with_metrics), vec!["strong.com", "weak.com"]);

    let without_metrics = list(DomainFilter {
        has_metrics: Some(false),
        ..DomainFilter::default()
    })
    .await;
    assert_eq!(names(&without_metrics), vec!["fresh.com"]);

    let backlinks = list(DomainFilter {
        min_backlinks: Some(100),
        ..DomainFilter::default()
    })
    .await;
    assert_eq!(names(&backlinks), vec!["strong.com"]);

    let authority = list(DomainFilter {
        min_domain_authority: Some(20.0),
        ..DomainFilter::default()
    })
    .await;
    assert_eq!(names(&authority), vec!["strong.com"]);

    let page_authority = list(DomainFilter {
        min_page_authority: Some(20.0),
        ..DomainFilter::default()
    })
    .await;
    assert_eq!(names(&page_authority), vec!["strong.com"]);

    let nothing = list(DomainFilter {
        min_backlinks: Some(100),
        reachability: Some(Reachability::Dead),
        ..DomainFilter::default()
    })
    .await;
    assert_eq!(nothing.total, 0);
    assert!(nothing.items.is_empty());
}

#[tokio::test]
async fn test_list_pagination() {
    let db = setup_db().await;
    let domains = DomainRepositoryImpl::new(db.clone());
    let metrics = DomainMetricRepositoryImpl::new(db);
    let project_id = seed_listing(&domains, &metrics).await;
    let filter = DomainFilter {
        project_id: Some(project_id),
        ..DomainFilter::default()
    };

    let first = domains.list(&filter, PageRequest::new(1, 2)).await.unwrap();
    let second = domains.list(&filter, PageRequest::new(2, 2)).await.unwrap();
    let beyond = domains.list(&filter, PageRequest::new(5, 2)).await.unwrap();

    assert_eq!(first.items.len(), 2);
    assert_eq!(first.total, 3);
    assert_eq!(first.total_pages, 2);
    assert_eq!(second.items.len(), 1);
    assert!(first.items.iter().all(|d| d.id != second.items[0].id));
    assert!(beyond.items.is_empty());

    // Zero page and oversized pages are clamped
    assert_eq!(PageRequest::new(0, 10_000), PageRequest::new(1, 200));
}
