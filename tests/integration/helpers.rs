// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use axum::Extension;
use axum_test::TestServer;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use domainrs::application::use_cases::domain_check_use_case::DomainCheckUseCase;
use domainrs::domain::lookup::dns::{DnsError, DnsFields, DnsLookup};
use domainrs::domain::lookup::whois::{WhoisError, WhoisFields, WhoisLookup};
use domainrs::domain::metrics::provider::{
    MetricProvider, ProviderError, ProviderKind, ProviderReading, RankReading,
};
use domainrs::domain::models::domain::Domain;
use domainrs::domain::repositories::domain_repository::DomainRepository;
use domainrs::domain::services::availability_resolver::{AvailabilityConfig, AvailabilityResolver};
use domainrs::domain::services::liveness_checker::{LivenessChecker, LivenessConfig};
use domainrs::domain::services::merge_policy::MergePolicy;
use domainrs::domain::services::pipeline_orchestrator::{PipelineConfig, PipelineOrchestrator};
use domainrs::engines::traits::{HttpProbe, ProbeError, ProbeRequest, ProbeResponse};
use domainrs::infrastructure::cache::cache_layer::{CacheLayer, CacheTtls};
use domainrs::infrastructure::providers::aggregator::MetricsAggregator;
use domainrs::infrastructure::providers::budget::ProviderBudget;
use domainrs::infrastructure::repositories::check_job_repo_impl::CheckJobRepositoryImpl;
use domainrs::infrastructure::repositories::domain_metric_repo_impl::DomainMetricRepositoryImpl;
use domainrs::infrastructure::repositories::domain_repo_impl::DomainRepositoryImpl;
use domainrs::presentation::routes;
use domainrs::queue::job_queue::DatabaseCheckQueue;
use migration::{Migrator, MigratorTrait};

/// 创建内存数据库并执行全部迁移
///
/// 只保留一个连接，否则每个连接都会看到各自独立的内存库。
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.unwrap();
    Arc::new(db)
}

/// 所有 URL 返回同一个状态码，`None` 表示连接被拒绝
pub struct StaticProbe {
    pub status: Option<u16>,
    pub delay: Duration,
}

#[async_trait]
impl HttpProbe for StaticProbe {
    async fn probe(&self, _request: &ProbeRequest) -> Result<ProbeResponse, ProbeError> {
        tokio::time::sleep(self.delay).await;
        match self.status {
            Some(status) => Ok(ProbeResponse {
                status_code: status,
                content_type: Some("text/html".to_string()),
                body: Some(
                    r#"<html><title>Example Domain</title><meta name="description" content="Illustrative examples"></html>"#
                        .to_string(),
                ),
                response_time_ms: 5,
            }),
            None => Err(ProbeError::Connect("connection refused".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

pub struct StaticDns(pub Result<DnsFields, DnsError>);

#[async_trait]
impl DnsLookup for StaticDns {
    async fn lookup(&self, _domain: &str) -> Result<DnsFields, DnsError> {
        self.0.clone()
    }
}

pub struct StaticWhois {
    pub result: Result<WhoisFields, WhoisError>,
    pub calls: AtomicUsize,
}

impl StaticWhois {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WhoisLookup for StaticWhois {
    async fn lookup(&self, _domain: &str) -> Result<WhoisFields, WhoisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

pub struct StaticProvider(pub Result<ProviderReading, ProviderError>);

#[async_trait]
impl MetricProvider for StaticProvider {
    fn name(&self) -> &'static str {
        "seo_rank"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Credentialed
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch(&self, _domain: &str) -> Result<ProviderReading, ProviderError> {
        self.0.clone()
    }
}

/// 外部调用的固定结果
pub struct Stages {
    pub http_status: Option<u16>,
    pub probe_delay: Duration,
    pub dns: Result<DnsFields, DnsError>,
    pub whois: Result<WhoisFields, WhoisError>,
    pub provider: Result<ProviderReading, ProviderError>,
    /// 替换固定 WHOIS 结果的真实实现
    pub whois_lookup: Option<Arc<dyn WhoisLookup>>,
    pub config: PipelineConfig,
}

impl Default for Stages {
    fn default() -> Self {
        Self {
            http_status: Some(200),
            probe_delay: Duration::ZERO,
            dns: Ok(DnsFields {
                nameservers: vec![
                    "ns1.example.net".to_string(),
                    "ns2.example.net".to_string(),
                ],
                ipv4: vec!["93.184.216.34".to_string()],
                ..DnsFields::default()
            }),
            whois: Ok(WhoisFields {
                registrar: Some("Example Registrar".to_string()),
                ..WhoisFields::default()
            }),
            provider: Ok(ProviderReading::Rank(RankReading {
                domain_authority: Some(37.5),
                backlinks: Some(1200),
                ..RankReading::default()
            })),
            whois_lookup: None,
            config: PipelineConfig::default(),
        }
    }
}

/// 测试应用
///
/// 真实的仓库、队列和路由，外部调用使用固定结果。
#[allow(dead_code)]
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub domains: Arc<DomainRepositoryImpl>,
    pub metrics: Arc<DomainMetricRepositoryImpl>,
    pub jobs: Arc<CheckJobRepositoryImpl>,
    pub queue: Arc<DatabaseCheckQueue<CheckJobRepositoryImpl>>,
    pub orchestrator: Arc<PipelineOrchestrator>,
    pub whois: Arc<StaticWhois>,
    pub server: TestServer,
}

impl TestApp {
    /// 写入一个新发现的域名
    pub async fn seed_domain(&self, name: &str) -> Domain {
        self.domains
            .create(&Domain::new(Uuid::new_v4(), name))
            .await
            .unwrap()
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(Stages::default()).await
}

pub async fn create_test_app_with(stages: Stages) -> TestApp {
    let db = setup_db().await;
    let cache = CacheLayer::in_memory(CacheTtls::default());

    let domains = Arc::new(DomainRepositoryImpl::new(db.clone()));
    let metrics = Arc::new(DomainMetricRepositoryImpl::new(db.clone()));
    let jobs = Arc::new(CheckJobRepositoryImpl::new(db.clone()));
    let queue = Arc::new(DatabaseCheckQueue::new(
        jobs.clone(),
        Duration::from_secs(600),
    ));

    let whois = Arc::new(StaticWhois {
        result: stages.whois,
        calls: AtomicUsize::new(0),
    });
    let liveness = Arc::new(LivenessChecker::new(
        Arc::new(StaticProbe {
            status: stages.http_status,
            delay: stages.probe_delay,
        }),
        cache.clone(),
        LivenessConfig {
            retry_delay: Duration::from_millis(1),
            ..LivenessConfig::default()
        },
    ));
    let whois_lookup = stages
        .whois_lookup
        .unwrap_or_else(|| whois.clone() as Arc<dyn WhoisLookup>);
    let availability = Arc::new(AvailabilityResolver::new(
        Arc::new(StaticDns(stages.dns)),
        whois_lookup,
        cache.clone(),
        AvailabilityConfig::default(),
    ));
    let aggregator = Arc::new(MetricsAggregator::new(
        vec![Arc::new(StaticProvider(stages.provider)) as Arc<dyn MetricProvider>],
        cache.clone(),
        Arc::new(ProviderBudget::unlimited()),
        Duration::from_secs(10),
    ));
    let provider_names = aggregator.provider_names();

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        domains.clone(),
        metrics.clone(),
        queue.clone(),
        liveness,
        availability,
        aggregator,
        MergePolicy::default(),
        stages.config,
    ));

    let use_case = Arc::new(DomainCheckUseCase::new(
        domains.clone(),
        metrics.clone(),
        orchestrator.clone(),
        cache,
        provider_names,
    ));
    let app = routes::routes().layer(Extension(use_case));
    let server = TestServer::new(app).unwrap();

    TestApp {
        db,
        domains,
        metrics,
        jobs,
        queue,
        orchestrator,
        whois,
        server,
    }
}
