// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Context;
use axum::Extension;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use domainrs::application::use_cases::domain_check_use_case::DomainCheckUseCase;
use domainrs::config::settings::Settings;
use domainrs::domain::services::availability_resolver::{AvailabilityConfig, AvailabilityResolver};
use domainrs::domain::services::liveness_checker::{LivenessChecker, LivenessConfig};
use domainrs::domain::services::merge_policy::MergePolicy;
use domainrs::domain::services::pipeline_orchestrator::{PipelineConfig, PipelineOrchestrator};
use domainrs::engines::reqwest_engine::ReqwestProbe;
use domainrs::infrastructure::cache::cache_layer::{CacheLayer, CacheTtls};
use domainrs::infrastructure::cache::cache_store::{
    CacheBackend, CacheStore, MemoryCacheStore, RedisCacheStore,
};
use domainrs::infrastructure::cache::redis_client::RedisClient;
use domainrs::infrastructure::database::connection;
use domainrs::infrastructure::lookup::dns_resolver::HickoryDnsResolver;
use domainrs::infrastructure::lookup::whois_client::WhoisClient;
use domainrs::infrastructure::providers::budget::{CallCounter, MemoryCallCounter, RedisCallCounter};
use domainrs::infrastructure::providers::factory::ProviderFactory;
use domainrs::infrastructure::repositories::check_job_repo_impl::CheckJobRepositoryImpl;
use domainrs::infrastructure::repositories::domain_metric_repo_impl::DomainMetricRepositoryImpl;
use domainrs::infrastructure::repositories::domain_repo_impl::DomainRepositoryImpl;
use domainrs::presentation::routes;
use domainrs::queue::job_queue::DatabaseCheckQueue;
use domainrs::utils::telemetry;
use domainrs::workers::manager::WorkerManager;
use migration::{Migrator, MigratorTrait};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting domainrs...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    domainrs::infrastructure::metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Cache backend and provider call counter
    let (store, counter): (Arc<dyn CacheStore>, Arc<dyn CallCounter>) = match settings.cache.backend {
        CacheBackend::Redis => {
            let url = settings
                .redis
                .url
                .as_deref()
                .context("cache.backend is redis but redis.url is not set")?;
            let redis_client = RedisClient::new(url)?;
            info!("Redis cache backend initialized");
            (
                Arc::new(RedisCacheStore::new(
                    redis_client.clone(),
                    settings.cache.key_prefix.clone(),
                )) as Arc<dyn CacheStore>,
                Arc::new(RedisCallCounter::new(
                    redis_client,
                    format!("{}:budget", settings.cache.key_prefix),
                )) as Arc<dyn CallCounter>,
            )
        }
        CacheBackend::Memory => {
            info!("In-memory cache backend initialized");
            (
                Arc::new(MemoryCacheStore::new(settings.cache.max_entries)) as Arc<dyn CacheStore>,
                Arc::new(MemoryCallCounter::new()) as Arc<dyn CallCounter>,
            )
        }
    };
    let cache = CacheLayer::new(store, CacheTtls::from(&settings.cache));

    // 5. Pipeline stages
    let probe = Arc::new(ReqwestProbe::new(&settings.liveness.user_agent)?);
    let liveness = Arc::new(LivenessChecker::new(
        probe,
        cache.clone(),
        LivenessConfig::from(&settings.liveness),
    ));

    let availability = Arc::new(AvailabilityResolver::new(
        Arc::new(HickoryDnsResolver::new(Duration::from_secs(
            settings.availability.dns_timeout_secs,
        ))),
        Arc::new(WhoisClient::new(Duration::from_secs(
            settings.availability.whois_timeout_secs,
        ))),
        cache.clone(),
        AvailabilityConfig::from(&settings.availability),
    ));

    let provider_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.providers.timeout_secs))
        .user_agent(settings.liveness.user_agent.clone())
        .build()?;
    let aggregator = Arc::new(ProviderFactory::create_aggregator(
        &provider_client,
        &settings.providers,
        cache.clone(),
        counter,
    ));
    let provider_names = aggregator.provider_names();

    // 6. Repositories, queue and orchestrator
    let domain_repo = Arc::new(DomainRepositoryImpl::new(db.clone()));
    let metric_repo = Arc::new(DomainMetricRepositoryImpl::new(db.clone()));
    let job_repo = Arc::new(CheckJobRepositoryImpl::new(db.clone()));
    let queue = Arc::new(DatabaseCheckQueue::new(
        job_repo.clone(),
        Duration::from_secs(settings.workers.stuck_job_timeout_secs),
    ));

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        domain_repo.clone(),
        metric_repo.clone(),
        queue.clone(),
        liveness,
        availability,
        aggregator,
        MergePolicy::new(settings.pipeline.unresolvable_status),
        PipelineConfig::from(&settings.pipeline),
    ));

    // 7. Start workers
    let mut worker_manager = WorkerManager::new(
        queue,
        job_repo,
        orchestrator.clone(),
        Duration::from_millis(settings.workers.poll_interval_ms),
        Duration::from_secs(settings.workers.maintenance_interval_secs),
    );
    worker_manager.start_workers(settings.workers.count);

    // 8. HTTP server
    let use_case = Arc::new(DomainCheckUseCase::new(
        domain_repo,
        metric_repo,
        orchestrator,
        cache,
        provider_names,
    )
    .with_batch_concurrency(settings.pipeline.batch_concurrency));

    let app = routes::routes()
        .layer(Extension(use_case))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            worker_manager.wait_for_shutdown().await;
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
