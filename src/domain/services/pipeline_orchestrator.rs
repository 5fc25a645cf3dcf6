// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use metrics::counter;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::settings::PipelineSettings;
use crate::domain::metrics::provider::MetricsReport;
use crate::domain::models::check_job::{CheckJob, JobKind, JobStatus};
use crate::domain::models::domain::{Domain, DomainError, DomainStatus, MetricsSummary};
use crate::domain::repositories::domain_metric_repository::DomainMetricRepository;
use crate::domain::repositories::domain_repository::DomainRepository;
use crate::domain::repositories::RepositoryError;
use crate::domain::services::availability_resolver::{AvailabilityResolver, AvailabilityResult};
use crate::domain::services::liveness_checker::{LivenessChecker, LivenessResult};
use crate::domain::services::merge_policy::{MergePolicy, UpdateRecord};
use crate::infrastructure::providers::aggregator::MetricsAggregator;
use crate::queue::job_queue::{CheckQueue, QueueError};
use crate::utils::retry_policy::RetryPolicy;

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Liveness,
    Availability,
    Metrics,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineStage::Liveness => write!(f, "liveness"),
            PipelineStage::Availability => write!(f, "availability"),
            PipelineStage::Metrics => write!(f, "metrics"),
        }
    }
}

/// 流水线错误类型
#[derive(Error, Debug)]
pub enum PipelineError {
    /// 阶段结果违反实体规则
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: PipelineStage,
        source: DomainError,
    },

    /// 阶段超时
    #[error("{0} stage timed out")]
    StageTimeout(PipelineStage),

    /// 所有尝试过的提供方都瞬时失败
    #[error("every attempted metric provider failed transiently")]
    MetricsIncomplete,

    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// 队列错误
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

/// 流水线配置
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub liveness_timeout: Duration,
    pub availability_timeout: Duration,
    pub metrics_timeout: Duration,
    /// 完整检查失败后的重试策略
    pub full_check_retry: RetryPolicy,
    /// 指标任务失败后的重试策略
    pub metrics_retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            liveness_timeout: Duration::from_secs(30),
            availability_timeout: Duration::from_secs(30),
            metrics_timeout: Duration::from_secs(60),
            full_check_retry: RetryPolicy::full_check(),
            metrics_retry: RetryPolicy::metrics(),
        }
    }
}

impl From<&PipelineSettings> for PipelineConfig {
    fn from(settings: &PipelineSettings) -> Self {
        Self {
            liveness_timeout: Duration::from_secs(settings.liveness_timeout_secs),
            availability_timeout: Duration::from_secs(settings.availability_timeout_secs),
            metrics_timeout: Duration::from_secs(settings.metrics_timeout_secs),
            full_check_retry: RetryPolicy::from_settings(&settings.full_check_retry),
            metrics_retry: RetryPolicy::from_settings(&settings.metrics_retry),
        }
    }
}

/// 一次任务执行的结果
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// 任务完成，完整检查会带上最终状态
    Completed(Option<DomainStatus>),
    /// 任务已放回队列，延迟后重试
    Requeued(Duration),
    /// 任务失败且不再重试
    Failed,
}

/// 不落库的单次检查结果
#[derive(Debug, Clone)]
pub struct DetachedCheck {
    pub availability: AvailabilityResult,
    pub metrics: Option<MetricsReport>,
    pub record: UpdateRecord,
    /// 降级处理的失败
    pub errors: Vec<String>,
}

/// 流水线编排器
///
/// 按阶段执行一次域名检查：存活 → 可用性 → 指标 → 合并落库。
/// 每个阶段有独立的超时。关键阶段失败时延迟重新入队，
/// 指标阶段失败只影响指标，主状态在指标开始前已经写入。
pub struct PipelineOrchestrator {
    domains: Arc<dyn DomainRepository>,
    metrics: Arc<dyn DomainMetricRepository>,
    queue: Arc<dyn CheckQueue>,
    liveness: Arc<LivenessChecker>,
    availability: Arc<AvailabilityResolver>,
    aggregator: Arc<MetricsAggregator>,
    merge: MergePolicy,
    config: PipelineConfig,
}

impl PipelineOrchestrator {
    /// 创建流水线编排器
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        domains: Arc<dyn DomainRepository>,
        metrics: Arc<dyn DomainMetricRepository>,
        queue: Arc<dyn CheckQueue>,
        liveness: Arc<LivenessChecker>,
        availability: Arc<AvailabilityResolver>,
        aggregator: Arc<MetricsAggregator>,
        merge: MergePolicy,
        config: PipelineConfig,
    ) -> Self {
        Self {
            domains,
            metrics,
            queue,
            liveness,
            availability,
            aggregator,
            merge,
            config,
        }
    }

    /// 为域名创建一个完整检查任务
    ///
    /// 已有尚未开始的完整检查任务时直接返回它。
    pub async fn enqueue_full_check(&self, domain_id: Uuid) -> Result<CheckJob, PipelineError> {
        if let Some(existing) = self.queue.pending(domain_id, JobKind::FullCheck).await? {
            if existing.status == JobStatus::Queued {
                debug!("Reusing queued full check {} for {}", existing.id, domain_id);
                return Ok(existing);
            }
        }

        let job = CheckJob::new(
            domain_id,
            JobKind::FullCheck,
            self.config.full_check_retry.max_attempts as i32,
        );
        Ok(self.queue.enqueue(job).await?)
    }

    /// 执行一个已出队的任务
    ///
    /// # 参数
    ///
    /// * `job` - 已加锁的任务，`attempt_count` 已包含本次执行
    ///
    /// # 返回值
    ///
    /// * `Ok(JobOutcome)` - 任务最终的处理方式
    /// * `Err(PipelineError)` - 连任务状态都无法写回，锁过期后由维护任务回收
    pub async fn run_job(&self, job: &CheckJob) -> Result<JobOutcome, PipelineError> {
        let Some(domain) = self.domains.find_by_id(job.domain_id).await? else {
            warn!("Domain {} of job {} no longer exists", job.domain_id, job.id);
            self.queue.fail(job.id, "domain not found").await?;
            return Ok(JobOutcome::Failed);
        };

        match job.kind {
            JobKind::FullCheck => self.run_full_check(job, domain).await,
            JobKind::MetricsOnly => self.run_metrics_only(job, &domain).await,
        }
    }

    async fn run_full_check(&self, job: &CheckJob, mut domain: Domain) -> Result<JobOutcome, PipelineError> {
        let result = self.check_and_persist(&mut domain).await;

        let (status, live) = match result {
            Ok(done) => done,
            Err(e) => return self.handle_critical_failure(job, &domain, e).await,
        };
        self.queue.complete(job.id).await?;
        counter!("domain_checks_total", "outcome" => status.to_string()).increment(1);
        info!("Domain {} concluded as {}", domain.name, status);

        // Metrics never change the primary status
        if live {
            if let Err(e) = self.collect_metrics(&domain).await {
                warn!("Metrics for {} failed: {}", domain.name, e);
                if let Err(e) = self.enqueue_metrics_job(domain.id).await {
                    error!("Failed to schedule metrics retry for {}: {}", domain.name, e);
                }
            }
        }

        Ok(JobOutcome::Completed(Some(status)))
    }

    async fn check_and_persist(&self, domain: &mut Domain) -> Result<(DomainStatus, bool), PipelineError> {
        self.domains.mark_checking(domain.id).await?;
        domain.begin_check();

        let liveness = self.liveness_stage(&domain.name).await?;
        let availability = run_stage(
            PipelineStage::Availability,
            self.config.availability_timeout,
            self.availability.resolve(&domain.name, &liveness),
        )
        .await?;

        let update = self.merge.merge_availability(&availability, now());
        domain
            .conclude(&update)
            .map_err(|source| PipelineError::Stage {
                stage: PipelineStage::Availability,
                source,
            })?;
        self.domains.apply_update(domain.id, &update).await?;

        Ok((update.status, liveness.is_live()))
    }

    async fn liveness_stage(&self, name: &str) -> Result<LivenessResult, PipelineError> {
        run_stage(
            PipelineStage::Liveness,
            self.config.liveness_timeout,
            self.liveness.check(name),
        )
        .await
    }

    /// 关键阶段失败：还有次数就延迟重试，否则标记死亡
    async fn handle_critical_failure(
        &self,
        job: &CheckJob,
        domain: &Domain,
        err: PipelineError,
    ) -> Result<JobOutcome, PipelineError> {
        let message = err.to_string();

        if job.can_retry() {
            let delay = self
                .config
                .full_check_retry
                .calculate_backoff(job.attempt_count.max(1) as u32);
            warn!(
                "Full check of {} failed on attempt {}/{}: {}; retrying in {:?}",
                domain.name, job.attempt_count, job.max_attempts, message, delay
            );
            self.queue.requeue(job.id, delay, &message).await?;
            counter!("jobs_requeued_total", "kind" => job.kind.to_string()).increment(1);
            return Ok(JobOutcome::Requeued(delay));
        }

        error!(
            "Full check of {} exhausted {} attempts: {}",
            domain.name, job.max_attempts, message
        );
        self.domains.mark_dead(domain.id, now()).await?;
        self.queue.fail(job.id, &message).await?;
        counter!("domain_checks_total", "outcome" => DomainStatus::Dead.to_string()).increment(1);
        Ok(JobOutcome::Failed)
    }

    async fn run_metrics_only(&self, job: &CheckJob, domain: &Domain) -> Result<JobOutcome, PipelineError> {
        match self.collect_metrics(domain).await {
            Ok(_) => {
                self.queue.complete(job.id).await?;
                Ok(JobOutcome::Completed(None))
            }
            Err(e) => self.retry_metrics_job(job, domain, e).await,
        }
    }

    async fn retry_metrics_job(
        &self,
        job: &CheckJob,
        domain: &Domain,
        err: PipelineError,
    ) -> Result<JobOutcome, PipelineError> {
        let message = err.to_string();
        if !job.can_retry() {
            error!(
                "Metrics for {} exhausted {} attempts: {}",
                domain.name, job.max_attempts, message
            );
            self.queue.fail(job.id, &message).await?;
            return Ok(JobOutcome::Failed);
        }

        // The first delay was spent before the job ran at all
        let delay = self
            .config
            .metrics_retry
            .calculate_backoff(job.attempt_count.max(0) as u32 + 1);
        warn!(
            "Metrics for {} failed on attempt {}/{}: {}; retrying in {:?}",
            domain.name, job.attempt_count, job.max_attempts, message, delay
        );
        self.queue.requeue(job.id, delay, &message).await?;
        counter!("jobs_requeued_total", "kind" => job.kind.to_string()).increment(1);
        Ok(JobOutcome::Requeued(delay))
    }

    /// 创建延迟执行的指标任务，已有未结束的同类任务时直接复用
    async fn enqueue_metrics_job(&self, domain_id: Uuid) -> Result<CheckJob, PipelineError> {
        if let Some(existing) = self.queue.pending(domain_id, JobKind::MetricsOnly).await? {
            debug!("Metrics job {} already pending for {}", existing.id, domain_id);
            return Ok(existing);
        }

        let delay = self.config.metrics_retry.calculate_backoff(1);
        let job = CheckJob::new(
            domain_id,
            JobKind::MetricsOnly,
            self.config.metrics_retry.max_attempts as i32,
        )
        .delayed(chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero()));
        let job = self.queue.enqueue(job).await?;
        counter!("jobs_requeued_total", "kind" => JobKind::MetricsOnly.to_string()).increment(1);
        Ok(job)
    }

    /// 获取并写入指标
    ///
    /// 所有提供方都瞬时失败时不写入，避免用空值覆盖上一次的结果。
    async fn collect_metrics(&self, domain: &Domain) -> Result<MetricsSummary, PipelineError> {
        let report = run_stage(
            PipelineStage::Metrics,
            self.config.metrics_timeout,
            self.aggregator.fetch_all(&domain.name),
        )
        .await?;
        if report.needs_retry() {
            return Err(PipelineError::MetricsIncomplete);
        }

        let update = self.merge.merge_metrics(domain.id, &report, now());
        self.metrics.upsert(&update.metric).await?;
        self.domains.apply_metrics(domain.id, &update.summary).await?;
        Ok(update.summary)
    }

    /// 不落库地检查一个规范化域名
    ///
    /// 阶段超时降级为报告中的错误，从不返回错误。
    pub async fn check_detached(&self, name: &str) -> DetachedCheck {
        let mut errors = Vec::new();

        let liveness = match self.liveness_stage(name).await {
            Ok(liveness) => liveness,
            Err(e) => {
                errors.push(e.to_string());
                LivenessResult::unreachable()
            }
        };

        let availability = match run_stage(
            PipelineStage::Availability,
            self.config.availability_timeout,
            self.availability.resolve(name, &liveness),
        )
        .await
        {
            Ok(availability) => availability,
            Err(e) => AvailabilityResult::from_liveness_only(&liveness, e.to_string()),
        };
        errors.extend(availability.errors.iter().cloned());

        let metrics = if liveness.is_live() {
            match run_stage(
                PipelineStage::Metrics,
                self.config.metrics_timeout,
                self.aggregator.fetch_all(name),
            )
            .await
            {
                Ok(report) => Some(report),
                Err(e) => {
                    errors.push(e.to_string());
                    None
                }
            }
        } else {
            None
        };

        let record = self
            .merge
            .merge(Uuid::nil(), &availability, metrics.as_ref(), now());
        DetachedCheck {
            availability,
            metrics,
            record,
            errors,
        }
    }
}

async fn run_stage<T>(
    stage: PipelineStage,
    timeout: Duration,
    future: impl Future<Output = T>,
) -> Result<T, PipelineError> {
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| PipelineError::StageTimeout(stage))
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().into()
}

#[cfg(test)]
#[path = "pipeline_orchestrator_test.rs"]
mod tests;
