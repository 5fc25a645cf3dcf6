// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::check_request::{
    BatchCheckRequestDto, CheckRequestDto, ListDomainsQueryDto, RawBatchCheckRequestDto,
};
use crate::application::dto::check_response::{
    BatchCheckErrorDto, BatchCheckItemDto, BatchCheckReportDto, BatchItemState,
    CacheInvalidationDto, CheckReportDto, DomainDetailDto, EnqueueResponseDto,
};
use crate::domain::repositories::domain_metric_repository::DomainMetricRepository;
use crate::domain::repositories::domain_repository::{DomainPage, DomainRepository};
use crate::domain::repositories::RepositoryError;
use crate::domain::services::domain_normalizer;
use crate::domain::services::pipeline_orchestrator::{PipelineError, PipelineOrchestrator};
use crate::infrastructure::cache::cache_layer::{
    CacheLayer, DNS_NAMESPACE, LIVENESS_NAMESPACE, WHOIS_NAMESPACE,
};

#[derive(Error, Debug)]
pub enum DomainCheckError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Domain not found")]
    NotFound,
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Cache error: {0}")]
    Cache(#[from] anyhow::Error),
}

/// 同步批量检查默认的并发数
pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;

/// 域名检查用例
///
/// 对外的触发方式：同步检查原始域名（单个或一批）、按ID入队、批量入队。
pub struct DomainCheckUseCase {
    domains: Arc<dyn DomainRepository>,
    metrics: Arc<dyn DomainMetricRepository>,
    orchestrator: Arc<PipelineOrchestrator>,
    cache: CacheLayer,
    cache_namespaces: Vec<String>,
    batch_concurrency: usize,
}

impl DomainCheckUseCase {
    /// 创建检查用例
    ///
    /// # 参数
    ///
    /// * `domains` - 域名仓库
    /// * `metrics` - 指标仓库
    /// * `orchestrator` - 流水线编排器
    /// * `cache` - 共享缓存层
    /// * `provider_names` - 提供方名称，失效缓存时作为命名空间
    pub fn new(
        domains: Arc<dyn DomainRepository>,
        metrics: Arc<dyn DomainMetricRepository>,
        orchestrator: Arc<PipelineOrchestrator>,
        cache: CacheLayer,
        provider_names: Vec<&'static str>,
    ) -> Self {
        let cache_namespaces = [LIVENESS_NAMESPACE, DNS_NAMESPACE, WHOIS_NAMESPACE]
            .into_iter()
            .chain(provider_names)
            .map(str::to_string)
            .collect();

        Self {
            domains,
            metrics,
            orchestrator,
            cache,
            cache_namespaces,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    /// 设置同步批量检查的并发数，至少为 1
    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    /// 同步检查一个原始域名，不写数据库
    pub async fn check_domain(
        &self,
        dto: CheckRequestDto,
    ) -> Result<CheckReportDto, DomainCheckError> {
        let name = validated_name(&dto)?;
        let check = self.orchestrator.check_detached(&name).await;
        Ok(CheckReportDto::from_detached(name, check))
    }

    /// 同步检查一批原始域名，不写数据库
    ///
    /// 结果按输入顺序返回。无法规范化的输入计入 `error_details`，
    /// 不影响其余域名。
    pub async fn batch_check(
        &self,
        dto: RawBatchCheckRequestDto,
    ) -> Result<BatchCheckReportDto, DomainCheckError> {
        dto.validate()
            .map_err(|e| DomainCheckError::ValidationError(e.to_string()))?;

        let mut report = BatchCheckReportDto {
            total: dto.domains.len(),
            ..BatchCheckReportDto::default()
        };

        let mut names = Vec::with_capacity(dto.domains.len());
        for raw in dto.domains {
            match validated_name(&CheckRequestDto { domain: raw.clone() }) {
                Ok(name) => names.push(name),
                Err(e) => report.error_details.push(BatchCheckErrorDto {
                    domain: raw,
                    error: e.to_string(),
                }),
            }
        }

        let orchestrator = &self.orchestrator;
        report.results = stream::iter(names)
            .map(|name| async move {
                let check = orchestrator.check_detached(&name).await;
                BatchCheckItemDto::from(CheckReportDto::from_detached(name, check))
            })
            .buffered(self.batch_concurrency)
            .collect()
            .await;

        report.active = report
            .results
            .iter()
            .filter(|item| item.state == BatchItemState::Active)
            .count();
        report.dead = report.results.len() - report.active;
        report.errors = report.error_details.len();

        info!(
            "Batch check of {} names: {} active, {} dead, {} rejected",
            report.total, report.active, report.dead, report.errors
        );
        Ok(report)
    }

    /// 按条件分页列出域名
    pub async fn list_domains(
        &self,
        query: ListDomainsQueryDto,
    ) -> Result<DomainPage, DomainCheckError> {
        query
            .validate()
            .map_err(|e| DomainCheckError::ValidationError(e.to_string()))?;
        Ok(self
            .domains
            .list(&query.filter(), query.page_request())
            .await?)
    }

    /// 为一个已有域名入队完整检查
    pub async fn enqueue_check(&self, domain_id: Uuid) -> Result<EnqueueResponseDto, DomainCheckError> {
        if self.domains.find_by_id(domain_id).await?.is_none() {
            return Err(DomainCheckError::NotFound);
        }

        let job = self.orchestrator.enqueue_full_check(domain_id).await?;
        Ok(EnqueueResponseDto {
            queued_count: 1,
            job_ids: vec![job.id],
            missing: Vec::new(),
        })
    }

    /// 批量入队完整检查
    ///
    /// 重复的ID只入队一次，不存在的ID在响应中列出。
    pub async fn enqueue_batch(
        &self,
        dto: BatchCheckRequestDto,
    ) -> Result<EnqueueResponseDto, DomainCheckError> {
        dto.validate()
            .map_err(|e| DomainCheckError::ValidationError(e.to_string()))?;

        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = dto
            .domain_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        let found: HashSet<Uuid> = self
            .domains
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|domain| domain.id)
            .collect();

        let mut response = EnqueueResponseDto::default();
        for id in ids {
            if !found.contains(&id) {
                response.missing.push(id);
                continue;
            }
            let job = self.orchestrator.enqueue_full_check(id).await?;
            response.job_ids.push(job.id);
        }
        response.queued_count = response.job_ids.len();

        info!(
            "Queued {} checks, {} ids missing",
            response.queued_count,
            response.missing.len()
        );
        Ok(response)
    }

    /// 读取域名及其指标记录
    pub async fn get_domain(&self, domain_id: Uuid) -> Result<DomainDetailDto, DomainCheckError> {
        let domain = self
            .domains
            .find_by_id(domain_id)
            .await?
            .ok_or(DomainCheckError::NotFound)?;
        let metric = self.metrics.find_by_domain_id(domain_id).await?;
        Ok(DomainDetailDto { domain, metric })
    }

    /// 删除某个域名在所有命名空间下的缓存
    pub async fn invalidate_cache(&self, raw: &str) -> Result<CacheInvalidationDto, DomainCheckError> {
        let name = validated_name(&CheckRequestDto {
            domain: raw.to_string(),
        })?;
        let invalidated = self
            .cache
            .invalidate_domain(&name, self.cache_namespaces.iter().map(String::as_str))
            .await?;
        Ok(CacheInvalidationDto {
            domain: name,
            invalidated,
        })
    }
}

fn validated_name(dto: &CheckRequestDto) -> Result<String, DomainCheckError> {
    dto.validate()
        .map_err(|e| DomainCheckError::ValidationError(e.to_string()))?;

    let name = domain_normalizer::normalize(&dto.domain);
    if !domain_normalizer::is_plausible(&name) {
        return Err(DomainCheckError::ValidationError(format!(
            "invalid domain name: {}",
            dto.domain
        )));
    }
    Ok(name)
}
