// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::domain::{AvailabilityUpdate, Domain, DomainStatus, MetricsSummary};
use crate::domain::repositories::RepositoryError;

/// 每页最多返回的记录数
pub const MAX_PER_PAGE: u64 = 200;

/// 按最近一次 HTTP 探测划分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    /// 最近一次探测返回 200
    Live,
    /// 其他状态码或从未探测
    Dead,
}

/// 域名列表过滤条件，未设置的条件不参与过滤
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<DomainStatus>,
    pub reachability: Option<Reachability>,
    pub has_metrics: Option<bool>,
    pub min_backlinks: Option<i64>,
    pub min_domain_authority: Option<f64>,
    /// 针对指标记录中的页面权重
    pub min_page_authority: Option<f64>,
}

/// 分页参数，页码从 1 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// 页码至少为 1，每页条数限制在 1..=MAX_PER_PAGE
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 50)
    }
}

/// 一页域名
#[derive(Debug, Clone, Serialize)]
pub struct DomainPage {
    pub items: Vec<Domain>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

/// 域名仓库特质
///
/// 每个写操作只触及对应阶段的字段组，不同阶段的并发写入互不覆盖。
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// 创建域名，同一项目内重名时返回已有记录
    async fn create(&self, domain: &Domain) -> Result<Domain, RepositoryError>;
    /// 根据ID查找域名
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Domain>, RepositoryError>;
    /// 批量查找域名，不存在的ID被忽略
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Domain>, RepositoryError>;
    /// 按项目和规范化域名查找
    async fn find_by_name(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<Option<Domain>, RepositoryError>;
    /// 进入检查状态
    async fn mark_checking(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// 写入可用性字段组并结束检查
    async fn apply_update(&self, id: Uuid, update: &AvailabilityUpdate)
        -> Result<(), RepositoryError>;
    /// 写入指标汇总字段组
    async fn apply_metrics(&self, id: Uuid, summary: &MetricsSummary)
        -> Result<(), RepositoryError>;
    /// 标记为死亡，HTTP 状态码清零
    async fn mark_dead(&self, id: Uuid, now: DateTime<FixedOffset>) -> Result<(), RepositoryError>;
    /// 按条件分页列出域名，按创建时间排序
    async fn list(
        &self,
        filter: &DomainFilter,
        page: PageRequest,
    ) -> Result<DomainPage, RepositoryError>;
}

#[async_trait]
impl<T: DomainRepository + ?Sized> DomainRepository for Arc<T> {
    async fn create(&self, domain: &Domain) -> Result<Domain, RepositoryError> {
        (**self).create(domain).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Domain>, RepositoryError> {
        (**self).find_by_id(id).await
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Domain>, RepositoryError> {
        (**self).find_by_ids(ids).await
    }

    async fn find_by_name(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<Option<Domain>, RepositoryError> {
        (**self).find_by_name(project_id, name).await
    }

    async fn mark_checking(&self, id: Uuid) -> Result<(), RepositoryError> {
        (**self).mark_checking(id).await
    }

    async fn apply_update(
        &self,
        id: Uuid,
        update: &AvailabilityUpdate,
    ) -> Result<(), RepositoryError> {
        (**self).apply_update(id, update).await
    }

    async fn apply_metrics(&self, id: Uuid, summary: &MetricsSummary) -> Result<(), RepositoryError> {
        (**self).apply_metrics(id, summary).await
    }

    async fn mark_dead(&self, id: Uuid, now: DateTime<FixedOffset>) -> Result<(), RepositoryError> {
        (**self).mark_dead(id, now).await
    }

    async fn list(
        &self,
        filter: &DomainFilter,
        page: PageRequest,
    ) -> Result<DomainPage, RepositoryError> {
        (**self).list(filter, page).await
    }
}
