// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::domain_metric::DomainMetric;
use crate::domain::repositories::RepositoryError;

/// 域名指标仓库特质
#[async_trait]
pub trait DomainMetricRepository: Send + Sync {
    /// 按 `domain_id` 插入或整体覆盖指标记录
    async fn upsert(&self, metric: &DomainMetric) -> Result<DomainMetric, RepositoryError>;
    /// 查找域名的指标记录
    async fn find_by_domain_id(&self, domain_id: Uuid)
        -> Result<Option<DomainMetric>, RepositoryError>;
}

#[async_trait]
impl<T: DomainMetricRepository + ?Sized> DomainMetricRepository for Arc<T> {
    async fn upsert(&self, metric: &DomainMetric) -> Result<DomainMetric, RepositoryError> {
        (**self).upsert(metric).await
    }

    async fn find_by_domain_id(
        &self,
        domain_id: Uuid,
    ) -> Result<Option<DomainMetric>, RepositoryError> {
        (**self).find_by_domain_id(domain_id).await
    }
}
