// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::domain::MetricsSource;
use crate::domain::models::domain_metric::DomainMetric;
use crate::domain::repositories::domain_metric_repository::DomainMetricRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::domain_metric as metric_entity;

/// 域名指标仓库实现
///
/// 写入以 `domain_id` 为冲突键整体覆盖，重复写入同一结果是幂等的。
#[derive(Clone)]
pub struct DomainMetricRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl DomainMetricRepositoryImpl {
    /// 创建新的指标仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<metric_entity::Model> for DomainMetric {
    fn from(model: metric_entity::Model) -> Self {
        Self {
            id: model.id,
            domain_id: model.domain_id,
            authority_backlinks: model.authority_backlinks,
            authority_referring_domains: model.authority_referring_domains,
            authority_citation_flow: model.authority_citation_flow,
            authority_trust_flow: model.authority_trust_flow,
            index_page_count: model.index_page_count,
            citation_index: model.citation_index,
            citation_indexed_pages: model.citation_indexed_pages,
            citation_backlinks: model.citation_backlinks,
            archive_first_capture: model.archive_first_capture,
            archive_age_days: model.archive_age_days,
            social_likes: model.social_likes,
            rank_domain_authority: model.rank_domain_authority,
            rank_page_authority: model.rank_page_authority,
            rank_global: model.rank_global,
            rank_semrush: model.rank_semrush,
            rank_backlinks: model.rank_backlinks,
            source: model.source.parse().unwrap_or(MetricsSource::Unavailable),
            checked_at: model.checked_at,
        }
    }
}

impl From<&DomainMetric> for metric_entity::ActiveModel {
    fn from(metric: &DomainMetric) -> Self {
        Self {
            id: Set(metric.id),
            domain_id: Set(metric.domain_id),
            authority_backlinks: Set(metric.authority_backlinks),
            authority_referring_domains: Set(metric.authority_referring_domains),
            authority_citation_flow: Set(metric.authority_citation_flow),
            authority_trust_flow: Set(metric.authority_trust_flow),
            index_page_count: Set(metric.index_page_count),
            citation_index: Set(metric.citation_index),
            citation_indexed_pages: Set(metric.citation_indexed_pages),
            citation_backlinks: Set(metric.citation_backlinks),
            archive_first_capture: Set(metric.archive_first_capture),
            archive_age_days: Set(metric.archive_age_days),
            social_likes: Set(metric.social_likes),
            rank_domain_authority: Set(metric.rank_domain_authority),
            rank_page_authority: Set(metric.rank_page_authority),
            rank_global: Set(metric.rank_global),
            rank_semrush: Set(metric.rank_semrush),
            rank_backlinks: Set(metric.rank_backlinks),
            source: Set(metric.source.to_string()),
            checked_at: Set(metric.checked_at),
        }
    }
}

#[async_trait]
impl DomainMetricRepository for DomainMetricRepositoryImpl {
    async fn upsert(&self, metric: &DomainMetric) -> Result<DomainMetric, RepositoryError> {
        use metric_entity::Column;

        let model: metric_entity::ActiveModel = metric.into();

        // The row id stays the one first inserted for the domain.
        metric_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::column(Column::DomainId)
                    .update_columns([
                        Column::AuthorityBacklinks,
                        Column::AuthorityReferringDomains,
                        Column::AuthorityCitationFlow,
                        Column::AuthorityTrustFlow,
                        Column::IndexPageCount,
                        Column::CitationIndex,
                        Column::CitationIndexedPages,
                        Column::CitationBacklinks,
                        Column::ArchiveFirstCapture,
                        Column::ArchiveAgeDays,
                        Column::SocialLikes,
                        Column::RankDomainAuthority,
                        Column::RankPageAuthority,
                        Column::RankGlobal,
                        Column::RankSemrush,
                        Column::RankBacklinks,
                        Column::Source,
                        Column::CheckedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await?;

        self.find_by_domain_id(metric.domain_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_domain_id(
        &self,
        domain_id: Uuid,
    ) -> Result<Option<DomainMetric>, RepositoryError> {
        let model = metric_entity::Entity::find()
            .filter(metric_entity::Column::DomainId.eq(domain_id))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }
}
