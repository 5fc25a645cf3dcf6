// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{OnConflict, Query},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::domain::{
    ArchiveProvenance, AvailabilityUpdate, Domain, DomainStatus, MetricsSummary, Protocol,
};
use crate::domain::repositories::domain_repository::{
    DomainFilter, DomainPage, DomainRepository, PageRequest, Reachability,
};
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::domain as domain_entity;
use crate::infrastructure::database::entities::domain_metric as metric_entity;

/// 域名仓库实现
///
/// 基于SeaORM实现。每个阶段的写入只设置本阶段字段组，
/// 其余列保持 `NotSet`，不会被覆盖。
#[derive(Clone)]
pub struct DomainRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl DomainRepositoryImpl {
    /// 创建新的域名仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 以部分列更新一行，行不存在时返回 `NotFound`
    async fn update_columns(&self, model: domain_entity::ActiveModel) -> Result<(), RepositoryError> {
        match model.update(self.db.as_ref()).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(RepositoryError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

/// 把过滤条件转换成查询条件
fn filter_condition(filter: &DomainFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(project_id) = filter.project_id {
        condition = condition.add(domain_entity::Column::ProjectId.eq(project_id));
    }
    if let Some(status) = filter.status {
        condition = condition.add(domain_entity::Column::Status.eq(status.to_string()));
    }
    match filter.reachability {
        Some(Reachability::Live) => {
            condition = condition.add(domain_entity::Column::HttpStatusCode.eq(200));
        }
        Some(Reachability::Dead) => {
            condition = condition.add(
                Condition::any()
                    .add(domain_entity::Column::HttpStatusCode.ne(200))
                    .add(domain_entity::Column::HttpStatusCode.is_null()),
            );
        }
        None => {}
    }
    if let Some(has_metrics) = filter.has_metrics {
        condition = condition.add(domain_entity::Column::MetricsAvailable.eq(has_metrics));
    }
    if let Some(min) = filter.min_backlinks {
        condition = condition.add(domain_entity::Column::BacklinkCount.gte(min));
    }
    if let Some(min) = filter.min_domain_authority {
        condition = condition.add(domain_entity::Column::DomainAuthority.gte(min));
    }
    if let Some(min) = filter.min_page_authority {
        condition = condition.add(
            domain_entity::Column::Id.in_subquery(
                Query::select()
                    .column(metric_entity::Column::DomainId)
                    .from(metric_entity::Entity)
                    .and_where(metric_entity::Column::RankPageAuthority.gte(min))
                    .to_owned(),
            ),
        );
    }

    condition
}

impl TryFrom<domain_entity::Model> for Domain {
    type Error = RepositoryError;

    fn try_from(model: domain_entity::Model) -> Result<Self, Self::Error> {
        let status = model
            .status
            .parse()
            .map_err(|_| RepositoryError::Corrupt(format!("unknown domain status {}", model.status)))?;
        let nameservers: Vec<String> = serde_json::from_value(model.nameservers)
            .map_err(|e| RepositoryError::Corrupt(format!("nameservers: {}", e)))?;

        Ok(Self {
            id: model.id,
            project_id: model.project_id,
            keyword_id: model.keyword_id,
            name: model.name,
            status,
            available: model.available,
            http_status_code: model.http_status_code,
            protocol: model.protocol.parse().unwrap_or_default(),
            ip_address: model.ip_address,
            title: model.title,
            registrar: model.registrar,
            registered_at: model.registered_at,
            registry_updated_at: model.registry_updated_at,
            expires_at: model.expires_at,
            nameservers,
            backlink_count: model.backlink_count,
            referring_domains: model.referring_domains,
            domain_authority: model.domain_authority,
            indexed_pages: model.indexed_pages,
            metrics_checked_at: model.metrics_checked_at,
            metrics_source: model.metrics_source.and_then(|s| s.parse().ok()),
            metrics_available: model.metrics_available,
            checked_at: model.checked_at,
            last_http_check: model.last_http_check,
            archive: ArchiveProvenance {
                first_captured: model.archive_first_captured,
                last_captured: model.archive_last_captured,
                capture_count: model.archive_capture_count,
                webpage_count: model.archive_webpage_count,
                image_count: model.archive_image_count,
                video_count: model.archive_video_count,
                audio_count: model.archive_audio_count,
            },
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&Domain> for domain_entity::ActiveModel {
    fn from(domain: &Domain) -> Self {
        Self {
            id: Set(domain.id),
            project_id: Set(domain.project_id),
            keyword_id: Set(domain.keyword_id),
            name: Set(domain.name.clone()),
            status: Set(domain.status.to_string()),
            available: Set(domain.available),
            http_status_code: Set(domain.http_status_code),
            protocol: Set(domain.protocol.to_string()),
            ip_address: Set(domain.ip_address.clone()),
            title: Set(domain.title.clone()),
            registrar: Set(domain.registrar.clone()),
            registered_at: Set(domain.registered_at),
            registry_updated_at: Set(domain.registry_updated_at),
            expires_at: Set(domain.expires_at),
            nameservers: Set(serde_json::json!(domain.nameservers)),
            backlink_count: Set(domain.backlink_count),
            referring_domains: Set(domain.referring_domains),
            domain_authority: Set(domain.domain_authority),
            indexed_pages: Set(domain.indexed_pages),
            metrics_checked_at: Set(domain.metrics_checked_at),
            metrics_source: Set(domain.metrics_source.map(|s| s.to_string())),
            metrics_available: Set(domain.metrics_available),
            checked_at: Set(domain.checked_at),
            last_http_check: Set(domain.last_http_check),
            archive_first_captured: Set(domain.archive.first_captured),
            archive_last_captured: Set(domain.archive.last_captured),
            archive_capture_count: Set(domain.archive.capture_count),
            archive_webpage_count: Set(domain.archive.webpage_count),
            archive_image_count: Set(domain.archive.image_count),
            archive_video_count: Set(domain.archive.video_count),
            archive_audio_count: Set(domain.archive.audio_count),
            created_at: Set(domain.created_at),
            updated_at: Set(domain.updated_at),
        }
    }
}

#[async_trait]
impl DomainRepository for DomainRepositoryImpl {
    async fn create(&self, domain: &Domain) -> Result<Domain, RepositoryError> {
        let model: domain_entity::ActiveModel = domain.into();

        // Existing (project_id, name) rows are kept as they are.
        domain_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([domain_entity::Column::ProjectId, domain_entity::Column::Name])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(self.db.as_ref())
            .await?;

        self.find_by_name(domain.project_id, &domain.name)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Domain>, RepositoryError> {
        let model = domain_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        model.map(Domain::try_from).transpose()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Domain>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = domain_entity::Entity::find()
            .filter(domain_entity::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(domain_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        models.into_iter().map(Domain::try_from).collect()
    }

    async fn find_by_name(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<Option<Domain>, RepositoryError> {
        let model = domain_entity::Entity::find()
            .filter(domain_entity::Column::ProjectId.eq(project_id))
            .filter(domain_entity::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await?;

        model.map(Domain::try_from).transpose()
    }

    async fn mark_checking(&self, id: Uuid) -> Result<(), RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        self.update_columns(domain_entity::ActiveModel {
            id: Set(id),
            status: Set(DomainStatus::Checking.to_string()),
            updated_at: Set(now),
            ..Default::default()
        })
        .await
    }

    async fn apply_update(
        &self,
        id: Uuid,
        update: &AvailabilityUpdate,
    ) -> Result<(), RepositoryError> {
        self.update_columns(domain_entity::ActiveModel {
            id: Set(id),
            status: Set(update.status.to_string()),
            available: Set(update.available),
            http_status_code: Set(update.http_status_code),
            protocol: Set(update.protocol.to_string()),
            ip_address: Set(update.ip_address.clone()),
            title: Set(update.title.clone()),
            registrar: Set(update.whois.registrar.clone()),
            registered_at: Set(update.whois.created_at),
            registry_updated_at: Set(update.whois.updated_at),
            expires_at: Set(update.whois.expires_at),
            nameservers: Set(serde_json::json!(update.nameservers)),
            checked_at: Set(Some(update.checked_at)),
            last_http_check: Set(Some(update.checked_at)),
            updated_at: Set(update.checked_at),
            ..Default::default()
        })
        .await
    }

    async fn apply_metrics(&self, id: Uuid, summary: &MetricsSummary) -> Result<(), RepositoryError> {
        self.update_columns(domain_entity::ActiveModel {
            id: Set(id),
            backlink_count: Set(summary.backlink_count),
            referring_domains: Set(summary.referring_domains),
            domain_authority: Set(summary.domain_authority),
            indexed_pages: Set(summary.indexed_pages),
            metrics_source: Set(Some(summary.metrics_source.to_string())),
            metrics_available: Set(summary.metrics_available),
            metrics_checked_at: Set(Some(summary.metrics_checked_at)),
            ..Default::default()
        })
        .await
    }

    async fn mark_dead(&self, id: Uuid, now: DateTime<FixedOffset>) -> Result<(), RepositoryError> {
        self.update_columns(domain_entity::ActiveModel {
            id: Set(id),
            status: Set(DomainStatus::Dead.to_string()),
            available: Set(false),
            http_status_code: Set(Some(0)),
            protocol: Set(Protocol::Unknown.to_string()),
            title: Set(None),
            checked_at: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        })
        .await
    }

    async fn list(
        &self,
        filter: &DomainFilter,
        page: PageRequest,
    ) -> Result<DomainPage, RepositoryError> {
        let paginator = domain_entity::Entity::find()
            .filter(filter_condition(filter))
            .order_by_asc(domain_entity::Column::CreatedAt)
            .order_by_asc(domain_entity::Column::Id)
            .paginate(self.db.as_ref(), page.per_page);

        let counts = paginator.num_items_and_pages().await?;
        let models = paginator.fetch_page(page.page - 1).await?;
        let items = models
            .into_iter()
            .map(Domain::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DomainPage {
            items,
            total: counts.number_of_items,
            page: page.page,
            per_page: page.per_page,
            total_pages: counts.number_of_pages,
        })
    }
}
