// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, LockBehavior, LockType},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::check_job::{CheckJob, JobKind, JobStatus};
use crate::domain::repositories::check_job_repository::CheckJobRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::check_job as job_entity;

/// 检查任务仓库实现
///
/// 基于SeaORM实现的持久化队列。Postgres 上出队使用
/// `FOR UPDATE SKIP LOCKED`，多个工作器不会拿到同一个任务。
#[derive(Clone)]
pub struct CheckJobRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl CheckJobRepositoryImpl {
    /// 创建新的检查任务仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn update_columns(&self, model: job_entity::ActiveModel) -> Result<(), RepositoryError> {
        match model.update(self.db.as_ref()).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(RepositoryError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

impl TryFrom<job_entity::Model> for CheckJob {
    type Error = RepositoryError;

    fn try_from(model: job_entity::Model) -> Result<Self, Self::Error> {
        let kind = model
            .kind
            .parse()
            .map_err(|_| RepositoryError::Corrupt(format!("unknown job kind {}", model.kind)))?;
        let status = model
            .status
            .parse()
            .map_err(|_| RepositoryError::Corrupt(format!("unknown job status {}", model.status)))?;

        Ok(Self {
            id: model.id,
            domain_id: model.domain_id,
            kind,
            status,
            attempt_count: model.attempt_count,
            max_attempts: model.max_attempts,
            last_error: model.last_error,
            scheduled_at: model.scheduled_at,
            lock_token: model.lock_token,
            lock_expires_at: model.lock_expires_at,
            started_at: model.started_at,
            completed_at: model.completed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&CheckJob> for job_entity::ActiveModel {
    fn from(job: &CheckJob) -> Self {
        Self {
            id: Set(job.id),
            domain_id: Set(job.domain_id),
            kind: Set(job.kind.to_string()),
            status: Set(job.status.to_string()),
            attempt_count: Set(job.attempt_count),
            max_attempts: Set(job.max_attempts),
            last_error: Set(job.last_error.clone()),
            scheduled_at: Set(job.scheduled_at),
            lock_token: Set(job.lock_token),
            lock_expires_at: Set(job.lock_expires_at),
            started_at: Set(job.started_at),
            completed_at: Set(job.completed_at),
            created_at: Set(job.created_at),
            updated_at: Set(job.updated_at),
        }
    }
}

#[async_trait]
impl CheckJobRepository for CheckJobRepositoryImpl {
    async fn create(&self, job: &CheckJob) -> Result<CheckJob, RepositoryError> {
        let model: job_entity::ActiveModel = job.into();

        model.insert(self.db.as_ref()).await?;
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CheckJob>, RepositoryError> {
        let model = job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        model.map(CheckJob::try_from).transpose()
    }

    async fn find_pending(
        &self,
        domain_id: Uuid,
        kind: JobKind,
    ) -> Result<Option<CheckJob>, RepositoryError> {
        let model = job_entity::Entity::find()
            .filter(job_entity::Column::DomainId.eq(domain_id))
            .filter(job_entity::Column::Kind.eq(kind.to_string()))
            .filter(job_entity::Column::Status.is_in([
                JobStatus::Queued.to_string(),
                JobStatus::Active.to_string(),
            ]))
            .order_by_asc(job_entity::Column::CreatedAt)
            .one(self.db.as_ref())
            .await?;

        model.map(CheckJob::try_from).transpose()
    }

    async fn acquire_next(
        &self,
        worker_id: Uuid,
        lock_duration: Duration,
    ) -> Result<Option<CheckJob>, RepositoryError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let mut query = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Queued.to_string()))
            .filter(
                Condition::any()
                    .add(job_entity::Column::ScheduledAt.is_null())
                    .add(job_entity::Column::ScheduledAt.lte(now)),
            )
            .order_by_asc(job_entity::Column::ScheduledAt)
            .order_by_asc(job_entity::Column::CreatedAt);
        // SQLite has no row locks; its writer lock serializes acquisition.
        if self.db.get_database_backend() == DatabaseBackend::Postgres {
            query = query.lock_with_behavior(LockType::Update, LockBehavior::SkipLocked);
        }

        let Some(job) = query.one(&txn).await? else {
            txn.commit().await?;
            return Ok(None);
        };

        let attempt_count = job.attempt_count + 1;
        let mut active: job_entity::ActiveModel = job.into();
        active.status = Set(JobStatus::Active.to_string());
        active.lock_token = Set(Some(worker_id));
        active.lock_expires_at = Set(Some((now + lock_duration).into()));
        active.started_at = Set(Some(now.into()));
        active.attempt_count = Set(attempt_count);
        active.updated_at = Set(now.into());

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        CheckJob::try_from(updated).map(Some)
    }

    async fn reschedule(
        &self,
        id: Uuid,
        scheduled_at: DateTime<FixedOffset>,
        error: &str,
    ) -> Result<(), RepositoryError> {
        self.update_columns(job_entity::ActiveModel {
            id: Set(id),
            status: Set(JobStatus::Queued.to_string()),
            scheduled_at: Set(Some(scheduled_at)),
            last_error: Set(Some(error.to_string())),
            lock_token: Set(None),
            lock_expires_at: Set(None),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .await
    }

    async fn mark_completed(&self, id: Uuid) -> Result<(), RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        self.update_columns(job_entity::ActiveModel {
            id: Set(id),
            status: Set(JobStatus::Completed.to_string()),
            completed_at: Set(Some(now)),
            lock_token: Set(None),
            lock_expires_at: Set(None),
            updated_at: Set(now),
            ..Default::default()
        })
        .await
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        self.update_columns(job_entity::ActiveModel {
            id: Set(id),
            status: Set(JobStatus::Failed.to_string()),
            last_error: Set(Some(error.to_string())),
            completed_at: Set(Some(now)),
            lock_token: Set(None),
            lock_expires_at: Set(None),
            updated_at: Set(now),
            ..Default::default()
        })
        .await
    }

    async fn reset_stuck_jobs(&self) -> Result<u64, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();

        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Queued.to_string()),
            )
            .col_expr(job_entity::Column::LockToken, Expr::value(Option::<Uuid>::None))
            .col_expr(
                job_entity::Column::LockExpiresAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(now))
            .filter(job_entity::Column::Status.eq(JobStatus::Active.to_string()))
            .filter(job_entity::Column::LockExpiresAt.lte(now))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }
}
