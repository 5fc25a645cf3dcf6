// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::check_job::{CheckJob, JobKind};
use crate::domain::repositories::RepositoryError;

/// 检查任务仓库特质
///
/// 定义持久化队列的数据访问接口
#[async_trait]
pub trait CheckJobRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, job: &CheckJob) -> Result<CheckJob, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CheckJob>, RepositoryError>;
    /// 查找某个域名尚未结束的同类任务
    async fn find_pending(
        &self,
        domain_id: Uuid,
        kind: JobKind,
    ) -> Result<Option<CheckJob>, RepositoryError>;
    /// 锁定下一个到期的任务，执行次数加一
    ///
    /// # 参数
    ///
    /// * `worker_id` - 写入 `lock_token` 的工作器ID
    /// * `lock_duration` - 锁持有时长，过期后维护任务会把它放回队列
    async fn acquire_next(
        &self,
        worker_id: Uuid,
        lock_duration: Duration,
    ) -> Result<Option<CheckJob>, RepositoryError>;
    /// 放回队列并设置下次执行时间
    async fn reschedule(
        &self,
        id: Uuid,
        scheduled_at: DateTime<FixedOffset>,
        error: &str,
    ) -> Result<(), RepositoryError>;
    /// 标记任务已完成
    async fn mark_completed(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// 标记任务已失败
    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), RepositoryError>;
    /// 把锁已过期的活动任务放回队列
    async fn reset_stuck_jobs(&self) -> Result<u64, RepositoryError>;
}

#[async_trait]
impl<T: CheckJobRepository + ?Sized> CheckJobRepository for Arc<T> {
    async fn create(&self, job: &CheckJob) -> Result<CheckJob, RepositoryError> {
        (**self).create(job).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CheckJob>, RepositoryError> {
        (**self).find_by_id(id).await
    }

    async fn find_pending(
        &self,
        domain_id: Uuid,
        kind: JobKind,
    ) -> Result<Option<CheckJob>, RepositoryError> {
        (**self).find_pending(domain_id, kind).await
    }

    async fn acquire_next(
        &self,
        worker_id: Uuid,
        lock_duration: Duration,
    ) -> Result<Option<CheckJob>, RepositoryError> {
        (**self).acquire_next(worker_id, lock_duration).await
    }

    async fn reschedule(
        &self,
        id: Uuid,
        scheduled_at: DateTime<FixedOffset>,
        error: &str,
    ) -> Result<(), RepositoryError> {
        (**self).reschedule(id, scheduled_at, error).await
    }

    async fn mark_completed(&self, id: Uuid) -> Result<(), RepositoryError> {
        (**self).mark_completed(id).await
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), RepositoryError> {
        (**self).mark_failed(id, error).await
    }

    async fn reset_stuck_jobs(&self) -> Result<u64, RepositoryError> {
        (**self).reset_stuck_jobs().await
    }
}
