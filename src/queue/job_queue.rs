// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::check_job::{CheckJob, JobKind};
use crate::domain::repositories::check_job_repository::CheckJobRepository;
use crate::domain::repositories::RepositoryError;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// 队列为空
    #[error("Queue empty")]
    Empty,
}

/// 检查任务队列特质
#[async_trait]
pub trait CheckQueue: Send + Sync {
    /// 入队任务
    async fn enqueue(&self, job: CheckJob) -> Result<CheckJob, QueueError>;

    /// 出队一个到期任务，没有时返回 `QueueError::Empty`
    async fn dequeue(&self, worker_id: Uuid) -> Result<CheckJob, QueueError>;

    /// 域名尚未结束的同类任务
    async fn pending(&self, domain_id: Uuid, kind: JobKind) -> Result<Option<CheckJob>, QueueError>;

    /// 延迟后重新执行
    async fn requeue(&self, job_id: Uuid, delay: Duration, error: &str) -> Result<(), QueueError>;

    /// 完成任务
    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError>;

    /// 失败任务
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<(), QueueError>;
}

/// 基于数据库表的任务队列
///
/// 出队使用 `FOR UPDATE SKIP LOCKED`，多个工作器可以并发出队。
pub struct DatabaseCheckQueue<R: CheckJobRepository> {
    /// 任务仓库
    repository: Arc<R>,
    /// 出队时的锁持有时长
    lock_duration: chrono::Duration,
}

impl<R: CheckJobRepository> DatabaseCheckQueue<R> {
    /// 创建新的任务队列实例
    ///
    /// # 参数
    ///
    /// * `repository` - 任务仓库
    /// * `lock_duration` - 出队后锁的有效期，超过后维护任务会重置该任务
    ///
    /// # 返回值
    ///
    /// 返回新的任务队列实例
    pub fn new(repository: Arc<R>, lock_duration: Duration) -> Self {
        Self {
            repository,
            lock_duration: chrono::Duration::from_std(lock_duration)
                .unwrap_or_else(|_| chrono::Duration::minutes(10)),
        }
    }
}

#[async_trait]
impl<R: CheckJobRepository> CheckQueue for DatabaseCheckQueue<R> {
    async fn enqueue(&self, job: CheckJob) -> Result<CheckJob, QueueError> {
        let created = self.repository.create(&job).await?;
        Ok(created)
    }

    /// 出队任务
    ///
    /// # 参数
    ///
    /// * `worker_id` - 工作者ID
    ///
    /// # 返回值
    ///
    /// * `Ok(CheckJob)` - 成功出队的任务
    /// * `Err(QueueError::Empty)` - 没有到期任务
    /// * `Err(QueueError)` - 出队失败
    async fn dequeue(&self, worker_id: Uuid) -> Result<CheckJob, QueueError> {
        self.repository
            .acquire_next(worker_id, self.lock_duration)
            .await?
            .ok_or(QueueError::Empty)
    }

    async fn pending(&self, domain_id: Uuid, kind: JobKind) -> Result<Option<CheckJob>, QueueError> {
        Ok(self.repository.find_pending(domain_id, kind).await?)
    }

    async fn requeue(&self, job_id: Uuid, delay: Duration, error: &str) -> Result<(), QueueError> {
        let delay = chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
        self.repository
            .reschedule(job_id, (Utc::now() + delay).into(), error)
            .await?;
        Ok(())
    }

    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError> {
        self.repository.mark_completed(job_id).await?;
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<(), QueueError> {
        self.repository.mark_failed(job_id, error).await?;
        Ok(())
    }
}

#[async_trait]
impl<T: CheckQueue + ?Sized> CheckQueue for Arc<T> {
    async fn enqueue(&self, job: CheckJob) -> Result<CheckJob, QueueError> {
        (**self).enqueue(job).await
    }

    async fn dequeue(&self, worker_id: Uuid) -> Result<CheckJob, QueueError> {
        (**self).dequeue(worker_id).await
    }

    async fn pending(&self, domain_id: Uuid, kind: JobKind) -> Result<Option<CheckJob>, QueueError> {
        (**self).pending(domain_id, kind).await
    }

    async fn requeue(&self, job_id: Uuid, delay: Duration, error: &str) -> Result<(), QueueError> {
        (**self).requeue(job_id, delay, error).await
    }

    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError> {
        (**self).complete(job_id).await
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<(), QueueError> {
        (**self).fail(job_id, error).await
    }
}
