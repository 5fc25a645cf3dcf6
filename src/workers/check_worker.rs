// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::domain::models::check_job::CheckJob;
use crate::domain::services::pipeline_orchestrator::{JobOutcome, PipelineOrchestrator};
use crate::queue::job_queue::{CheckQueue, QueueError};
use crate::utils::errors::WorkerError;

/// 检查工作器
///
/// 循环从持久化队列取任务交给流水线执行，队列为空时等待下一个轮询周期。
pub struct CheckWorker {
    queue: Arc<dyn CheckQueue>,
    orchestrator: Arc<PipelineOrchestrator>,
    poll_interval: Duration,
    worker_id: Uuid,
}

impl CheckWorker {
    /// 创建新的检查工作器
    ///
    /// # 参数
    ///
    /// * `queue` - 检查任务队列
    /// * `orchestrator` - 流水线编排器
    /// * `poll_interval` - 队列为空时的等待间隔
    pub fn new(
        queue: Arc<dyn CheckQueue>,
        orchestrator: Arc<PipelineOrchestrator>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            orchestrator,
            poll_interval,
            worker_id: Uuid::new_v4(),
        }
    }

    pub fn worker_id(&self) -> Uuid {
        self.worker_id
    }

    /// 运行工作器主循环
    pub async fn run(&self) {
        info!("Check worker {} started", self.worker_id);

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            match self.process_next().await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => error!("Worker {} failed to process job: {}", self.worker_id, e),
            }
            ticker.tick().await;
        }
    }

    /// 处理一个到期任务
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 处理了一个任务
    /// * `Ok(false)` - 队列中没有到期任务
    /// * `Err(WorkerError)` - 出队或执行失败
    pub async fn process_next(&self) -> Result<bool, WorkerError> {
        let job = match self.queue.dequeue(self.worker_id).await {
            Ok(job) => job,
            Err(QueueError::Empty) => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        self.process_job(&job).await?;
        Ok(true)
    }

    #[instrument(skip(self, job), fields(job_id = %job.id, domain_id = %job.domain_id, kind = %job.kind))]
    async fn process_job(&self, job: &CheckJob) -> Result<(), WorkerError> {
        debug!("Processing job, attempt {}", job.attempt_count);

        match self.orchestrator.run_job(job).await? {
            JobOutcome::Completed(Some(status)) => info!("Job completed, domain is {}", status),
            JobOutcome::Completed(None) => info!("Job completed"),
            JobOutcome::Requeued(delay) => info!("Job requeued in {:?}", delay),
            JobOutcome::Failed => info!("Job failed permanently"),
        }
        Ok(())
    }
}
