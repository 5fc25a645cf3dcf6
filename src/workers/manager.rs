// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::domain::repositories::check_job_repository::CheckJobRepository;
use crate::domain::services::pipeline_orchestrator::PipelineOrchestrator;
use crate::queue::job_queue::CheckQueue;
use crate::queue::scheduler::JobScheduler;
use crate::workers::check_worker::CheckWorker;

/// 工作管理器
///
/// 启动检查工作器池和队列维护任务，并负责关闭它们。
pub struct WorkerManager<R: CheckJobRepository + 'static> {
    queue: Arc<dyn CheckQueue>,
    repository: Arc<R>,
    orchestrator: Arc<PipelineOrchestrator>,
    poll_interval: Duration,
    maintenance_interval: Duration,
    handles: Vec<JoinHandle<()>>,
}

impl<R: CheckJobRepository + 'static> WorkerManager<R> {
    /// 创建工作管理器
    ///
    /// # 参数
    ///
    /// * `queue` - 检查任务队列
    /// * `repository` - 任务仓库，维护任务用它重置卡住的任务
    /// * `orchestrator` - 流水线编排器
    /// * `poll_interval` - 工作器空闲时的轮询间隔
    /// * `maintenance_interval` - 维护任务间隔
    pub fn new(
        queue: Arc<dyn CheckQueue>,
        repository: Arc<R>,
        orchestrator: Arc<PipelineOrchestrator>,
        poll_interval: Duration,
        maintenance_interval: Duration,
    ) -> Self {
        Self {
            queue,
            repository,
            orchestrator,
            poll_interval,
            maintenance_interval,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// 创建并启动指定数量的工作器，外加一个队列维护任务
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作器数量
    pub fn start_workers(&mut self, count: usize) {
        for _ in 0..count {
            let worker = CheckWorker::new(
                self.queue.clone(),
                self.orchestrator.clone(),
                self.poll_interval,
            );
            let handle = tokio::spawn(async move {
                worker.run().await;
            });
            self.handles.push(handle);
        }

        let scheduler = JobScheduler::new(self.repository.clone(), self.maintenance_interval);
        self.handles.push(scheduler.start());

        info!("Started {} check workers", count);
    }

    /// 正在运行的后台任务数
    pub fn running(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// 停止所有后台任务
    ///
    /// 被中断的任务保持 active，锁过期后由维护任务放回队列。
    pub fn shutdown(&mut self) {
        info!("Shutting down workers...");
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Workers shut down successfully");
    }

    /// 等待关闭信号并关闭工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        self.shutdown();
    }
}
