// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info};

use crate::domain::repositories::check_job_repository::CheckJobRepository;

/// 队列维护调度器
///
/// 任务的获取由工作器通过 `acquire_next` 主动拉取，
/// 这里只负责把锁已过期的活动任务放回队列。
pub struct JobScheduler<R: CheckJobRepository + 'static> {
    /// 任务仓库
    repository: Arc<R>,
    /// 维护间隔
    interval: Duration,
}

impl<R: CheckJobRepository + 'static> JobScheduler<R> {
    /// 创建新的维护调度器实例
    ///
    /// # 参数
    ///
    /// * `repository` - 任务仓库
    /// * `interval` - 维护间隔
    pub fn new(repository: Arc<R>, interval: Duration) -> Self {
        Self {
            repository,
            interval,
        }
    }

    /// 执行一次维护
    ///
    /// # 返回值
    ///
    /// 被放回队列的任务数，出错时为 0
    pub async fn run_maintenance(&self) -> u64 {
        match self.repository.reset_stuck_jobs().await {
            Ok(count) => {
                if count > 0 {
                    info!("Reset {} stuck jobs", count);
                }
                count
            }
            Err(e) => {
                error!("Failed to reset stuck jobs: {}", e);
                0
            }
        }
    }

    /// 启动调度器后台任务
    ///
    /// # 返回值
    ///
    /// 返回后台任务的句柄
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.interval);

            loop {
                ticker.tick().await;
                self.run_maintenance().await;
                debug!("Scheduler maintenance tick");
            }
        })
    }
}
