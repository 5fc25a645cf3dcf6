// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::domain::services::pipeline_orchestrator::PipelineError;
use crate::queue::job_queue::QueueError;

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("队列错误: {0}")]
    QueueError(#[from] QueueError),

    #[error("流水线错误: {0}")]
    PipelineError(#[from] PipelineError),
}
