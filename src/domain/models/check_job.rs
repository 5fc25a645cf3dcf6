// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 检查任务
///
/// 持久化队列中的一行，对应一个域名的一次流水线运行。
/// `attempt_count` 在出队时递增，驱动重试和退避。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckJob {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 目标域名ID
    pub domain_id: Uuid,
    /// 任务类型
    pub kind: JobKind,
    /// 任务状态
    pub status: JobStatus,
    /// 已执行次数
    pub attempt_count: i32,
    /// 最大执行次数
    pub max_attempts: i32,
    /// 最近一次失败原因
    pub last_error: Option<String>,
    /// 最早可执行时间，为空表示立即执行
    pub scheduled_at: Option<DateTime<FixedOffset>>,
    /// 持有锁的工作器
    pub lock_token: Option<Uuid>,
    /// 锁过期时间
    pub lock_expires_at: Option<DateTime<FixedOffset>>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// 任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// 完整检查：存活 → 可用性 → 指标 → 合并
    #[default]
    FullCheck,
    /// 仅重新获取指标，不改变域名状态
    MetricsOnly,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobKind::FullCheck => write!(f, "full_check"),
            JobKind::MetricsOnly => write!(f, "metrics_only"),
        }
    }
}

impl FromStr for JobKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_check" => Ok(JobKind::FullCheck),
            "metrics_only" => Ok(JobKind::MetricsOnly),
            _ => Err(()),
        }
    }
}

/// 任务状态
///
/// Queued → Active → Completed/Failed，Active 失败后可以回到 Queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Active,
    Completed,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Active => write!(f, "active"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "active" => Ok(JobStatus::Active),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(()),
        }
    }
}

impl CheckJob {
    /// 创建一个立即可执行的任务
    ///
    /// # 参数
    ///
    /// * `domain_id` - 目标域名ID
    /// * `kind` - 任务类型
    /// * `max_attempts` - 最大执行次数
    pub fn new(domain_id: Uuid, kind: JobKind, max_attempts: i32) -> Self {
        let now: DateTime<FixedOffset> = Utc::now().into();
        Self {
            id: Uuid::new_v4(),
            domain_id,
            kind,
            status: JobStatus::Queued,
            attempt_count: 0,
            max_attempts,
            last_error: None,
            scheduled_at: None,
            lock_token: None,
            lock_expires_at: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 延迟执行
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.scheduled_at = Some((Utc::now() + delay).into());
        self
    }

    /// 是否还有剩余执行次数
    pub fn can_retry(&self) -> bool {
        self.attempt_count < self.max_attempts
    }
}
