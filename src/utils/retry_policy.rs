// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use crate::config::settings::RetrySettings;

/// 退避增长方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffGrowth {
    /// initial * 2^(n-1)
    Exponential,
    /// initial * n
    Linear,
}

/// 重试策略配置
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 初始退避时间
    pub initial_backoff: Duration,
    /// 最大退避时间
    pub max_backoff: Duration,
    /// 退避增长方式
    pub growth: BackoffGrowth,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::full_check()
    }
}

impl RetryPolicy {
    /// 完整检查任务的重试策略：60 秒起倍增，上限 300 秒，最多 3 次
    pub fn full_check() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(60),
            max_backoff: Duration::from_secs(300),
            growth: BackoffGrowth::Exponential,
        }
    }

    /// 指标任务的重试策略：300、600、900 秒，最多 3 次
    pub fn metrics() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(300),
            max_backoff: Duration::from_secs(900),
            growth: BackoffGrowth::Linear,
        }
    }

    /// 从配置创建重试策略
    ///
    /// 未知的增长方式按指数处理
    pub fn from_settings(settings: &RetrySettings) -> Self {
        let growth = match settings.growth.to_ascii_lowercase().as_str() {
            "linear" => BackoffGrowth::Linear,
            _ => BackoffGrowth::Exponential,
        };
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: Duration::from_secs(settings.initial_backoff_secs),
            max_backoff: Duration::from_secs(settings.max_backoff_secs),
            growth,
        }
    }

    /// 计算第 `failures` 次失败之后的退避时间
    ///
    /// # 参数
    ///
    /// * `failures` - 已失败次数，从 1 开始
    pub fn calculate_backoff(&self, failures: u32) -> Duration {
        let step = failures.max(1);
        let backoff_secs = match self.growth {
            BackoffGrowth::Exponential => {
                self.initial_backoff.as_secs_f64() * 2f64.powi(step as i32 - 1)
            }
            BackoffGrowth::Linear => self.initial_backoff.as_secs_f64() * step as f64,
        };

        // 限制最大退避时间
        Duration::from_secs_f64(backoff_secs.min(self.max_backoff.as_secs_f64()))
    }
}
