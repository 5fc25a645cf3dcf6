// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::metrics::provider::ProviderError;
use crate::infrastructure::cache::redis_client::RedisClient;

/// 计数窗口两天后过期，跨日的旧键自然消失
const COUNTER_TTL_SECONDS: i64 = 2 * 24 * 60 * 60;

/// 调用计数器
#[async_trait]
pub trait CallCounter: Send + Sync {
    /// 递增计数并返回递增后的值
    async fn increment(&self, key: &str) -> Result<u64>;
}

/// 进程内计数器
#[derive(Default)]
pub struct MemoryCallCounter {
    counts: DashMap<String, u64>,
}

impl MemoryCallCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CallCounter for MemoryCallCounter {
    async fn increment(&self, key: &str) -> Result<u64> {
        let mut entry = self.counts.entry(key.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }
}

/// Redis 计数器，多个进程共享同一预算
pub struct RedisCallCounter {
    redis_client: RedisClient,
    prefix: String,
}

impl RedisCallCounter {
    pub fn new(redis_client: RedisClient, prefix: impl Into<String>) -> Self {
        Self {
            redis_client,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl CallCounter for RedisCallCounter {
    async fn increment(&self, key: &str) -> Result<u64> {
        let value = self
            .redis_client
            .incr_with_expiry(&format!("{}:{}", self.prefix, key), COUNTER_TTL_SECONDS)
            .await?;
        Ok(value.max(0) as u64)
    }
}

/// 提供方调用预算
///
/// 每日调用上限加每分钟突发配额，超出时立即返回而不是等待。
/// 取值为 0 表示不限制。计数器故障时放行并记录警告。
pub struct ProviderBudget {
    counter: Arc<dyn CallCounter>,
    default_daily: u32,
    default_per_minute: u32,
    daily_overrides: DashMap<String, u32>,
    minute_overrides: DashMap<String, u32>,
    limiters: DashMap<String, Option<Arc<DefaultDirectRateLimiter>>>,
}

impl ProviderBudget {
    /// 创建调用预算
    ///
    /// # 参数
    ///
    /// * `counter` - 每日调用计数器
    /// * `default_daily` - 默认每日上限
    /// * `default_per_minute` - 默认每分钟配额
    pub fn new(counter: Arc<dyn CallCounter>, default_daily: u32, default_per_minute: u32) -> Self {
        Self {
            counter,
            default_daily,
            default_per_minute,
            daily_overrides: DashMap::new(),
            minute_overrides: DashMap::new(),
            limiters: DashMap::new(),
        }
    }

    /// 不限制任何调用
    pub fn unlimited() -> Self {
        Self::new(Arc::new(MemoryCallCounter::new()), 0, 0)
    }

    /// 为单个提供方设置独立的上限
    pub fn set_limits(&self, provider: &str, daily: Option<u32>, per_minute: Option<u32>) {
        if let Some(daily) = daily {
            self.daily_overrides.insert(provider.to_string(), daily);
        }
        if let Some(per_minute) = per_minute {
            self.minute_overrides.insert(provider.to_string(), per_minute);
            self.limiters.remove(provider);
        }
    }

    fn daily_limit(&self, provider: &str) -> u32 {
        self.daily_overrides
            .get(provider)
            .map(|v| *v)
            .unwrap_or(self.default_daily)
    }

    fn limiter(&self, provider: &str) -> Option<Arc<DefaultDirectRateLimiter>> {
        self.limiters
            .entry(provider.to_string())
            .or_insert_with(|| {
                let per_minute = self
                    .minute_overrides
                    .get(provider)
                    .map(|v| *v)
                    .unwrap_or(self.default_per_minute);
                NonZeroU32::new(per_minute)
                    .map(|n| Arc::new(RateLimiter::direct(Quota::per_minute(n))))
            })
            .clone()
    }

    /// 申请一次真实网络调用
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 可以调用
    /// * `Err(ProviderError::RateLimited)` - 超出每分钟配额
    /// * `Err(ProviderError::BudgetExhausted)` - 超出每日上限
    pub async fn acquire(&self, provider: &str) -> Result<(), ProviderError> {
        if let Some(limiter) = self.limiter(provider) {
            if limiter.check().is_err() {
                debug!("Provider {} hit its per-minute quota", provider);
                return Err(ProviderError::RateLimited);
            }
        }

        let daily = self.daily_limit(provider);
        if daily == 0 {
            return Ok(());
        }

        let key = format!("budget:{}:{}", provider, Utc::now().format("%Y%m%d"));
        match self.counter.increment(&key).await {
            Ok(count) if count > daily as u64 => {
                debug!("Provider {} exhausted its daily budget of {}", provider, daily);
                Err(ProviderError::BudgetExhausted)
            }
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Call counter unavailable for {}: {}", provider, e);
                Ok(())
            }
        }
    }
}
