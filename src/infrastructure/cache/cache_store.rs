// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::infrastructure::cache::redis_client::RedisClient;

/// 缓存后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// 进程内缓存
    #[default]
    Memory,
    /// Redis缓存
    Redis,
}

/// 缓存后端接口
///
/// 值统一以序列化后的字符串存储，过期条目视为不存在。
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 获取缓存值
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 设置缓存值，每次写入都重新计算过期时间
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// 删除缓存值
    async fn delete(&self, key: &str) -> Result<()>;

    /// 后端名称
    fn name(&self) -> &'static str;
}

/// 缓存条目
struct CacheEntry {
    data: String,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn new(data: String, ttl: Duration) -> Self {
        Self {
            data,
            created_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

/// 进程内缓存
pub struct MemoryCacheStore {
    cache: DashMap<String, CacheEntry>,
    max_entries: usize,
}

impl MemoryCacheStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            cache: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn evict_if_needed(&self) {
        if self.cache.len() <= self.max_entries {
            return;
        }

        // 先淘汰过期条目
        let before = self.cache.len();
        self.cache.retain(|_, entry| !entry.is_expired());

        // 仍然超出时淘汰最旧的条目
        let overflow = self.cache.len().saturating_sub(self.max_entries);
        if overflow > 0 {
            let mut entries: Vec<(String, Instant)> = self
                .cache
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().created_at))
                .collect();
            entries.sort_by_key(|(_, created_at)| *created_at);
            for (key, _) in entries.into_iter().take(overflow) {
                self.cache.remove(&key);
            }
        }

        let evicted = before.saturating_sub(self.cache.len()) as u64;
        counter!("cache_evictions_total").increment(evicted);
        debug!("Evicted {} entries from memory cache", evicted);
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let expired = match self.cache.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.data.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.cache.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.cache.insert(key.to_string(), CacheEntry::new(value, ttl));
        self.evict_if_needed();
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Redis缓存
pub struct RedisCacheStore {
    redis_client: RedisClient,
    prefix: String,
}

impl RedisCacheStore {
    pub fn new(redis_client: RedisClient, prefix: impl Into<String>) -> Self {
        Self {
            redis_client,
            prefix: prefix.into(),
        }
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.redis_client.get(&self.cache_key(key)).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        // SET EX 不接受 0 秒
        let ttl_seconds = ttl.as_secs().max(1);
        self.redis_client
            .set(&self.cache_key(key), &value, ttl_seconds)
            .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.redis_client.delete(&self.cache_key(key)).await
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
