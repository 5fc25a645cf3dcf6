// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use metrics::counter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::settings::CacheSettings;
use crate::infrastructure::cache::cache_store::{CacheStore, MemoryCacheStore};

/// 存活探测缓存命名空间
pub const LIVENESS_NAMESPACE: &str = "liveness";
/// DNS 缓存命名空间
pub const DNS_NAMESPACE: &str = "dns";
/// WHOIS 缓存命名空间
pub const WHOIS_NAMESPACE: &str = "whois";

/// 各命名空间的缓存时长
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub liveness: Duration,
    pub dns: Duration,
    pub whois: Duration,
    pub provider: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            liveness: Duration::from_secs(60 * 60),
            dns: Duration::from_secs(24 * 60 * 60),
            whois: Duration::from_secs(7 * 24 * 60 * 60),
            provider: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

impl From<&CacheSettings> for CacheTtls {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            liveness: Duration::from_secs(settings.liveness_ttl_secs),
            dns: Duration::from_secs(settings.dns_ttl_secs),
            whois: Duration::from_secs(settings.whois_ttl_secs),
            provider: Duration::from_secs(settings.provider_ttl_secs),
        }
    }
}

/// 带TTL的键值缓存层
///
/// 显式构造后传入各个外部调用封装。不保证并发未命中时只计算一次，
/// 两次计算都会写入，后写者生效。后端故障按未命中处理，不影响调用方。
#[derive(Clone)]
pub struct CacheLayer {
    store: Arc<dyn CacheStore>,
    ttls: CacheTtls,
}

impl CacheLayer {
    /// 创建缓存层
    ///
    /// # 参数
    ///
    /// * `store` - 缓存后端
    /// * `ttls` - 各命名空间的缓存时长
    pub fn new(store: Arc<dyn CacheStore>, ttls: CacheTtls) -> Self {
        Self { store, ttls }
    }

    /// 创建使用进程内后端的缓存层
    pub fn in_memory(ttls: CacheTtls) -> Self {
        Self::new(Arc::new(MemoryCacheStore::new(100_000)), ttls)
    }

    pub fn ttls(&self) -> &CacheTtls {
        &self.ttls
    }

    /// 由命名空间和规范化域名构造缓存键
    pub fn key(namespace: &str, domain: &str) -> String {
        format!("{}:{}", namespace, domain)
    }

    /// 获取缓存值，未命中时计算并写入
    ///
    /// # 参数
    ///
    /// * `key` - 缓存键
    /// * `ttl` - 写入时使用的过期时间
    /// * `compute` - 未命中时执行的计算
    ///
    /// # 返回值
    ///
    /// 缓存中的值或新计算的值
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(value) = self.lookup(key).await {
            return value;
        }

        let value = compute().await;
        self.store_value(key, &value, ttl).await;
        value
    }

    /// 获取缓存值，未命中时计算，仅缓存成功结果
    pub async fn get_or_try_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get_or_try_compute_where(key, ttl, |_| true, compute)
            .await
    }

    /// 同 `get_or_try_compute`，成功结果还要满足 `cacheable` 才写入
    pub async fn get_or_try_compute_where<T, E, P, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        cacheable: P,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        P: FnOnce(&T) -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.lookup(key).await {
            return Ok(value);
        }

        let value = compute().await?;
        if cacheable(&value) {
            self.store_value(key, &value, ttl).await;
        } else {
            debug!("Not caching incomplete value for {}", key);
        }
        Ok(value)
    }

    /// 删除单个缓存键
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        self.store.delete(key).await?;
        debug!("Invalidated cache key {}", key);
        Ok(())
    }

    /// 删除某个域名在所有给定命名空间下的缓存
    pub async fn invalidate_domain<'a, I>(&self, domain: &str, namespaces: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut count = 0;
        for namespace in namespaces {
            self.invalidate(&Self::key(namespace, domain)).await?;
            count += 1;
        }
        Ok(count)
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let namespace = namespace_of(key);
        let raw = match self.store.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cache backend {} read failed for {}: {}", self.store.name(), key, e);
                None
            }
        };

        let value = raw.and_then(|raw| match serde_json::from_str::<T>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                None
            }
        });

        let result = if value.is_some() { "hit" } else { "miss" };
        counter!("cache_requests_total", "namespace" => namespace, "result" => result).increment(1);
        value
    }

    async fn store_value<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cannot serialize cache value for {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.store.set(key, raw, ttl).await {
            warn!("Cache backend {} write failed for {}: {}", self.store.name(), key, e);
        }
    }
}

fn namespace_of(key: &str) -> String {
    key.split(':').next().unwrap_or(key).to_string()
}
