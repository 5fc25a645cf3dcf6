// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::future::join_all;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::metrics::provider::{
    MetricProvider, MetricsReport, ProviderError, ProviderOutcome, ProviderReading,
};
use crate::infrastructure::cache::cache_layer::CacheLayer;
use crate::infrastructure::providers::budget::ProviderBudget;

/// 多来源指标聚合器
///
/// 所有提供方并发调用，每个调用单独限时，互不影响。
pub struct MetricsAggregator {
    providers: Vec<Arc<dyn MetricProvider>>,
    cache: CacheLayer,
    budget: Arc<ProviderBudget>,
    timeout: Duration,
}

impl MetricsAggregator {
    /// 创建聚合器
    ///
    /// # 参数
    ///
    /// * `providers` - 提供方列表
    /// * `cache` - 共享缓存层，成功读数按提供方名称缓存
    /// * `budget` - 调用预算
    /// * `timeout` - 单个提供方调用超时
    pub fn new(
        providers: Vec<Arc<dyn MetricProvider>>,
        cache: CacheLayer,
        budget: Arc<ProviderBudget>,
        timeout: Duration,
    ) -> Self {
        Self {
            providers,
            cache,
            budget,
            timeout,
        }
    }

    /// 提供方名称，同时也是它们的缓存命名空间
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// 从所有提供方获取指标
    ///
    /// # 参数
    ///
    /// * `domain` - 规范化后的域名
    ///
    /// # 返回值
    ///
    /// 每个提供方一条结果，提供方之间的失败相互隔离
    pub async fn fetch_all(&self, domain: &str) -> MetricsReport {
        let futures = self.providers.iter().map(|provider| {
            let provider = provider.clone();
            async move {
                let outcome = self.fetch_one(provider.as_ref(), domain).await;
                (provider, outcome)
            }
        });

        let mut report = MetricsReport::default();
        for (provider, outcome) in join_all(futures).await {
            counter!(
                "provider_calls_total",
                "provider" => provider.name(),
                "outcome" => outcome.label()
            )
            .increment(1);
            report.insert(provider.name(), provider.kind(), outcome);
        }

        info!(
            "Collected metrics for {}: {} of {} providers returned values",
            domain,
            report.readings().count(),
            self.providers.len()
        );
        report
    }

    async fn fetch_one(&self, provider: &dyn MetricProvider, domain: &str) -> ProviderOutcome {
        let name = provider.name();
        if !provider.is_configured() {
            debug!("Provider {} is not configured, skipping", name);
            return ProviderOutcome::from_result(Err(ProviderError::NotConfigured));
        }

        let key = CacheLayer::key(name, domain);
        let result: Result<ProviderReading, ProviderError> = self
            .cache
            .get_or_try_compute(&key, self.cache.ttls().provider, || async {
                self.budget.acquire(name).await?;
                tokio::time::timeout(self.timeout, provider.fetch(domain))
                    .await
                    .map_err(|_| ProviderError::Timeout)?
            })
            .await;

        match &result {
            Err(e @ ProviderError::Malformed(_)) => {
                warn!("Provider {} returned a malformed response for {}: {}", name, domain, e)
            }
            Err(e) => debug!("Provider {} gave no value for {}: {}", name, domain, e),
            Ok(_) => debug!("Provider {} returned a value for {}", name, domain),
        }
        ProviderOutcome::from_result(result)
    }
}
