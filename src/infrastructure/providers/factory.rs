// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::settings::{ProviderSettings, ProvidersSettings};
use crate::domain::metrics::provider::MetricProvider;
use crate::infrastructure::cache::cache_layer::CacheLayer;
use crate::infrastructure::providers::aggregator::MetricsAggregator;
use crate::infrastructure::providers::authority::AuthorityProvider;
use crate::infrastructure::providers::budget::{CallCounter, ProviderBudget};
use crate::infrastructure::providers::citation::CitationProvider;
use crate::infrastructure::providers::common_crawl::CommonCrawlProvider;
use crate::infrastructure::providers::seo_rank::SeoRankProvider;
use crate::infrastructure::providers::social::SocialProvider;
use crate::infrastructure::providers::web_archive::WebArchiveProvider;

/// 指标提供方工厂
pub struct ProviderFactory;

impl ProviderFactory {
    /// 按配置创建所有启用的提供方
    ///
    /// # 参数
    ///
    /// * `client` - 所有提供方共享的 HTTP 客户端
    /// * `settings` - 提供方配置
    pub fn create_providers(
        client: &reqwest::Client,
        settings: &ProvidersSettings,
    ) -> Vec<Arc<dyn MetricProvider>> {
        let candidates: Vec<(&ProviderSettings, Arc<dyn MetricProvider>)> = vec![
            (
                &settings.authority,
                Arc::new(AuthorityProvider::new(client.clone(), &settings.authority)) as Arc<dyn MetricProvider>,
            ),
            (
                &settings.common_crawl,
                Arc::new(CommonCrawlProvider::new(
                    client.clone(),
                    &settings.common_crawl,
                    settings.index_collection.clone(),
                    settings.index_count_limit,
                )) as Arc<dyn MetricProvider>,
            ),
            (
                &settings.citation,
                Arc::new(CitationProvider::new(client.clone(), &settings.citation)) as Arc<dyn MetricProvider>,
            ),
            (
                &settings.web_archive,
                Arc::new(WebArchiveProvider::new(client.clone(), &settings.web_archive)) as Arc<dyn MetricProvider>,
            ),
            (
                &settings.social,
                Arc::new(SocialProvider::new(client.clone(), &settings.social)) as Arc<dyn MetricProvider>,
            ),
            (
                &settings.seo_rank,
                Arc::new(SeoRankProvider::new(client.clone(), &settings.seo_rank)) as Arc<dyn MetricProvider>,
            ),
        ];

        candidates
            .into_iter()
            .filter(|(provider_settings, _)| provider_settings.enabled)
            .map(|(_, provider)| {
                info!(
                    "Registered metric provider {} (configured: {})",
                    provider.name(),
                    provider.is_configured()
                );
                provider
            })
            .collect()
    }

    /// 按配置创建调用预算，包含各提供方的独立上限
    pub fn create_budget(counter: Arc<dyn CallCounter>, settings: &ProvidersSettings) -> ProviderBudget {
        let budget = ProviderBudget::new(counter, settings.daily_budget, settings.per_minute);
        for (name, provider_settings) in [
            ("authority", &settings.authority),
            ("common_crawl", &settings.common_crawl),
            ("citation", &settings.citation),
            ("web_archive", &settings.web_archive),
            ("social", &settings.social),
            ("seo_rank", &settings.seo_rank),
        ] {
            budget.set_limits(name, provider_settings.daily_budget, provider_settings.per_minute);
        }
        budget
    }

    /// 创建完整的指标聚合器
    pub fn create_aggregator(
        client: &reqwest::Client,
        settings: &ProvidersSettings,
        cache: CacheLayer,
        counter: Arc<dyn CallCounter>,
    ) -> MetricsAggregator {
        MetricsAggregator::new(
            Self::create_providers(client, settings),
            cache,
            Arc::new(Self::create_budget(counter, settings)),
            Duration::from_secs(settings.timeout_secs),
        )
    }
}
