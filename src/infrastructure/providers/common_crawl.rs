// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;

use crate::config::settings::ProviderSettings;
use crate::domain::metrics::provider::{
    IndexCountReading, MetricProvider, ProviderError, ProviderKind, ProviderReading,
};
use crate::infrastructure::providers::{read_body, trim_base_url};

/// 公开网页索引的收录页数
///
/// 查询 CDX 接口，每行一条捕获记录，计数上限为 `limit`。
pub struct CommonCrawlProvider {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    limit: u32,
}

impl CommonCrawlProvider {
    pub fn new(
        client: reqwest::Client,
        settings: &ProviderSettings,
        collection: impl Into<String>,
        limit: u32,
    ) -> Self {
        Self {
            client,
            base_url: trim_base_url(&settings.base_url),
            collection: collection.into(),
            limit: limit.max(1),
        }
    }
}

#[async_trait]
impl MetricProvider for CommonCrawlProvider {
    fn name(&self) -> &'static str {
        "common_crawl"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Freeform
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch(&self, domain: &str) -> Result<ProviderReading, ProviderError> {
        let url = format!("{}/{}-index", self.base_url, self.collection);
        let limit = self.limit.to_string();
        let pattern = format!("{}/*", domain);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("url", pattern.as_str()),
                ("output", "json"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let body = read_body(response).await?;
        let pages = body
            .lines()
            .filter(|line| line.trim_start().starts_with('{'))
            .count()
            .min(self.limit as usize) as i64;

        Ok(ProviderReading::IndexCount(IndexCountReading { pages }))
    }
}
