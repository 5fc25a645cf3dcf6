// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::settings::ProviderSettings;
use crate::domain::metrics::provider::{
    MetricProvider, ProviderError, ProviderKind, ProviderReading, RankReading,
};
use crate::infrastructure::providers::{non_empty, read_json, trim_base_url};

#[derive(Debug, Deserialize)]
struct DomainResponse {
    metrics: Option<RankMetrics>,
}

#[derive(Debug, Deserialize)]
struct RankMetrics {
    da: Option<f64>,
    pa: Option<f64>,
    alexa_rank: Option<i64>,
    semrush_rank: Option<i64>,
    backlinks: Option<i64>,
}

/// 排名估计提供方
pub struct SeoRankProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SeoRankProvider {
    pub fn new(client: reqwest::Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            base_url: trim_base_url(&settings.base_url),
            api_key: non_empty(&settings.api_key),
        }
    }
}

#[async_trait]
impl MetricProvider for SeoRankProvider {
    fn name(&self) -> &'static str {
        "seo_rank"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Credentialed
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, domain: &str) -> Result<ProviderReading, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;

        let response = self
            .client
            .get(format!("{}/domain/{}", self.base_url, domain))
            .bearer_auth(api_key)
            .send()
            .await?;

        let body: DomainResponse = read_json(response).await?;
        let metrics = body.metrics.ok_or(ProviderError::NoData)?;

        Ok(ProviderReading::Rank(RankReading {
            domain_authority: metrics.da,
            page_authority: metrics.pa,
            global_rank: metrics.alexa_rank,
            semrush_rank: metrics.semrush_rank,
            backlinks: metrics.backlinks,
        }))
    }
}
