// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::settings::ProviderSettings;
use crate::domain::metrics::provider::{
    CitationReading, MetricProvider, ProviderError, ProviderKind, ProviderReading,
};
use crate::infrastructure::providers::{non_empty, read_json, trim_base_url};

#[derive(Debug, Deserialize)]
struct TicResponse {
    tic: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: Option<i64>,
}

/// 引用指数提供方
///
/// 引用指数是主读数，缺失时整体视为无数据；收录数和外链数是附带读数，
/// 各自失败只置空对应字段。
pub struct CitationProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CitationProvider {
    pub fn new(client: reqwest::Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            base_url: trim_base_url(&settings.base_url),
            api_key: non_empty(&settings.api_key),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        domain: &str,
        api_key: &str,
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/{}", self.base_url, endpoint))
            .query(&[("domain", domain), ("key", api_key)])
            .send()
            .await?;
        read_json(response).await
    }

    async fn optional_count(&self, endpoint: &str, domain: &str, api_key: &str) -> Option<i64> {
        match self.get::<CountResponse>(endpoint, domain, api_key).await {
            Ok(body) => body.count,
            Err(e) => {
                debug!("Citation {} lookup for {} failed: {}", endpoint, domain, e);
                None
            }
        }
    }
}

#[async_trait]
impl MetricProvider for CitationProvider {
    fn name(&self) -> &'static str {
        "citation"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Credentialed
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, domain: &str) -> Result<ProviderReading, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;

        let tic: TicResponse = self.get("tic", domain, api_key).await?;
        let citation_index = tic.tic.ok_or(ProviderError::NoData)?;

        let (indexed_pages, backlinks) = tokio::join!(
            self.optional_count("index", domain, api_key),
            self.optional_count("backlinks", domain, api_key),
        );

        Ok(ProviderReading::Citation(CitationReading {
            citation_index: Some(citation_index),
            indexed_pages,
            backlinks,
        }))
    }
}
