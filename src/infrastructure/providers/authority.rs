// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::settings::ProviderSettings;
use crate::domain::metrics::provider::{
    AuthorityReading, MetricProvider, ProviderError, ProviderKind, ProviderReading,
};
use crate::infrastructure::providers::{non_empty, read_json, trim_base_url};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IndexItemResponse {
    code: String,
    #[serde(default)]
    error_message: String,
    data_tables: Option<DataTables>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DataTables {
    results: ResultsTable,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResultsTable {
    #[serde(default)]
    data: Vec<IndexItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IndexItem {
    #[serde(default)]
    ext_back_links: i64,
    #[serde(default)]
    ref_domains: i64,
    #[serde(default)]
    citation_flow: i32,
    #[serde(default)]
    trust_flow: i32,
    #[serde(default)]
    result_code: Option<String>,
}

/// 外链权重提供方
///
/// 调用 `GetIndexItemInfo` 获取外链数、引用域数和两项流量分，负值表示未知。
pub struct AuthorityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl AuthorityProvider {
    pub fn new(client: reqwest::Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            base_url: trim_base_url(&settings.base_url),
            api_key: non_empty(&settings.api_key),
        }
    }
}

fn known<T: PartialOrd + Default>(value: T) -> Option<T> {
    (value >= T::default()).then_some(value)
}

#[async_trait]
impl MetricProvider for AuthorityProvider {
    fn name(&self) -> &'static str {
        "authority"
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
            .get(&self.base_url)
            .query(&[
                ("app_api_key", api_key),
                ("cmd", "GetIndexItemInfo"),
                ("items", "1"),
                ("item0", domain),
                ("datasource", "fresh"),
            ])
            .send()
            .await?;

        let body: IndexItemResponse = read_json(response).await?;
        if body.code != "OK" {
            return Err(ProviderError::Malformed(format!(
                "{}: {}",
                body.code, body.error_message
            )));
        }

        let item = body
            .data_tables
            .and_then(|tables| tables.results.data.into_iter().next())
            .ok_or(ProviderError::NoData)?;
        if item.result_code.as_deref() == Some("DoesNotExist") {
            return Err(ProviderError::NoData);
        }

        Ok(ProviderReading::Authority(AuthorityReading {
            backlinks: known(item.ext_back_links),
            referring_domains: known(item.ref_domains),
            citation_flow: known(item.citation_flow),
            trust_flow: known(item.trust_flow),
        }))
    }
}
