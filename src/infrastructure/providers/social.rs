// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::settings::ProviderSettings;
use crate::domain::metrics::provider::{
    MetricProvider, ProviderError, ProviderKind, ProviderReading, SocialReading,
};
use crate::infrastructure::providers::{non_empty, read_json, trim_base_url};

const OG_FIELDS: &str = "og_object{likes.summary(total_count).limit(0)}";

#[derive(Debug, Deserialize)]
struct GraphResponse {
    og_object: Option<OgObject>,
}

#[derive(Debug, Deserialize)]
struct OgObject {
    likes: Option<Likes>,
}

#[derive(Debug, Deserialize)]
struct Likes {
    summary: LikesSummary,
}

#[derive(Debug, Deserialize)]
struct LikesSummary {
    total_count: i64,
}

/// 社交信号提供方
///
/// 使用 `app_id|app_secret` 应用令牌查询站点首页的点赞数。
pub struct SocialProvider {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl SocialProvider {
    pub fn new(client: reqwest::Client, settings: &ProviderSettings) -> Self {
        let access_token = match (non_empty(&settings.app_id), non_empty(&settings.app_secret)) {
            (Some(id), Some(secret)) => Some(format!("{}|{}", id, secret)),
            _ => None,
        };
        Self {
            client,
            base_url: trim_base_url(&settings.base_url),
            access_token,
        }
    }
}

#[async_trait]
impl MetricProvider for SocialProvider {
    fn name(&self) -> &'static str {
        "social"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Credentialed
    }

    fn is_configured(&self) -> bool {
        self.access_token.is_some()
    }

    async fn fetch(&self, domain: &str) -> Result<ProviderReading, ProviderError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(ProviderError::NotConfigured)?;
        let id = format!("https://{}", domain);

        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[("id", id.as_str()), ("fields", OG_FIELDS), ("access_token", token)])
            .send()
            .await?;

        let body: GraphResponse = read_json(response).await?;
        let likes = body
            .og_object
            .and_then(|og| og.likes)
            .map(|likes| likes.summary.total_count)
            .ok_or(ProviderError::NoData)?;

        Ok(ProviderReading::Social(SocialReading { likes }))
    }
}
