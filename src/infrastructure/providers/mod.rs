// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// SEO 指标提供方实现
///
/// 每个提供方一个文件，由聚合器统一调度，
/// 预算与限流在 `budget` 中实现
pub mod aggregator;
pub mod authority;
pub mod budget;
pub mod citation;
pub mod common_crawl;
pub mod factory;
pub mod seo_rank;
pub mod social;
pub mod web_archive;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::domain::metrics::provider::ProviderError;

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if let Some(status) = e.status() {
            ProviderError::Http(status.as_u16())
        } else if e.is_decode() {
            ProviderError::Malformed(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// 检查响应状态并读取正文
///
/// 404 视为没有数据，429 视为限流
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    match status {
        StatusCode::NOT_FOUND => Err(ProviderError::NoData),
        StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimited),
        s if !s.is_success() => Err(ProviderError::Http(s.as_u16())),
        _ => Ok(response.text().await?),
    }
}

/// 检查响应状态并解析 JSON 正文
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let body = read_body(response).await?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

/// 去掉配置中 URL 末尾的斜杠
pub(crate) fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// 空白字符串的凭据视为未配置
pub(crate) fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
