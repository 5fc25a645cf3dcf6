// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::settings::LivenessSettings;
use crate::domain::models::domain::Protocol;
use crate::engines::traits::{HttpProbe, ProbeError, ProbeRequest};
use crate::infrastructure::cache::cache_layer::{CacheLayer, LIVENESS_NAMESPACE};

/// 标题最多保留的字符数
const MAX_TITLE_CHARS: usize = 512;
/// meta 内容最多保留的字符数
const MAX_META_CHARS: usize = 1024;

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static OG_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static DESCRIPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static KEYWORDS_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="keywords"]"#).unwrap());
static OG_DESCRIPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:description"]"#).unwrap());

/// 页面 meta 标签
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub og_description: Option<String>,
}

impl PageMeta {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.keywords.is_none() && self.og_description.is_none()
    }
}

/// 存活探测结果
///
/// `http_status` 为 0 表示两种协议都没有收到任何 HTTP 响应。
/// 标题和 meta 只在 200 的 HTML 响应中提取。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessResult {
    pub http_status: u16,
    pub protocol: Protocol,
    pub title: Option<String>,
    #[serde(default)]
    pub meta: PageMeta,
}

impl LivenessResult {
    pub fn unreachable() -> Self {
        Self {
            http_status: 0,
            protocol: Protocol::Unknown,
            title: None,
            meta: PageMeta::default(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.http_status == 200
    }
}

/// 存活探测配置
#[derive(Debug, Clone)]
pub struct LivenessConfig {
    /// 单次请求超时
    pub timeout: Duration,
    /// 首选协议失败后等待多久再试备用协议
    pub retry_delay: Duration,
    /// 首选 HTTPS
    pub prefer_https: bool,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retry_delay: Duration::from_millis(250),
            prefer_https: true,
        }
    }
}

impl From<&LivenessSettings> for LivenessConfig {
    fn from(settings: &LivenessSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_secs),
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            prefer_https: settings.prefer_https,
        }
    }
}

/// 存活探测服务
///
/// 先用首选协议请求站点根路径，没有任何响应时等待一段时间再换另一种协议。
/// 不跟随重定向，3xx 原样记录。结果按域名缓存。
pub struct LivenessChecker {
    probe: Arc<dyn HttpProbe>,
    cache: CacheLayer,
    config: LivenessConfig,
}

impl LivenessChecker {
    /// 创建存活探测服务
    ///
    /// # 参数
    ///
    /// * `probe` - HTTP 探测引擎
    /// * `cache` - 共享缓存层
    /// * `config` - 探测配置
    pub fn new(probe: Arc<dyn HttpProbe>, cache: CacheLayer, config: LivenessConfig) -> Self {
        Self {
            probe,
            cache,
            config,
        }
    }

    /// 探测域名是否存活
    ///
    /// # 参数
    ///
    /// * `domain` - 规范化后的域名
    ///
    /// # 返回值
    ///
    /// 探测结果，从不返回错误，网络失败表现为状态码 0
    pub async fn check(&self, domain: &str) -> LivenessResult {
        let key = CacheLayer::key(LIVENESS_NAMESPACE, domain);
        self.cache
            .get_or_compute(&key, self.cache.ttls().liveness, || self.probe_domain(domain))
            .await
    }

    async fn probe_domain(&self, domain: &str) -> LivenessResult {
        let primary = if self.config.prefer_https {
            Protocol::Https
        } else {
            Protocol::Http
        };

        let primary_error = match self.attempt(domain, primary).await {
            Ok(result) => return result,
            Err(e) => e,
        };
        debug!("{} over {} failed: {}", domain, primary, primary_error);

        let Some(alternate) = primary.alternate() else {
            return LivenessResult::unreachable();
        };
        tokio::time::sleep(self.config.retry_delay).await;

        match self.attempt(domain, alternate).await {
            Ok(result) => result,
            Err(e) => {
                info!("{} is unreachable over both protocols: {}", domain, e);
                LivenessResult::unreachable()
            }
        }
    }

    async fn attempt(&self, domain: &str, protocol: Protocol) -> Result<LivenessResult, ProbeError> {
        let request = ProbeRequest {
            url: format!("{}://{}/", protocol.scheme(), domain),
            timeout: self.config.timeout,
            read_body: true,
        };
        let response = self.probe.probe(&request).await?;
        debug!(
            "{} answered {} over {} in {}ms",
            domain, response.status_code, protocol, response.response_time_ms
        );

        let (title, meta) = match response.body.as_deref() {
            Some(body) if response.status_code == 200 && response.is_html() => parse_page(body),
            _ => (None, PageMeta::default()),
        };

        Ok(LivenessResult {
            http_status: response.status_code,
            protocol,
            title,
            meta,
        })
    }
}

/// 从 HTML 中提取页面标题和 meta 标签
///
/// `<title>` 为空时标题退回到 `og:title`。
pub fn parse_page(html: &str) -> (Option<String>, PageMeta) {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|element| element.text().collect::<String>())
        .and_then(|raw| collapse(&raw, MAX_TITLE_CHARS))
        .or_else(|| meta_content(&document, &OG_TITLE_SELECTOR, MAX_TITLE_CHARS));

    let meta = PageMeta {
        description: meta_content(&document, &DESCRIPTION_SELECTOR, MAX_META_CHARS),
        keywords: meta_content(&document, &KEYWORDS_SELECTOR, MAX_META_CHARS),
        og_description: meta_content(&document, &OG_DESCRIPTION_SELECTOR, MAX_META_CHARS),
    };
    (title, meta)
}

fn meta_content(document: &Html, selector: &Selector, max_chars: usize) -> Option<String> {
    document
        .select(selector)
        .find_map(|element| element.value().attr("content"))
        .and_then(|content| collapse(content, max_chars))
}

fn collapse(raw: &str, max_chars: usize) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    Some(collapsed.chars().take(max_chars).collect())
}

#[cfg(test)]
#[path = "liveness_checker_test.rs"]
mod tests;
