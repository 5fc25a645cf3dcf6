// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// 指标提供方错误
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProviderError {
    /// 缺少凭据
    #[error("Provider is not configured")]
    NotConfigured,
    /// 提供方正常响应但没有该域名的数据
    #[error("Provider has no data for domain")]
    NoData,
    /// 当日调用预算已用完
    #[error("Daily call budget exhausted")]
    BudgetExhausted,
    /// 短时限流
    #[error("Rate limited")]
    RateLimited,
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 非预期的HTTP状态码
    #[error("Unexpected HTTP status {0}")]
    Http(u16),
    /// 响应格式错误
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// 网络错误
    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// 判断错误是否为瞬时错误，稍后重试可能成功
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout | ProviderError::RateLimited | ProviderError::Network(_) => true,
            ProviderError::Http(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// 提供方类别，决定合并记录的来源标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// 需要凭据的接口
    Credentialed,
    /// 免费接口或页面抓取
    Freeform,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorityReading {
    pub backlinks: Option<i64>,
    pub referring_domains: Option<i64>,
    pub citation_flow: Option<i32>,
    pub trust_flow: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexCountReading {
    pub pages: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationReading {
    pub citation_index: Option<i64>,
    pub indexed_pages: Option<i64>,
    pub backlinks: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveAgeReading {
    pub first_capture: DateTime<FixedOffset>,
    pub age_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialReading {
    pub likes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankReading {
    pub domain_authority: Option<f64>,
    pub page_authority: Option<f64>,
    pub global_rank: Option<i64>,
    pub semrush_rank: Option<i64>,
    pub backlinks: Option<i64>,
}

/// 各提供方的读数，每个提供方一个变体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderReading {
    Authority(AuthorityReading),
    IndexCount(IndexCountReading),
    Citation(CitationReading),
    ArchiveAge(ArchiveAgeReading),
    Social(SocialReading),
    Rank(RankReading),
}

/// 没有值的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentReason {
    NotConfigured,
    NoData,
    BudgetExhausted,
}

/// 单个提供方的调用结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ProviderOutcome {
    Value(ProviderReading),
    Absent(AbsentReason),
    Failed(ProviderError),
}

impl ProviderOutcome {
    /// 将提供方调用结果折叠为结果类型
    pub fn from_result(result: Result<ProviderReading, ProviderError>) -> Self {
        match result {
            Ok(reading) => ProviderOutcome::Value(reading),
            Err(ProviderError::NotConfigured) => ProviderOutcome::Absent(AbsentReason::NotConfigured),
            Err(ProviderError::NoData) => ProviderOutcome::Absent(AbsentReason::NoData),
            Err(ProviderError::BudgetExhausted) => {
                ProviderOutcome::Absent(AbsentReason::BudgetExhausted)
            }
            Err(e) => ProviderOutcome::Failed(e),
        }
    }

    pub fn reading(&self) -> Option<&ProviderReading> {
        match self {
            ProviderOutcome::Value(reading) => Some(reading),
            _ => None,
        }
    }

    /// 指标名，用于日志和监控标签
    pub fn label(&self) -> &'static str {
        match self {
            ProviderOutcome::Value(_) => "value",
            ProviderOutcome::Absent(_) => "absent",
            ProviderOutcome::Failed(_) => "failed",
        }
    }
}

/// 一次聚合的全部结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsReport {
    pub outcomes: BTreeMap<String, ProviderOutcome>,
    /// 每个提供方的类别
    #[serde(skip)]
    pub kinds: BTreeMap<String, ProviderKind>,
}

impl MetricsReport {
    pub fn insert(&mut self, name: &str, kind: ProviderKind, outcome: ProviderOutcome) {
        self.outcomes.insert(name.to_string(), outcome);
        self.kinds.insert(name.to_string(), kind);
    }

    pub fn get(&self, name: &str) -> Option<&ProviderOutcome> {
        self.outcomes.get(name)
    }

    /// 所有成功的读数及其提供方类别
    pub fn readings(&self) -> impl Iterator<Item = (&ProviderReading, ProviderKind)> + '_ {
        self.outcomes.iter().filter_map(|(name, outcome)| {
            let kind = self.kinds.get(name).copied().unwrap_or(ProviderKind::Freeform);
            outcome.reading().map(|reading| (reading, kind))
        })
    }

    pub fn has_values(&self) -> bool {
        self.outcomes
            .values()
            .any(|outcome| matches!(outcome, ProviderOutcome::Value(_)))
    }

    /// 没有任何值且至少一个提供方瞬时失败，值得稍后整体重试
    pub fn needs_retry(&self) -> bool {
        !self.has_values()
            && self.outcomes.values().any(|outcome| {
                matches!(outcome, ProviderOutcome::Failed(e) if e.is_transient())
            })
    }
}

/// SEO 指标提供方接口
#[async_trait]
pub trait MetricProvider: Send + Sync {
    /// 提供方名称，同时作为缓存命名空间
    fn name(&self) -> &'static str;

    fn kind(&self) -> ProviderKind;

    /// 是否已配置所需凭据
    fn is_configured(&self) -> bool;

    /// 获取单个域名的读数
    async fn fetch(&self, domain: &str) -> Result<ProviderReading, ProviderError>;
}

#[async_trait]
impl<T: MetricProvider + ?Sized> MetricProvider for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn kind(&self) -> ProviderKind {
        (**self).kind()
    }

    fn is_configured(&self) -> bool {
        (**self).is_configured()
    }

    async fn fetch(&self, domain: &str) -> Result<ProviderReading, ProviderError> {
        (**self).fetch(domain).await
    }
}
