// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::lookup::dns::DnsFields;
use crate::domain::lookup::whois::WhoisFields;
use crate::domain::metrics::provider::MetricsReport;
use crate::domain::models::domain::{Domain, DomainStatus, MetricsSummary, Protocol};
use crate::domain::models::domain_metric::DomainMetric;
use crate::domain::services::availability_resolver::Verdict;
use crate::domain::services::liveness_checker::PageMeta;
use crate::domain::services::pipeline_orchestrator::DetachedCheck;

/// 同步检查报告
///
/// 尽力而为的结果，网络失败只体现在 `errors` 中。
#[derive(Debug, Serialize)]
pub struct CheckReportDto {
    pub domain: String,
    pub status: DomainStatus,
    pub available: bool,
    pub http_status: u16,
    pub protocol: Protocol,
    pub title: Option<String>,
    #[serde(skip_serializing_if = "PageMeta::is_empty")]
    pub meta: PageMeta,
    pub verdict: Verdict,
    pub nameservers: Vec<String>,
    pub whois: Option<WhoisFields>,
    pub dns: Option<DnsFields>,
    /// 各提供方的原始结果
    pub metrics: Option<MetricsReport>,
    /// 按优先级折叠后的汇总值
    pub summary: Option<MetricsSummary>,
    pub errors: Vec<String>,
}

impl CheckReportDto {
    /// 由一次不落库检查构造报告
    ///
    /// # 参数
    ///
    /// * `domain` - 规范化后的域名
    /// * `check` - 检查结果
    pub fn from_detached(domain: String, check: DetachedCheck) -> Self {
        let DetachedCheck {
            availability,
            metrics,
            record,
            errors,
        } = check;

        Self {
            domain,
            status: record.domain.status,
            available: availability.available,
            http_status: availability.http_status,
            protocol: availability.protocol,
            title: availability.title,
            meta: availability.meta,
            verdict: availability.verdict,
            nameservers: record.domain.nameservers,
            whois: availability.whois,
            dns: availability.dns,
            metrics,
            summary: record.metrics.map(|m| m.summary),
            errors,
        }
    }
}

/// 批量检查中单个域名的粗分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchItemState {
    /// 站点返回 200
    Active,
    /// 其他情况
    Dead,
}

/// 批量检查中单个域名的结果
#[derive(Debug, Serialize)]
pub struct BatchCheckItemDto {
    pub state: BatchItemState,
    #[serde(flatten)]
    pub report: CheckReportDto,
}

impl From<CheckReportDto> for BatchCheckItemDto {
    fn from(report: CheckReportDto) -> Self {
        let state = if report.http_status == 200 {
            BatchItemState::Active
        } else {
            BatchItemState::Dead
        };
        Self { state, report }
    }
}

/// 批量检查中无法检查的输入
#[derive(Debug, Serialize)]
pub struct BatchCheckErrorDto {
    pub domain: String,
    pub error: String,
}

/// 同步批量检查报告
#[derive(Debug, Default, Serialize)]
pub struct BatchCheckReportDto {
    pub total: usize,
    pub active: usize,
    pub dead: usize,
    pub errors: usize,
    pub results: Vec<BatchCheckItemDto>,
    pub error_details: Vec<BatchCheckErrorDto>,
}

/// 入队响应
#[derive(Debug, Default, Serialize)]
pub struct EnqueueResponseDto {
    pub queued_count: usize,
    pub job_ids: Vec<Uuid>,
    /// 请求中不存在的域名ID
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<Uuid>,
}

/// 域名详情
#[derive(Debug, Serialize)]
pub struct DomainDetailDto {
    #[serde(flatten)]
    pub domain: Domain,
    pub metric: Option<DomainMetric>,
}

/// 缓存失效响应
#[derive(Debug, Serialize)]
pub struct CacheInvalidationDto {
    pub domain: String,
    pub invalidated: usize,
}
