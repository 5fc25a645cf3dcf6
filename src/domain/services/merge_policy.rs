// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use crate::domain::metrics::provider::{MetricsReport, ProviderKind, ProviderReading};
use crate::domain::models::domain::{AvailabilityUpdate, DomainStatus, MetricsSource, MetricsSummary};
use crate::domain::models::domain_metric::DomainMetric;
use crate::domain::services::availability_resolver::{AvailabilityResult, Verdict};

/// 域名表最多保存的域名服务器数量
pub const MAX_NAMESERVERS: usize = 3;

/// 指标阶段的写入内容
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsUpdate {
    /// 域名表上的汇总字段
    pub summary: MetricsSummary,
    /// 按来源分组的完整指标记录
    pub metric: DomainMetric,
}

/// 一次检查合并后的全部写入内容
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRecord {
    pub domain: AvailabilityUpdate,
    pub metrics: Option<MetricsUpdate>,
}

/// 合并策略
///
/// 把各阶段结果合成一条更新记录。可用性阶段的字段对重叠概念总是优先，
/// 汇总指标按固定的优先级表从各来源中选取。
#[derive(Debug, Clone)]
pub struct MergePolicy {
    unresolvable_status: DomainStatus,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::new(DomainStatus::Dead)
    }
}

impl MergePolicy {
    /// 创建合并策略
    ///
    /// # 参数
    ///
    /// * `unresolvable_status` - 无响应且无 DNS 记录时使用的状态，`dead` 或 `available`
    pub fn new(unresolvable_status: DomainStatus) -> Self {
        let unresolvable_status = match unresolvable_status {
            DomainStatus::Available => DomainStatus::Available,
            _ => DomainStatus::Dead,
        };
        Self {
            unresolvable_status,
        }
    }

    /// 判定对应的生命周期状态
    pub fn status_for(&self, verdict: Verdict) -> DomainStatus {
        match verdict {
            Verdict::LiveSite | Verdict::OccupiedUnreachable => DomainStatus::Occupied,
            Verdict::Unregistered => self.unresolvable_status,
            Verdict::Ambiguous => DomainStatus::InWork,
        }
    }

    /// 合并全部阶段结果
    ///
    /// # 参数
    ///
    /// * `domain_id` - 域名ID，指标记录以它为键
    /// * `availability` - 可用性阶段结果
    /// * `metrics` - 指标阶段结果，未运行时为空
    /// * `now` - 本次检查时间
    pub fn merge(
        &self,
        domain_id: Uuid,
        availability: &AvailabilityResult,
        metrics: Option<&MetricsReport>,
        now: DateTime<FixedOffset>,
    ) -> UpdateRecord {
        UpdateRecord {
            domain: self.merge_availability(availability, now),
            metrics: metrics.map(|report| self.merge_metrics(domain_id, report, now)),
        }
    }

    /// 生成可用性字段组
    pub fn merge_availability(
        &self,
        availability: &AvailabilityResult,
        now: DateTime<FixedOffset>,
    ) -> AvailabilityUpdate {
        let whois = availability.whois.clone().unwrap_or_default();

        let dns_nameservers = availability
            .dns
            .as_ref()
            .map(|dns| dns.nameservers.as_slice())
            .unwrap_or_default();
        let nameservers = if dns_nameservers.is_empty() {
            whois.nameservers.as_slice()
        } else {
            dns_nameservers
        };
        let nameservers = clean_nameservers(nameservers);

        AvailabilityUpdate {
            status: self.status_for(availability.verdict),
            available: availability.available,
            http_status_code: Some(availability.http_status as i32),
            protocol: availability.protocol,
            ip_address: availability.ip_address(),
            title: availability.title.clone(),
            whois,
            nameservers,
            checked_at: now,
        }
    }

    /// 生成指标记录与汇总字段组
    pub fn merge_metrics(
        &self,
        domain_id: Uuid,
        report: &MetricsReport,
        now: DateTime<FixedOffset>,
    ) -> MetricsUpdate {
        let mut metric = DomainMetric::empty(domain_id, now);
        let mut kinds = Vec::new();

        for (reading, kind) in report.readings() {
            kinds.push(kind);
            match reading {
                ProviderReading::Authority(r) => {
                    metric.authority_backlinks = r.backlinks;
                    metric.authority_referring_domains = r.referring_domains;
                    metric.authority_citation_flow = r.citation_flow;
                    metric.authority_trust_flow = r.trust_flow;
                }
                ProviderReading::IndexCount(r) => metric.index_page_count = Some(r.pages),
                ProviderReading::Citation(r) => {
                    metric.citation_index = r.citation_index;
                    metric.citation_indexed_pages = r.indexed_pages;
                    metric.citation_backlinks = r.backlinks;
                }
                ProviderReading::ArchiveAge(r) => {
                    metric.archive_first_capture = Some(r.first_capture);
                    metric.archive_age_days = Some(r.age_days);
                }
                ProviderReading::Social(r) => metric.social_likes = Some(r.likes),
                ProviderReading::Rank(r) => {
                    metric.rank_domain_authority = r.domain_authority;
                    metric.rank_page_authority = r.page_authority;
                    metric.rank_global = r.global_rank;
                    metric.rank_semrush = r.semrush_rank;
                    metric.rank_backlinks = r.backlinks;
                }
            }
        }
        metric.source = source_tag(&kinds);

        let summary = MetricsSummary {
            backlink_count: metric
                .authority_backlinks
                .or(metric.rank_backlinks)
                .or(metric.citation_backlinks),
            referring_domains: metric.authority_referring_domains,
            domain_authority: metric
                .rank_domain_authority
                .or(metric.authority_trust_flow.map(f64::from)),
            indexed_pages: metric.index_page_count.or(metric.citation_indexed_pages),
            metrics_source: metric.source,
            metrics_available: !kinds.is_empty(),
            metrics_checked_at: now,
        };

        MetricsUpdate { summary, metric }
    }
}

fn source_tag(kinds: &[ProviderKind]) -> MetricsSource {
    let credentialed = kinds.contains(&ProviderKind::Credentialed);
    let freeform = kinds.contains(&ProviderKind::Freeform);
    match (credentialed, freeform) {
        (true, true) => MetricsSource::Mixed,
        (true, false) => MetricsSource::CredentialedApi,
        (false, true) => MetricsSource::FreeformScrape,
        (false, false) => MetricsSource::Unavailable,
    }
}

fn clean_nameservers(nameservers: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(MAX_NAMESERVERS);
    for ns in nameservers {
        let ns = ns.trim().trim_end_matches('.').to_ascii_lowercase();
        if ns.is_empty() || cleaned.contains(&ns) {
            continue;
        }
        cleaned.push(ns);
        if cleaned.len() == MAX_NAMESERVERS {
            break;
        }
    }
    cleaned
}
