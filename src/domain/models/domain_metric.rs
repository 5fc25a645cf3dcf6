// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::domain::MetricsSource;

/// 域名指标记录
///
/// 与域名一对一，按 `domain_id` 整体覆盖写入。
/// 每个字段独立可空，空值表示提供方不可用而不是零。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainMetric {
    pub id: Uuid,
    pub domain_id: Uuid,

    // 权重/外链来源
    pub authority_backlinks: Option<i64>,
    pub authority_referring_domains: Option<i64>,
    pub authority_citation_flow: Option<i32>,
    pub authority_trust_flow: Option<i32>,

    // 收录数来源
    pub index_page_count: Option<i64>,

    // 引用指数来源
    pub citation_index: Option<i64>,
    pub citation_indexed_pages: Option<i64>,
    pub citation_backlinks: Option<i64>,

    // 存档年龄来源
    pub archive_first_capture: Option<DateTime<FixedOffset>>,
    pub archive_age_days: Option<i64>,

    // 社交信号来源
    pub social_likes: Option<i64>,

    // 排名估计来源
    pub rank_domain_authority: Option<f64>,
    pub rank_page_authority: Option<f64>,
    pub rank_global: Option<i64>,
    pub rank_semrush: Option<i64>,
    pub rank_backlinks: Option<i64>,

    pub source: MetricsSource,
    pub checked_at: DateTime<FixedOffset>,
}

impl DomainMetric {
    /// 创建一条全部为空的指标记录
    pub fn empty(domain_id: Uuid, checked_at: DateTime<FixedOffset>) -> Self {
        Self {
            id: Uuid::new_v4(),
            domain_id,
            authority_backlinks: None,
            authority_referring_domains: None,
            authority_citation_flow: None,
            authority_trust_flow: None,
            index_page_count: None,
            citation_index: None,
            citation_indexed_pages: None,
            citation_backlinks: None,
            archive_first_capture: None,
            archive_age_days: None,
            social_likes: None,
            rank_domain_authority: None,
            rank_page_authority: None,
            rank_global: None,
            rank_semrush: None,
            rank_backlinks: None,
            source: MetricsSource::Unavailable,
            checked_at,
        }
    }

    /// 比较指标内容，忽略记录ID与时间戳
    pub fn same_values(&self, other: &DomainMetric) -> bool {
        let mut left = self.clone();
        left.id = other.id;
        left.checked_at = other.checked_at;
        left == *other
    }
}
