// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::domain::DomainStatus;
use crate::domain::repositories::domain_repository::{DomainFilter, PageRequest, Reachability};

/// 单个批次最多触发的域名数
pub const MAX_BATCH_SIZE: u64 = 500;
/// 同步批量检查最多接受的域名数
pub const MAX_RAW_BATCH_SIZE: u64 = 100;

/// 同步检查请求
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CheckRequestDto {
    /// 原始域名，可以带协议前缀和 www
    #[validate(length(min = 1, max = 2048, message = "domain cannot be empty"))]
    pub domain: String,
}

/// 批量入队请求
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct BatchCheckRequestDto {
    #[validate(length(min = 1, max = 500, message = "domain_ids must contain 1 to 500 ids"))]
    pub domain_ids: Vec<Uuid>,
}

/// 同步批量检查请求
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RawBatchCheckRequestDto {
    #[validate(length(min = 1, max = 100, message = "domains must contain 1 to 100 names"))]
    pub domains: Vec<String>,
}

/// 域名列表查询参数
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListDomainsQueryDto {
    pub project_id: Option<Uuid>,
    pub status: Option<DomainStatus>,
    /// live：最近一次探测为 200；dead：其他
    pub reachability: Option<Reachability>,
    pub has_metrics: Option<bool>,
    #[validate(range(min = 0))]
    pub min_backlinks: Option<i64>,
    pub min_da: Option<f64>,
    pub min_pa: Option<f64>,
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 200))]
    pub per_page: Option<u64>,
}

impl ListDomainsQueryDto {
    pub fn filter(&self) -> DomainFilter {
        DomainFilter {
            project_id: self.project_id,
            status: self.status,
            reachability: self.reachability,
            has_metrics: self.has_metrics,
            min_backlinks: self.min_backlinks,
            min_domain_authority: self.min_da,
            min_page_authority: self.min_pa,
        }
    }

    pub fn page_request(&self) -> PageRequest {
        let default = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(default.page),
            self.per_page.unwrap_or(default.per_page),
        )
    }
}
