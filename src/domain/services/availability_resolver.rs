// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::settings::AvailabilitySettings;
use crate::domain::lookup::dns::{DnsError, DnsFields, DnsLookup};
use crate::domain::lookup::whois::{WhoisError, WhoisFields, WhoisLookup};
use crate::domain::models::domain::Protocol;
use crate::domain::services::liveness_checker::{LivenessResult, PageMeta};
use crate::infrastructure::cache::cache_layer::{CacheLayer, DNS_NAMESPACE, WHOIS_NAMESPACE};

/// 可用性判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// 站点返回 200
    LiveSite,
    /// 没有 HTTP 响应且没有任何 DNS 记录
    Unregistered,
    /// 有 DNS 记录或有非 200 响应，但站点不可用
    OccupiedUnreachable,
    /// 没有 HTTP 响应且 DNS 查询失败，无法判断
    Ambiguous,
}

/// 可用性判定结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityResult {
    pub available: bool,
    pub http_status: u16,
    pub protocol: Protocol,
    pub title: Option<String>,
    pub meta: PageMeta,
    pub verdict: Verdict,
    pub whois: Option<WhoisFields>,
    pub dns: Option<DnsFields>,
    /// 降级处理的查询失败
    pub errors: Vec<String>,
}

impl AvailabilityResult {
    /// 只根据存活结果给出判定，用于查询阶段整体超时的情况
    ///
    /// 没有 DNS 信号时无法区分未注册与查询失败，无响应按 `Ambiguous` 处理。
    pub fn from_liveness_only(liveness: &LivenessResult, error: impl Into<String>) -> Self {
        let verdict = match liveness.http_status {
            200 => Verdict::LiveSite,
            0 => Verdict::Ambiguous,
            _ => Verdict::OccupiedUnreachable,
        };
        Self {
            available: false,
            http_status: liveness.http_status,
            protocol: liveness.protocol,
            title: liveness.title.clone(),
            meta: liveness.meta.clone(),
            verdict,
            whois: None,
            dns: None,
            errors: vec![error.into()],
        }
    }

    /// 解析到的第一个 IPv4 地址
    pub fn ip_address(&self) -> Option<String> {
        self.dns.as_ref().and_then(|dns| dns.ipv4.first().cloned())
    }
}

/// 可用性判定配置
#[derive(Debug, Clone, Default)]
pub struct AvailabilityConfig {
    /// 站点不可达但有 DNS 记录时也查询 WHOIS
    pub whois_for_unreachable: bool,
}

impl From<&AvailabilitySettings> for AvailabilityConfig {
    fn from(settings: &AvailabilitySettings) -> Self {
        Self {
            whois_for_unreachable: settings.whois_for_unreachable,
        }
    }
}

/// 可用性判定服务
///
/// 结合存活探测结果与 DNS、WHOIS 查询给出判定。
/// DNS 和 WHOIS 的成功结果按域名缓存，失败和不完整的 DNS 结果不缓存。
pub struct AvailabilityResolver {
    dns: Arc<dyn DnsLookup>,
    whois: Arc<dyn WhoisLookup>,
    cache: CacheLayer,
    config: AvailabilityConfig,
}

impl AvailabilityResolver {
    /// 创建可用性判定服务
    ///
    /// # 参数
    ///
    /// * `dns` - DNS 查询实现
    /// * `whois` - WHOIS 查询实现
    /// * `cache` - 共享缓存层
    /// * `config` - 判定配置
    pub fn new(
        dns: Arc<dyn DnsLookup>,
        whois: Arc<dyn WhoisLookup>,
        cache: CacheLayer,
        config: AvailabilityConfig,
    ) -> Self {
        Self {
            dns,
            whois,
            cache,
            config,
        }
    }

    /// 判定域名可用性
    ///
    /// # 参数
    ///
    /// * `domain` - 规范化后的域名
    /// * `liveness` - 存活探测结果
    ///
    /// # 返回值
    ///
    /// 判定结果。查询失败不会返回错误，只会体现在判定和 `errors` 中
    pub async fn resolve(&self, domain: &str, liveness: &LivenessResult) -> AvailabilityResult {
        let mut errors = Vec::new();
        let dns = match self.lookup_dns(domain).await {
            Ok(fields) => Some(fields),
            Err(e) => {
                warn!("DNS lookup for {} failed: {}", domain, e);
                errors.push(format!("dns: {}", e));
                None
            }
        };
        let has_records = dns.as_ref().is_some_and(DnsFields::has_records);

        let verdict = match (liveness.http_status, &dns) {
            (200, _) => Verdict::LiveSite,
            (0, Some(_)) if !has_records => Verdict::Unregistered,
            (0, None) => Verdict::Ambiguous,
            _ => Verdict::OccupiedUnreachable,
        };

        let wants_whois = has_records
            && match verdict {
                Verdict::LiveSite => true,
                Verdict::OccupiedUnreachable => self.config.whois_for_unreachable,
                _ => false,
            };
        let whois = if wants_whois {
            match self.lookup_whois(domain).await {
                Ok(fields) => Some(fields),
                Err(e) => {
                    warn!("WHOIS lookup for {} failed: {}", domain, e);
                    errors.push(format!("whois: {}", e));
                    None
                }
            }
        } else {
            None
        };

        debug!("{} resolved as {:?}", domain, verdict);
        AvailabilityResult {
            available: verdict == Verdict::Unregistered,
            http_status: liveness.http_status,
            protocol: liveness.protocol,
            title: liveness.title.clone(),
            meta: liveness.meta.clone(),
            verdict,
            whois,
            dns,
            errors,
        }
    }

    async fn lookup_dns(&self, domain: &str) -> Result<DnsFields, DnsError> {
        let key = CacheLayer::key(DNS_NAMESPACE, domain);
        self.cache
            .get_or_try_compute_where(
                &key,
                self.cache.ttls().dns,
                |fields: &DnsFields| !fields.partial,
                || self.dns.lookup(domain),
            )
            .await
    }

    async fn lookup_whois(&self, domain: &str) -> Result<WhoisFields, WhoisError> {
        let key = CacheLayer::key(WHOIS_NAMESPACE, domain);
        self.cache
            .get_or_try_compute(&key, self.cache.ttls().whois, || self.whois.lookup(domain))
            .await
    }
}

#[cfg(test)]
#[path = "availability_resolver_test.rs"]
mod tests;
