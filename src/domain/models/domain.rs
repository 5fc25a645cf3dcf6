// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::lookup::whois::WhoisFields;
use crate::domain::services::domain_normalizer;

/// 域名实体
///
/// 流水线的基本工作单元。由外部发现流程创建，
/// 之后只由流水线各阶段修改，流水线从不删除域名。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    /// 域名唯一标识符
    pub id: Uuid,
    /// 所属项目ID
    pub project_id: Uuid,
    /// 来源关键词ID
    pub keyword_id: Option<Uuid>,
    /// 规范化后的域名，项目内唯一
    pub name: String,
    /// 生命周期状态
    pub status: DomainStatus,
    /// 是否可注册
    pub available: bool,
    /// 最近一次HTTP状态码，0表示无响应
    pub http_status_code: Option<i32>,
    /// 探测成功时使用的协议
    pub protocol: Protocol,
    /// 解析到的IPv4地址
    pub ip_address: Option<String>,
    /// 页面标题
    pub title: Option<String>,
    /// WHOIS 注册商
    pub registrar: Option<String>,
    /// WHOIS 注册时间
    pub registered_at: Option<DateTime<FixedOffset>>,
    /// WHOIS 更新时间
    pub registry_updated_at: Option<DateTime<FixedOffset>>,
    /// WHOIS 到期时间
    pub expires_at: Option<DateTime<FixedOffset>>,
    /// 最多三个域名服务器
    pub nameservers: Vec<String>,
    /// 汇总外链数
    pub backlink_count: Option<i64>,
    /// 汇总引用域数
    pub referring_domains: Option<i64>,
    /// 汇总权重分
    pub domain_authority: Option<f64>,
    /// 汇总收录页数
    pub indexed_pages: Option<i64>,
    /// 指标最近检查时间
    pub metrics_checked_at: Option<DateTime<FixedOffset>>,
    /// 指标来源
    pub metrics_source: Option<MetricsSource>,
    /// 是否有任一指标可用
    pub metrics_available: bool,
    /// 状态最近检查时间
    pub checked_at: Option<DateTime<FixedOffset>>,
    /// 最近一次HTTP探测时间
    pub last_http_check: Option<DateTime<FixedOffset>>,
    /// 存档发现来源信息
    pub archive: ArchiveProvenance,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// 存档发现来源信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveProvenance {
    pub first_captured: Option<DateTime<FixedOffset>>,
    pub last_captured: Option<DateTime<FixedOffset>>,
    pub capture_count: i32,
    pub webpage_count: i32,
    pub image_count: i32,
    pub video_count: i32,
    pub audio_count: i32,
}

/// 域名生命周期状态
///
/// new → checking → {available | occupied | dead | in_work}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    #[default]
    New,
    Checking,
    Available,
    Occupied,
    Dead,
    InWork,
}

impl DomainStatus {
    /// 是否为检查结束后的状态
    pub fn is_concluded(&self) -> bool {
        matches!(
            self,
            DomainStatus::Available | DomainStatus::Occupied | DomainStatus::Dead | DomainStatus::InWork
        )
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DomainStatus::New => write!(f, "new"),
            DomainStatus::Checking => write!(f, "checking"),
            DomainStatus::Available => write!(f, "available"),
            DomainStatus::Occupied => write!(f, "occupied"),
            DomainStatus::Dead => write!(f, "dead"),
            DomainStatus::InWork => write!(f, "in_work"),
        }
    }
}

impl FromStr for DomainStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(DomainStatus::New),
            "checking" => Ok(DomainStatus::Checking),
            "available" => Ok(DomainStatus::Available),
            "occupied" => Ok(DomainStatus::Occupied),
            "dead" => Ok(DomainStatus::Dead),
            "in_work" => Ok(DomainStatus::InWork),
            _ => Err(()),
        }
    }
}

/// 探测协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Https,
    Http,
    #[default]
    Unknown,
}

impl Protocol {
    /// 另一种协议，Unknown 没有备用协议
    pub fn alternate(&self) -> Option<Protocol> {
        match self {
            Protocol::Https => Some(Protocol::Http),
            Protocol::Http => Some(Protocol::Https),
            Protocol::Unknown => None,
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Https => "https",
            Protocol::Http => "http",
            Protocol::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.scheme())
    }
}

impl FromStr for Protocol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "https" => Ok(Protocol::Https),
            "http" => Ok(Protocol::Http),
            "unknown" => Ok(Protocol::Unknown),
            _ => Err(()),
        }
    }
}

/// 指标数据来源标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsSource {
    /// 需要凭据的付费接口
    CredentialedApi,
    /// 免费接口或页面抓取
    FreeformScrape,
    /// 两者皆有
    Mixed,
    /// 没有任何提供方返回数据
    #[serde(rename = "none")]
    Unavailable,
}

impl fmt::Display for MetricsSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MetricsSource::CredentialedApi => write!(f, "credentialed_api"),
            MetricsSource::FreeformScrape => write!(f, "freeform_scrape"),
            MetricsSource::Mixed => write!(f, "mixed"),
            MetricsSource::Unavailable => write!(f, "none"),
        }
    }
}

impl FromStr for MetricsSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credentialed_api" => Ok(MetricsSource::CredentialedApi),
            "freeform_scrape" => Ok(MetricsSource::FreeformScrape),
            "mixed" => Ok(MetricsSource::Mixed),
            "none" => Ok(MetricsSource::Unavailable),
            _ => Err(()),
        }
    }
}

/// 可用性阶段写入的字段组
///
/// 每次检查整体覆盖，未查询的 WHOIS 字段写为空。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityUpdate {
    pub status: DomainStatus,
    pub available: bool,
    pub http_status_code: Option<i32>,
    pub protocol: Protocol,
    pub ip_address: Option<String>,
    pub title: Option<String>,
    pub whois: WhoisFields,
    pub nameservers: Vec<String>,
    pub checked_at: DateTime<FixedOffset>,
}

/// 指标阶段写入域名表的汇总字段组
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub backlink_count: Option<i64>,
    pub referring_domains: Option<i64>,
    pub domain_authority: Option<f64>,
    pub indexed_pages: Option<i64>,
    pub metrics_source: MetricsSource,
    pub metrics_available: bool,
    pub metrics_checked_at: DateTime<FixedOffset>,
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 状态转换不符合生命周期规则
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: DomainStatus, to: DomainStatus },

    /// 更新违反实体不变量
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// 输入校验失败
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl Domain {
    /// 创建一个新发现的域名
    ///
    /// # 参数
    ///
    /// * `project_id` - 所属项目ID
    /// * `raw_name` - 原始域名字符串，会先做规范化
    pub fn new(project_id: Uuid, raw_name: &str) -> Self {
        let now: DateTime<FixedOffset> = Utc::now().into();
        Self {
            id: Uuid::new_v4(),
            project_id,
            keyword_id: None,
            name: domain_normalizer::normalize(raw_name),
            status: DomainStatus::New,
            available: false,
            http_status_code: None,
            protocol: Protocol::Unknown,
            ip_address: None,
            title: None,
            registrar: None,
            registered_at: None,
            registry_updated_at: None,
            expires_at: None,
            nameservers: Vec::new(),
            backlink_count: None,
            referring_domains: None,
            domain_authority: None,
            indexed_pages: None,
            metrics_checked_at: None,
            metrics_source: None,
            metrics_available: false,
            checked_at: None,
            last_http_check: None,
            archive: ArchiveProvenance::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 进入检查状态
    ///
    /// 任何状态都可以重新检查，包括上一次运行中断后残留的 checking。
    pub fn begin_check(&mut self) {
        self.status = DomainStatus::Checking;
        self.updated_at = Utc::now().into();
    }

    /// 结束检查并应用可用性字段组
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 转换成功
    /// * `Err(DomainError)` - 当前不在 checking 状态或更新违反不变量
    pub fn conclude(&mut self, update: &AvailabilityUpdate) -> Result<(), DomainError> {
        if self.status != DomainStatus::Checking || !update.status.is_concluded() {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: update.status,
            });
        }
        check_invariants(update)?;

        self.status = update.status;
        self.available = update.available;
        self.http_status_code = update.http_status_code;
        self.protocol = update.protocol;
        self.ip_address = update.ip_address.clone();
        self.title = update.title.clone();
        self.registrar = update.whois.registrar.clone();
        self.registered_at = update.whois.created_at;
        self.registry_updated_at = update.whois.updated_at;
        self.expires_at = update.whois.expires_at;
        self.nameservers = update.nameservers.clone();
        self.checked_at = Some(update.checked_at);
        self.last_http_check = Some(update.checked_at);
        self.updated_at = update.checked_at;
        Ok(())
    }

    /// 关键阶段重试耗尽后标记为死亡
    ///
    /// 清除上一次检查留下的页面字段，WHOIS 与指标字段组保持不变。
    pub fn mark_dead(&mut self, now: DateTime<FixedOffset>) {
        self.status = DomainStatus::Dead;
        self.available = false;
        self.http_status_code = Some(0);
        self.protocol = Protocol::Unknown;
        self.title = None;
        self.checked_at = Some(now);
        self.updated_at = now;
    }

    /// 应用指标汇总字段组
    pub fn apply_metrics(&mut self, summary: &MetricsSummary) {
        self.backlink_count = summary.backlink_count;
        self.referring_domains = summary.referring_domains;
        self.domain_authority = summary.domain_authority;
        self.indexed_pages = summary.indexed_pages;
        self.metrics_source = Some(summary.metrics_source);
        self.metrics_available = summary.metrics_available;
        self.metrics_checked_at = Some(summary.metrics_checked_at);
    }
}

/// 校验可用性更新是否满足实体不变量
pub fn check_invariants(update: &AvailabilityUpdate) -> Result<(), DomainError> {
    if update.status == DomainStatus::Dead && !matches!(update.http_status_code, None | Some(0)) {
        return Err(DomainError::InvariantViolation(format!(
            "dead domain cannot carry http status {:?}",
            update.http_status_code
        )));
    }
    if update.status == DomainStatus::Available && !update.available {
        return Err(DomainError::InvariantViolation(
            "available status requires available flag".to_string(),
        ));
    }
    if update.nameservers.len() > 3 {
        return Err(DomainError::InvariantViolation(format!(
            "at most 3 nameservers are stored, got {}",
            update.nameservers.len()
        )));
    }
    Ok(())
}
