// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// DNS 查询错误
///
/// 只表示查询本身失败，"没有记录"不是错误。
#[derive(Error, Debug, Clone)]
pub enum DnsError {
    #[error("DNS lookup timed out")]
    Timeout,
    #[error("DNS resolver error: {0}")]
    Resolver(String),
}

/// DNS 记录集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsFields {
    pub nameservers: Vec<String>,
    pub ipv4: Vec<String>,
    pub mx: Vec<String>,
    pub txt: Vec<String>,
    /// 部分记录类型查询失败，结果可能不完整
    #[serde(default)]
    pub partial: bool,
}

impl DnsFields {
    /// 是否存在任意一条记录
    pub fn has_records(&self) -> bool {
        !(self.nameservers.is_empty()
            && self.ipv4.is_empty()
            && self.mx.is_empty()
            && self.txt.is_empty())
    }
}

/// DNS 查询接口
///
/// 查询 NS/A/MX/TXT 记录。没有任何记录时返回空的 `DnsFields`。
#[async_trait]
pub trait DnsLookup: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<DnsFields, DnsError>;
}

#[async_trait]
impl<T: DnsLookup + ?Sized> DnsLookup for Arc<T> {
    async fn lookup(&self, domain: &str) -> Result<DnsFields, DnsError> {
        (**self).lookup(domain).await
    }
}
