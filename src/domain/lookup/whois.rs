// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// WHOIS 查询错误
#[derive(Error, Debug, Clone)]
pub enum WhoisError {
    #[error("WHOIS {0} timed out")]
    Timeout(&'static str),
    #[error("WHOIS network error: {0}")]
    Network(String),
    #[error("No WHOIS server for TLD: {0}")]
    UnsupportedTld(String),
    #[error("Malformed WHOIS response: {0}")]
    Malformed(String),
}

/// WHOIS 注册信息
///
/// 任一字段都可能为空，查询失败时整体为空。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoisFields {
    pub registrar: Option<String>,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub expires_at: Option<DateTime<FixedOffset>>,
    pub nameservers: Vec<String>,
    /// 注册局明确回复未注册
    pub unregistered: bool,
}

impl WhoisFields {
    pub fn is_empty(&self) -> bool {
        self.registrar.is_none()
            && self.created_at.is_none()
            && self.updated_at.is_none()
            && self.expires_at.is_none()
            && self.nameservers.is_empty()
    }
}

/// WHOIS 查询接口
#[async_trait]
pub trait WhoisLookup: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<WhoisFields, WhoisError>;
}

#[async_trait]
impl<T: WhoisLookup + ?Sized> WhoisLookup for Arc<T> {
    async fn lookup(&self, domain: &str) -> Result<WhoisFields, WhoisError> {
        (**self).lookup(domain).await
    }
}
