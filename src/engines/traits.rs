// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// 探测错误类型
///
/// 只表示传输层失败，任何 HTTP 状态码（包括 4xx/5xx）都是有效结果。
#[derive(Error, Debug)]
pub enum ProbeError {
    /// 连接失败
    #[error("Connection failed: {0}")]
    Connect(String),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 其他请求错误
    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProbeError::Timeout
        } else if e.is_connect() {
            ProbeError::Connect(e.to_string())
        } else {
            ProbeError::Request(e.to_string())
        }
    }
}

/// 探测请求
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    /// 目标URL
    pub url: String,
    /// 超时时间
    pub timeout: Duration,
    /// 是否读取响应正文
    pub read_body: bool,
}

/// 探测响应
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    /// HTTP状态码
    pub status_code: u16,
    /// 内容类型
    pub content_type: Option<String>,
    /// 响应正文，仅在请求要求且状态为 200 时读取
    pub body: Option<String>,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
}

impl ProbeResponse {
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("html"))
    }
}

/// HTTP 探测特质
#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// 发送一次请求，不跟随重定向
    async fn probe(&self, request: &ProbeRequest) -> Result<ProbeResponse, ProbeError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: HttpProbe + ?Sized> HttpProbe for Arc<T> {
    async fn probe(&self, request: &ProbeRequest) -> Result<ProbeResponse, ProbeError> {
        (**self).probe(request).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
