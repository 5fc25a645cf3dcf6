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

use crate::engines::traits::{HttpProbe, ProbeError, ProbeRequest, ProbeResponse};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Instant;

/// 基于reqwest的HTTP探测引擎
///
/// 不跟随重定向，接受无效证书：这里只判断站点是否应答。
pub struct ReqwestProbe {
    client: reqwest::Client,
}

impl ReqwestProbe {
    /// 创建探测引擎
    ///
    /// # 参数
    ///
    /// * `user_agent` - 请求使用的 User-Agent
    ///
    /// # 返回值
    ///
    /// * `Ok(ReqwestProbe)` - 探测引擎
    /// * `Err(ProbeError)` - HTTP 客户端构建失败
    pub fn new(user_agent: &str) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::none())
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn probe(&self, request: &ProbeRequest) -> Result<ProbeResponse, ProbeError> {
        let start = Instant::now();
        let response = self
            .client
            .get(&request.url)
            .timeout(request.timeout)
            .send()
            .await?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        // Body read failures keep the status code
        let body = if request.read_body && status_code == 200 {
            response.text().await.ok()
        } else {
            None
        };

        Ok(ProbeResponse {
            status_code,
            content_type,
            body,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
