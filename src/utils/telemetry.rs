// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// 从 `LOG_FORMAT` 取值解析，未知取值按普通文本处理
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// 初始化日志订阅器
///
/// 过滤规则读取 `RUST_LOG`，默认 `info,domainrs=debug`
pub fn init_telemetry() {
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,domainrs=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
