// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::presentation::handlers::{cache_handler, domain_handler};

/// 创建应用路由
///
/// 处理器依赖的用例通过 `Extension` 层注入。
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let domain_routes = Router::new()
        .route("/v1/domains", get(domain_handler::list_domains))
        .route("/v1/domains/check", post(domain_handler::check_domain))
        .route("/v1/domains/batch-check", post(domain_handler::batch_check))
        .route("/v1/domains/check-batch", post(domain_handler::enqueue_batch))
        .route("/v1/domains/{id}", get(domain_handler::get_domain))
        .route("/v1/domains/{id}/check", post(domain_handler::enqueue_check))
        .route("/v1/cache/{domain}", delete(cache_handler::invalidate_domain));

    Router::new().merge(public_routes).merge(domain_routes)
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
