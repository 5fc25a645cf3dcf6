// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::dto::check_request::{
    BatchCheckRequestDto, CheckRequestDto, ListDomainsQueryDto, RawBatchCheckRequestDto,
};
use crate::application::use_cases::domain_check_use_case::DomainCheckUseCase;
use crate::presentation::errors::AppError;

/// 同步检查一个原始域名
///
/// 网络失败不会变成 HTTP 错误，只会出现在报告的 `errors` 中。
pub async fn check_domain(
    Extension(use_case): Extension<Arc<DomainCheckUseCase>>,
    Json(payload): Json<CheckRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    let report = use_case.check_domain(payload).await?;
    Ok((StatusCode::OK, Json(report)))
}

/// 同步检查一批原始域名
pub async fn batch_check(
    Extension(use_case): Extension<Arc<DomainCheckUseCase>>,
    Json(payload): Json<RawBatchCheckRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    let report = use_case.batch_check(payload).await?;
    Ok((StatusCode::OK, Json(report)))
}

/// 按条件分页列出域名
pub async fn list_domains(
    Extension(use_case): Extension<Arc<DomainCheckUseCase>>,
    Query(query): Query<ListDomainsQueryDto>,
) -> Result<impl IntoResponse, AppError> {
    let page = use_case.list_domains(query).await?;
    Ok(Json(page))
}

/// 为单个域名入队完整检查
pub async fn enqueue_check(
    Extension(use_case): Extension<Arc<DomainCheckUseCase>>,
    Path(domain_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let response = use_case.enqueue_check(domain_id).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// 批量入队完整检查
pub async fn enqueue_batch(
    Extension(use_case): Extension<Arc<DomainCheckUseCase>>,
    Json(payload): Json<BatchCheckRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    let response = use_case.enqueue_batch(payload).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// 获取域名及其指标记录
pub async fn get_domain(
    Extension(use_case): Extension<Arc<DomainCheckUseCase>>,
    Path(domain_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = use_case.get_domain(domain_id).await?;
    Ok(Json(detail))
}
