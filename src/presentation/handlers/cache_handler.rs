// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::application::use_cases::domain_check_use_case::DomainCheckUseCase;
use crate::presentation::errors::AppError;

/// 删除某个域名的全部缓存
pub async fn invalidate_domain(
    Extension(use_case): Extension<Arc<DomainCheckUseCase>>,
    Path(domain): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = use_case.invalidate_cache(&domain).await?;
    Ok(Json(result))
}
