// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::DbErr;
use thiserror::Error;

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层基于 SeaORM 提供。
///
/// 包含的仓库接口：
/// - 域名仓库（domain_repository）：域名实体及其按阶段划分的字段组
/// - 指标仓库（domain_metric_repository）：按域名覆盖写入的指标记录
/// - 检查任务仓库（check_job_repository）：持久化队列
pub mod check_job_repository;
pub mod domain_metric_repository;
pub mod domain_repository;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 存储的数据无法映射回领域模型
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}
