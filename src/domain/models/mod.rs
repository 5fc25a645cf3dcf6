// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 域名（domain）：流水线的工作单元及其生命周期状态
/// - 域名指标（domain_metric）：按来源分组的SEO指标记录
/// - 检查任务（check_job）：持久化队列中的一次流水线运行
pub mod check_job;
pub mod domain;
pub mod domain_metric;
