// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含域名检查流水线的各个阶段，以及把它们串起来的编排器。
///
/// 包含的服务：
/// - 域名规范化（domain_normalizer）：把原始输入整理为规范域名
/// - 存活探测（liveness_checker）：HTTP 可达性与状态码
/// - 可用性判定（availability_resolver）：DNS 与 WHOIS 的短路策略
/// - 合并策略（merge_policy）：把各阶段结果合成一条更新记录
/// - 流水线编排（pipeline_orchestrator）：阶段超时、重试与落库
pub mod availability_resolver;
pub mod domain_normalizer;
pub mod liveness_checker;
pub mod merge_policy;
pub mod pipeline_orchestrator;
