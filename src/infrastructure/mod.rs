// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，实现领域层定义的抽象接口。
///
/// 包含的子模块：
/// - 缓存（cache）：带命名空间和 TTL 的缓存层，内存或 Redis 后端
/// - 数据库（database）：数据库连接和实体映射
/// - 查询（lookup）：DNS 与 WHOIS 客户端
/// - 指标（metrics）：Prometheus 导出器
/// - 提供方（providers）：SEO 指标提供方与聚合器
/// - 仓库实现（repositories）：领域仓库接口的 SeaORM 实现
pub mod cache;
pub mod database;
pub mod lookup;
pub mod metrics;
pub mod providers;
pub mod repositories;
