// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：域名、指标记录与检查任务
/// - 外部查询接口（lookup）：DNS 与 WHOIS 的抽象契约
/// - 指标接口（metrics）：SEO 指标提供方契约与读数类型
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：流水线各阶段与编排器
///
/// 领域层只依赖抽象接口，具体实现由基础设施层注入。
pub mod lookup;
pub mod metrics;
pub mod models;
pub mod repositories;
pub mod services;
