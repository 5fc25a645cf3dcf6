// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含对外触发检查的用例实现与数据传输对象
/// 将 HTTP 层与领域服务和仓库分离
pub mod dto;
pub mod use_cases;
