// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// SEO 指标领域模块
///
/// 定义指标提供方接口、各提供方读数类型和调用结果类型
pub mod provider;
