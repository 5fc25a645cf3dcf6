// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 请求处理器模块
pub mod cache_handler;
pub mod domain_handler;
