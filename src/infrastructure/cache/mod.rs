// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 缓存模块
///
/// 提供带TTL的缓存层及其进程内、Redis两种后端
pub mod cache_layer;
pub mod cache_store;
pub mod redis_client;
