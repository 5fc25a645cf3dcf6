// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供检查任务的后台处理和工作器生命周期管理
pub mod check_worker;
pub mod manager;
