// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供持久化检查任务队列和队列维护功能
/// 负责任务的排队、延迟重试和卡住任务的回收
pub mod job_queue;
pub mod scheduler;
