// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 网络查询接口模块
///
/// 定义 DNS 与 WHOIS 查询的抽象契约，具体实现位于基础设施层
pub mod dns;
pub mod whois;
