// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// DNS 与 WHOIS 查询实现
pub mod dns_resolver;
pub mod whois_client;
