// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;

static LABEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").unwrap());

/// 规范化原始域名字符串
///
/// 去掉 `http://`/`https://` 前缀和 `www.`，转为小写，
/// 去掉末尾的斜杠和空白。不会失败，格式错误的输入尽力处理后原样返回。
///
/// # 参数
///
/// * `raw` - 原始域名
///
/// # 返回值
///
/// 规范化后的域名
pub fn normalize(raw: &str) -> String {
    let mut name = raw.trim().to_lowercase();

    for scheme in ["https://", "http://"] {
        if let Some(rest) = name.strip_prefix(scheme) {
            name = rest.to_string();
            break;
        }
    }

    if let Some(rest) = name.strip_prefix("www.") {
        name = rest.to_string();
    }

    name.trim_end_matches(|c: char| c == '/' || c == '\\' || c.is_whitespace())
        .to_string()
}

/// 判断规范化后的域名是否大致合法
///
/// 至少包含一个点，每个标签由字母数字和连字符组成。
/// 允许 `host:port` 形式。
pub fn is_plausible(name: &str) -> bool {
    let host = match name.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
        Some(_) => return false,
        None => name,
    };

    if host.is_empty() || host.len() > 253 || !host.contains('.') {
        return false;
    }

    host.split('.').all(|label| LABEL_REGEX.is_match(label))
}
