// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::lookup::whois::{WhoisError, WhoisFields, WhoisLookup};

const IANA_SERVER: &str = "whois.iana.org";
const WHOIS_PORT: u16 = 43;
/// 单次回复最多读取的字节数
const MAX_RESPONSE_BYTES: u64 = 64 * 1024;

const UNREGISTERED_PATTERNS: [&str; 6] = [
    "no match",
    "not found",
    "no entries found",
    "no data found",
    "not registered",
    "available for registration",
];

const REGISTERED_PATTERNS: [&str; 3] = ["registrar:", "creation date:", "registry domain id:"];

/// WHOIS 客户端
///
/// 通过 TCP 43 端口发送一行查询并读取完整回复。
/// 整次查询（包括 IANA 转介）共用一个超时。
pub struct WhoisClient {
    timeout: Duration,
    port: u16,
    server_override: Option<String>,
}

impl WhoisClient {
    /// 创建 WHOIS 客户端
    ///
    /// # 参数
    ///
    /// * `timeout` - 整次查询的超时时间
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            port: WHOIS_PORT,
            server_override: None,
        }
    }

    /// 所有查询都发往指定服务器，不做 TLD 路由
    pub fn with_server(mut self, server: impl Into<String>, port: u16) -> Self {
        self.server_override = Some(server.into());
        self.port = port;
        self
    }

    async fn query(&self, server: &str, query: &str) -> Result<String, WhoisError> {
        let addr = format!("{}:{}", server, self.port);
        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| WhoisError::Network(format!("connect to {} failed: {}", addr, e)))?;

        stream
            .write_all(format!("{}\r\n", query).as_bytes())
            .await
            .map_err(|e| WhoisError::Network(format!("write to {} failed: {}", addr, e)))?;

        let mut buf = Vec::new();
        (&mut stream)
            .take(MAX_RESPONSE_BYTES)
            .read_to_end(&mut buf)
            .await
            .map_err(|e| WhoisError::Network(format!("read from {} failed: {}", addr, e)))?;
        if buf.len() as u64 >= MAX_RESPONSE_BYTES {
            warn!("WHOIS reply from {} truncated at {} bytes", addr, MAX_RESPONSE_BYTES);
        }

        Ok(String::from_utf8_lossy(&buf).to_string())
    }

    async fn resolve_server(&self, tld: &str) -> Result<String, WhoisError> {
        if let Some(server) = &self.server_override {
            return Ok(server.clone());
        }
        if let Some(server) = whois_server_for_tld(tld) {
            return Ok(server.to_string());
        }

        let iana = self.query(IANA_SERVER, tld).await?;
        parse_referral(&iana).ok_or_else(|| WhoisError::UnsupportedTld(tld.to_string()))
    }

    async fn lookup_host(&self, domain: &str) -> Result<WhoisFields, WhoisError> {
        let host = domain.split(':').next().unwrap_or(domain);
        let tld = host
            .rsplit('.')
            .next()
            .filter(|tld| !tld.is_empty() && *tld != host)
            .ok_or_else(|| WhoisError::UnsupportedTld(host.to_string()))?;

        let server = self.resolve_server(tld).await?;
        debug!("Querying WHOIS server {} for {}", server, host);
        let raw = self.query(&server, host).await?;

        let fields = parse_response(&raw)?;
        if !fields.unregistered && fields.is_empty() {
            warn!("WHOIS reply for {} carried no recognizable fields", host);
        }
        Ok(fields)
    }
}

#[async_trait]
impl WhoisLookup for WhoisClient {
    async fn lookup(&self, domain: &str) -> Result<WhoisFields, WhoisError> {
        timeout(self.timeout, self.lookup_host(domain))
            .await
            .map_err(|_| WhoisError::Timeout("lookup"))?
    }
}

fn whois_server_for_tld(tld: &str) -> Option<&'static str> {
    match tld {
        "com" | "net" => Some("whois.verisign-grs.com"),
        "org" => Some("whois.pir.org"),
        "info" => Some("whois.afilias.net"),
        "io" => Some("whois.nic.io"),
        "ai" => Some("whois.nic.ai"),
        "co" => Some("whois.nic.co"),
        "me" => Some("whois.nic.me"),
        "xyz" => Some("whois.nic.xyz"),
        "ru" | "su" => Some("whois.tcinet.ru"),
        _ => None,
    }
}

/// 从 IANA 回复中取出权威 WHOIS 服务器
pub(crate) fn parse_referral(iana: &str) -> Option<String> {
    find_value(iana, &["whois:"]).or_else(|| find_value(iana, &["refer:"]))
}

/// 解析 WHOIS 文本回复
pub(crate) fn parse_response(raw: &str) -> Result<WhoisFields, WhoisError> {
    if raw.trim().is_empty() {
        return Err(WhoisError::Malformed("empty response".to_string()));
    }

    let lower = raw.to_lowercase();
    let registered = REGISTERED_PATTERNS.iter().any(|p| lower.contains(p));
    if !registered && UNREGISTERED_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Ok(WhoisFields {
            unregistered: true,
            ..WhoisFields::default()
        });
    }

    Ok(WhoisFields {
        registrar: find_value(raw, &["registrar:", "registrar name:"]),
        created_at: find_value(raw, &["creation date:", "created:"]).and_then(|v| parse_date(&v)),
        updated_at: find_value(raw, &["updated date:", "last updated:"])
            .and_then(|v| parse_date(&v)),
        expires_at: find_value(
            raw,
            &[
                "registry expiry date:",
                "registrar registration expiration date:",
                "expiration date:",
                "paid-till:",
            ],
        )
        .and_then(|v| parse_date(&v)),
        nameservers: find_nameservers(raw),
        unregistered: false,
    })
}

/// 第一个以任一前缀开头的非空值
fn find_value(raw: &str, prefixes: &[&str]) -> Option<String> {
    prefixes.iter().find_map(|prefix| {
        raw.lines().map(str::trim).find_map(|line| {
            let lower = line.to_lowercase();
            if !lower.starts_with(prefix) {
                return None;
            }
            let value = line.splitn(2, ':').nth(1)?.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
    })
}

fn find_nameservers(raw: &str) -> Vec<String> {
    let mut nameservers: Vec<String> = Vec::new();
    for line in raw.lines().map(str::trim) {
        let lower = line.to_lowercase();
        if !(lower.starts_with("name server:") || lower.starts_with("nserver:")) {
            continue;
        }
        // Some registries append glue IPs after the host
        let Some(ns) = line
            .splitn(2, ':')
            .nth(1)
            .and_then(|v| v.split_whitespace().next())
        else {
            continue;
        };
        let ns = ns.trim_end_matches('.').to_lowercase();
        if !ns.is_empty() && !nameservers.contains(&ns) {
            nameservers.push(ns);
        }
    }
    nameservers
}

fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }

    let datetime_formats = [
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S UTC",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for format in &datetime_formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }

    let date_formats = ["%Y-%m-%d", "%d-%b-%Y", "%d.%m.%Y", "%Y.%m.%d"];
    for format in &date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }

    None
}
