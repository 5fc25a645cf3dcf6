// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::TokioAsyncResolver;
use std::time::Duration;
use tracing::debug;

use crate::domain::lookup::dns::{DnsError, DnsFields, DnsLookup};

/// 单类记录的查询结果
#[derive(Debug)]
enum RecordOutcome {
    Records(Vec<String>),
    Empty,
    Failed(DnsError),
}

impl RecordOutcome {
    fn from_lookup<I, F>(result: Result<I, ResolveError>, render: F) -> Self
    where
        I: IntoIterator,
        F: Fn(I::Item) -> String,
    {
        match result {
            Ok(lookup) => {
                let records: Vec<String> = lookup.into_iter().map(render).collect();
                if records.is_empty() {
                    RecordOutcome::Empty
                } else {
                    RecordOutcome::Records(records)
                }
            }
            Err(e) => classify_error(&e),
        }
    }
}

fn classify_error(error: &ResolveError) -> RecordOutcome {
    match error.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => RecordOutcome::Empty,
        ResolveErrorKind::Timeout => RecordOutcome::Failed(DnsError::Timeout),
        _ => RecordOutcome::Failed(DnsError::Resolver(error.to_string())),
    }
}

fn clean_name(name: String) -> String {
    name.trim_end_matches('.').to_lowercase()
}

/// 合并四类记录的查询结果
///
/// 只要有一类查到记录就返回成功，其他类失败时标记为 `partial`；
/// 全部为空视为没有记录；没有记录且至少一类查询失败时返回错误，表示无法判断。
fn combine(
    ns: RecordOutcome,
    a: RecordOutcome,
    mx: RecordOutcome,
    txt: RecordOutcome,
) -> Result<DnsFields, DnsError> {
    let mut fields = DnsFields::default();
    let mut failure = None;

    for (outcome, target) in [
        (ns, &mut fields.nameservers),
        (a, &mut fields.ipv4),
        (mx, &mut fields.mx),
        (txt, &mut fields.txt),
    ] {
        match outcome {
            RecordOutcome::Records(records) => *target = records,
            RecordOutcome::Empty => {}
            RecordOutcome::Failed(e) => {
                failure.get_or_insert(e);
            }
        }
    }

    match failure {
        Some(e) if !fields.has_records() => Err(e),
        Some(_) => {
            fields.partial = true;
            Ok(fields)
        }
        None => Ok(fields),
    }
}

/// 基于 hickory 的 DNS 查询
pub struct HickoryDnsResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl HickoryDnsResolver {
    /// 创建 DNS 查询器
    ///
    /// # 参数
    ///
    /// * `timeout` - 整次查询（四类记录）的超时时间
    pub fn new(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
            timeout,
        }
    }
}

#[async_trait]
impl DnsLookup for HickoryDnsResolver {
    async fn lookup(&self, domain: &str) -> Result<DnsFields, DnsError> {
        let host = domain.split(':').next().unwrap_or(domain);
        // Trailing dot keeps the resolver from appending search domains
        let fqdn = format!("{}.", host);

        let lookups = async {
            tokio::join!(
                self.resolver.ns_lookup(fqdn.as_str()),
                self.resolver.ipv4_lookup(fqdn.as_str()),
                self.resolver.mx_lookup(fqdn.as_str()),
                self.resolver.txt_lookup(fqdn.as_str()),
            )
        };

        let (ns, a, mx, txt) = tokio::time::timeout(self.timeout, lookups)
            .await
            .map_err(|_| DnsError::Timeout)?;

        let result = combine(
            RecordOutcome::from_lookup(ns, |ns| clean_name(ns.to_string())),
            RecordOutcome::from_lookup(a, |a| a.to_string()),
            RecordOutcome::from_lookup(mx, |mx| clean_name(mx.exchange().to_string())),
            RecordOutcome::from_lookup(txt, |txt| txt.to_string()),
        );

        match &result {
            Ok(fields) => debug!(
                "DNS for {}: {} NS, {} A, {} MX, {} TXT",
                host,
                fields.nameservers.len(),
                fields.ipv4.len(),
                fields.mx.len(),
                fields.txt.len()
            ),
            Err(e) => debug!("DNS lookup failed for {}: {}", host, e),
        }
        result
    }
}
