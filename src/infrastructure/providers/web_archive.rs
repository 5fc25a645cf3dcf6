// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::config::settings::ProviderSettings;
use crate::domain::metrics::provider::{
    ArchiveAgeReading, MetricProvider, ProviderError, ProviderKind, ProviderReading,
};
use crate::infrastructure::providers::{read_json, trim_base_url};

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<Snapshot>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    available: bool,
    timestamp: String,
}

/// 存档年龄提供方
///
/// 以最早时间戳查询最接近的快照，得到首次收录时间和域名年龄。
pub struct WebArchiveProvider {
    client: reqwest::Client,
    base_url: String,
}

impl WebArchiveProvider {
    pub fn new(client: reqwest::Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            base_url: trim_base_url(&settings.base_url),
        }
    }
}

/// 解析 14 位快照时间戳（yyyyMMddHHmmss）
fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%d%H%M%S").ok()?;
    Some(Utc.from_utc_datetime(&naive).fixed_offset())
}

#[async_trait]
impl MetricProvider for WebArchiveProvider {
    fn name(&self) -> &'static str {
        "web_archive"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Freeform
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch(&self, domain: &str) -> Result<ProviderReading, ProviderError> {
        let response = self
            .client
            .get(format!("{}/wayback/available", self.base_url))
            .query(&[("url", domain), ("timestamp", "19960101")])
            .send()
            .await?;

        let body: AvailabilityResponse = read_json(response).await?;
        let snapshot = body
            .archived_snapshots
            .closest
            .filter(|snapshot| snapshot.available)
            .ok_or(ProviderError::NoData)?;

        let first_capture = parse_timestamp(&snapshot.timestamp).ok_or_else(|| {
            ProviderError::Malformed(format!("bad snapshot timestamp {}", snapshot.timestamp))
        })?;
        let age_days = (Utc::now().fixed_offset() - first_capture).num_days().max(0);

        Ok(ProviderReading::ArchiveAge(ArchiveAgeReading {
            first_capture,
            age_days,
        }))
    }
}
