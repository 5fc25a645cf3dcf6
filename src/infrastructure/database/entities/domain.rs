// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "domains")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub keyword_id: Option<Uuid>,
    pub name: String,
    pub status: String,
    pub available: bool,
    pub http_status_code: Option<i32>,
    pub protocol: String,
    pub ip_address: Option<String>,
    pub title: Option<String>,
    pub registrar: Option<String>,
    pub registered_at: Option<ChronoDateTimeWithTimeZone>,
    pub registry_updated_at: Option<ChronoDateTimeWithTimeZone>,
    pub expires_at: Option<ChronoDateTimeWithTimeZone>,
    pub nameservers: Json,
    pub backlink_count: Option<i64>,
    pub referring_domains: Option<i64>,
    pub domain_authority: Option<f64>,
    pub indexed_pages: Option<i64>,
    pub metrics_checked_at: Option<ChronoDateTimeWithTimeZone>,
    pub metrics_source: Option<String>,
    pub metrics_available: bool,
    pub checked_at: Option<ChronoDateTimeWithTimeZone>,
    pub last_http_check: Option<ChronoDateTimeWithTimeZone>,
    pub archive_first_captured: Option<ChronoDateTimeWithTimeZone>,
    pub archive_last_captured: Option<ChronoDateTimeWithTimeZone>,
    pub archive_capture_count: i32,
    pub archive_webpage_count: i32,
    pub archive_image_count: i32,
    pub archive_video_count: i32,
    pub archive_audio_count: i32,
    pub created_at: ChronoDateTimeWithTimeZone,
    pub updated_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::domain_metric::Entity")]
    DomainMetric,
}

impl Related<super::domain_metric::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DomainMetric.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
