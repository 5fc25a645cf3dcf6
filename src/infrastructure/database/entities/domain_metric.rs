// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "domain_metrics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub domain_id: Uuid,
    pub authority_backlinks: Option<i64>,
    pub authority_referring_domains: Option<i64>,
    pub authority_citation_flow: Option<i32>,
    pub authority_trust_flow: Option<i32>,
    pub index_page_count: Option<i64>,
    pub citation_index: Option<i64>,
    pub citation_indexed_pages: Option<i64>,
    pub citation_backlinks: Option<i64>,
    pub archive_first_capture: Option<ChronoDateTimeWithTimeZone>,
    pub archive_age_days: Option<i64>,
    pub social_likes: Option<i64>,
    pub rank_domain_authority: Option<f64>,
    pub rank_page_authority: Option<f64>,
    pub rank_global: Option<i64>,
    pub rank_semrush: Option<i64>,
    pub rank_backlinks: Option<i64>,
    pub source: String,
    pub checked_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::domain::Entity",
        from = "Column::DomainId",
        to = "super::domain::Column::Id"
    )]
    Domain,
}

impl Related<super::domain::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Domain.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
