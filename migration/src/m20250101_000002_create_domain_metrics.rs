// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

use crate::m20250101_000001_create_domains::Domains;

/// 创建域名指标表，每个域名一行
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DomainMetrics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DomainMetrics::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DomainMetrics::DomainId).uuid().not_null())
                    .col(ColumnDef::new(DomainMetrics::AuthorityBacklinks).big_integer().null())
                    .col(
                        ColumnDef::new(DomainMetrics::AuthorityReferringDomains)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(DomainMetrics::AuthorityCitationFlow).integer().null())
                    .col(ColumnDef::new(DomainMetrics::AuthorityTrustFlow).integer().null())
                    .col(ColumnDef::new(DomainMetrics::IndexPageCount).big_integer().null())
                    .col(ColumnDef::new(DomainMetrics::CitationIndex).big_integer().null())
                    .col(
                        ColumnDef::new(DomainMetrics::CitationIndexedPages)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(DomainMetrics::CitationBacklinks).big_integer().null())
                    .col(
                        ColumnDef::new(DomainMetrics::ArchiveFirstCapture)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(DomainMetrics::ArchiveAgeDays).big_integer().null())
                    .col(ColumnDef::new(DomainMetrics::SocialLikes).big_integer().null())
                    .col(ColumnDef::new(DomainMetrics::RankDomainAuthority).double().null())
                    .col(ColumnDef::new(DomainMetrics::RankPageAuthority).double().null())
                    .col(ColumnDef::new(DomainMetrics::RankGlobal).big_integer().null())
                    .col(ColumnDef::new(DomainMetrics::RankSemrush).big_integer().null())
                    .col(ColumnDef::new(DomainMetrics::RankBacklinks).big_integer().null())
                    .col(
                        ColumnDef::new(DomainMetrics::Source)
                            .string()
                            .not_null()
                            .default("none"),
                    )
                    .col(
                        ColumnDef::new(DomainMetrics::CheckedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_domain_metrics_domain")
                            .from(DomainMetrics::Table, DomainMetrics::DomainId)
                            .to(Domains::Table, Domains::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_domain_metrics_domain_id")
                    .table(DomainMetrics::Table)
                    .col(DomainMetrics::DomainId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DomainMetrics::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DomainMetrics {
    Table,
    Id,
    DomainId,
    AuthorityBacklinks,
    AuthorityReferringDomains,
    AuthorityCitationFlow,
    AuthorityTrustFlow,
    IndexPageCount,
    CitationIndex,
    CitationIndexedPages,
    CitationBacklinks,
    ArchiveFirstCapture,
    ArchiveAgeDays,
    SocialLikes,
    RankDomainAuthority,
    RankPageAuthority,
    RankGlobal,
    RankSemrush,
    RankBacklinks,
    Source,
    CheckedAt,
}
