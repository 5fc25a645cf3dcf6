// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 创建域名表
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    /// 应用数据库迁移
    ///
    /// # 参数
    ///
    /// * `manager` - 数据库模式管理器
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 迁移成功
    /// * `Err(DbErr)` - 迁移失败
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Domains::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Domains::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Domains::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Domains::KeywordId).uuid().null())
                    .col(ColumnDef::new(Domains::Name).string().not_null())
                    .col(
                        ColumnDef::new(Domains::Status)
                            .string()
                            .not_null()
                            .default("new"),
                    )
                    .col(
                        ColumnDef::new(Domains::Available)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Domains::HttpStatusCode).integer().null())
                    .col(
                        ColumnDef::new(Domains::Protocol)
                            .string()
                            .not_null()
                            .default("unknown"),
                    )
                    .col(ColumnDef::new(Domains::IpAddress).string().null())
                    .col(ColumnDef::new(Domains::Title).text().null())
                    .col(ColumnDef::new(Domains::Registrar).string().null())
                    .col(ColumnDef::new(Domains::RegisteredAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Domains::RegistryUpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Domains::ExpiresAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Domains::Nameservers).json().not_null())
                    .col(ColumnDef::new(Domains::BacklinkCount).big_integer().null())
                    .col(ColumnDef::new(Domains::ReferringDomains).big_integer().null())
                    .col(ColumnDef::new(Domains::DomainAuthority).double().null())
                    .col(ColumnDef::new(Domains::IndexedPages).big_integer().null())
                    .col(
                        ColumnDef::new(Domains::MetricsCheckedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Domains::MetricsSource).string().null())
                    .col(
                        ColumnDef::new(Domains::MetricsAvailable)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Domains::CheckedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Domains::LastHttpCheck).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Domains::ArchiveFirstCaptured)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Domains::ArchiveLastCaptured)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Domains::ArchiveCaptureCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Domains::ArchiveWebpageCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Domains::ArchiveImageCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Domains::ArchiveVideoCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Domains::ArchiveAudioCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Domains::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Domains::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_domains_project_name")
                    .table(Domains::Table)
                    .col(Domains::ProjectId)
                    .col(Domains::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_domains_status")
                    .table(Domains::Table)
                    .col(Domains::Status)
                    .to_owned(),
            )
            .await
    }

    /// 回滚数据库迁移
    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Domains::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Domains {
    Table,
    Id,
    ProjectId,
    KeywordId,
    Name,
    Status,
    Available,
    HttpStatusCode,
    Protocol,
    IpAddress,
    Title,
    Registrar,
    RegisteredAt,
    RegistryUpdatedAt,
    ExpiresAt,
    Nameservers,
    BacklinkCount,
    ReferringDomains,
    DomainAuthority,
    IndexedPages,
    MetricsCheckedAt,
    MetricsSource,
    MetricsAvailable,
    CheckedAt,
    LastHttpCheck,
    ArchiveFirstCaptured,
    ArchiveLastCaptured,
    ArchiveCaptureCount,
    ArchiveWebpageCount,
    ArchiveImageCount,
    ArchiveVideoCount,
    ArchiveAudioCount,
    CreatedAt,
    UpdatedAt,
}
