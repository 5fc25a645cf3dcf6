// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 创建检查任务队列表
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CheckJobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CheckJobs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CheckJobs::DomainId).uuid().not_null())
                    .col(ColumnDef::new(CheckJobs::Kind).string().not_null())
                    .col(ColumnDef::new(CheckJobs::Status).string().not_null())
                    .col(
                        ColumnDef::new(CheckJobs::AttemptCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CheckJobs::MaxAttempts)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(ColumnDef::new(CheckJobs::LastError).text().null())
                    .col(ColumnDef::new(CheckJobs::ScheduledAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(CheckJobs::LockToken).uuid().null())
                    .col(
                        ColumnDef::new(CheckJobs::LockExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(CheckJobs::StartedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(CheckJobs::CompletedAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(CheckJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CheckJobs::UpdatedAt)
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
                    .name("idx_check_jobs_status_scheduled_at")
                    .table(CheckJobs::Table)
                    .col(CheckJobs::Status)
                    .col(CheckJobs::ScheduledAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_check_jobs_domain_kind")
                    .table(CheckJobs::Table)
                    .col(CheckJobs::DomainId)
                    .col(CheckJobs::Kind)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CheckJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CheckJobs {
    Table,
    Id,
    DomainId,
    Kind,
    Status,
    AttemptCount,
    MaxAttempts,
    LastError,
    ScheduledAt,
    LockToken,
    LockExpiresAt,
    StartedAt,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}
