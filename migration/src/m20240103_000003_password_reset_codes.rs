use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum PasswordResetCodes {
    Table,
    Email,
    Code,
    ExpiresAt,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PasswordResetCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PasswordResetCodes::Email)
                            .string_len(320)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PasswordResetCodes::Code).string_len(16).not_null())
                    .col(
                        ColumnDef::new(PasswordResetCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(PasswordResetCodes::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}
