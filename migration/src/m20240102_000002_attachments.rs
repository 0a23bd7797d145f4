use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum File {
    Id,
    FileUrl,
    FileName,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Link {
    TaskId,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (file table, link table, link column) for every attachment kind.
const ATTACHMENT_TABLES: [(&str, &str, &str); 3] = [
    ("planning_files", "task_planning_files", "planning_file_id"),
    ("project_files", "task_project_files", "project_file_id"),
    (
        "planning_description_files",
        "task_planning_description_files",
        "planning_description_file_id",
    ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (files, links, link_col) in ATTACHMENT_TABLES {
            let (files_table, links_table, link_col) =
                (Alias::new(files), Alias::new(links), Alias::new(link_col));
            manager
                .create_table(
                    Table::create()
                        .table(files_table.clone())
                        .if_not_exists()
                        .col(
                            ColumnDef::new(File::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(File::FileUrl).string_len(1024).not_null())
                        .col(ColumnDef::new(File::FileName).string_len(255).not_null())
                        .col(
                            ColumnDef::new(File::CreatedAt)
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
                        .if_not_exists()
                        .name(format!("idx_{}_file_name", files))
                        .table(files_table.clone())
                        .col(File::FileName)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(links_table.clone())
                        .if_not_exists()
                        .col(ColumnDef::new(Link::TaskId).integer().not_null())
                        .col(ColumnDef::new(link_col.clone()).integer().not_null())
                        .primary_key(Index::create().col(Link::TaskId).col(link_col.clone()))
                        .foreign_key(
                            ForeignKey::create()
                                .name(format!("fk_{}_task", links))
                                .from(links_table.clone(), Link::TaskId)
                                .to(Tasks::Table, Tasks::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name(format!("fk_{}_file", links))
                                .from(links_table.clone(), link_col.clone())
                                .to(files_table.clone(), File::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (files, links, _) in ATTACHMENT_TABLES {
            manager
                .drop_table(Table::drop().table(Alias::new(links)).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Alias::new(files)).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}
