use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Boards {
    Table,
    Id,
    NameBoard,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Owners {
    Table,
    Id,
    Email,
    UserId,
    CustomRole,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
    BoardId,
    OwnerId,
    NameTask,
    PlanningDescription,
    PlanningDescriptionPercent,
    PlanningStatus,
    ProjectStatus,
    PlanningDueDate,
    ProjectDueDate,
    Priority,
    ProjectComment,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Invitations {
    Table,
    Id,
    TaskId,
    UserId,
    Role,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Managers {
    Table,
    Id,
    TaskId,
    Email,
    UserId,
    CustomRole,
    InvitationId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
    TaskId,
    Email,
    UserId,
    CustomRole,
    InvitationId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TaskManagers {
    Table,
    TaskId,
    ManagerId,
}

#[derive(DeriveIden)]
enum TaskEmployees {
    Table,
    TaskId,
    EmployeeId,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

fn id_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn timestamp_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(&mut id_col(Users::Id))
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(320)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
                    .col(&mut timestamp_col(Users::CreatedAt))
                    .col(&mut timestamp_col(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Boards::Table)
                    .if_not_exists()
                    .col(&mut id_col(Boards::Id))
                    .col(ColumnDef::new(Boards::NameBoard).string_len(255).not_null())
                    .col(ColumnDef::new(Boards::UserId).integer().not_null())
                    .col(&mut timestamp_col(Boards::CreatedAt))
                    .col(&mut timestamp_col(Boards::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_boards_user")
                            .from(Boards::Table, Boards::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Owners::Table)
                    .if_not_exists()
                    .col(&mut id_col(Owners::Id))
                    .col(ColumnDef::new(Owners::Email).string_len(320).not_null())
                    .col(ColumnDef::new(Owners::UserId).integer().not_null())
                    .col(ColumnDef::new(Owners::CustomRole).string_len(255))
                    .col(&mut timestamp_col(Owners::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_owners_user")
                            .from(Owners::Table, Owners::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(&mut id_col(Tasks::Id))
                    .col(ColumnDef::new(Tasks::BoardId).integer().not_null())
                    .col(ColumnDef::new(Tasks::OwnerId).integer().not_null())
                    .col(ColumnDef::new(Tasks::NameTask).string_len(255).not_null())
                    .col(ColumnDef::new(Tasks::PlanningDescription).text())
                    .col(ColumnDef::new(Tasks::PlanningDescriptionPercent).string_len(16))
                    .col(ColumnDef::new(Tasks::PlanningStatus).string_len(32))
                    .col(ColumnDef::new(Tasks::ProjectStatus).string_len(32))
                    .col(ColumnDef::new(Tasks::PlanningDueDate).string_len(32))
                    .col(ColumnDef::new(Tasks::ProjectDueDate).string_len(32))
                    .col(ColumnDef::new(Tasks::Priority).string_len(32))
                    .col(ColumnDef::new(Tasks::ProjectComment).text())
                    .col(&mut timestamp_col(Tasks::CreatedAt))
                    .col(&mut timestamp_col(Tasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_board")
                            .from(Tasks::Table, Tasks::BoardId)
                            .to(Boards::Table, Boards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_owner")
                            .from(Tasks::Table, Tasks::OwnerId)
                            .to(Owners::Table, Owners::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Invitations::Table)
                    .if_not_exists()
                    .col(&mut id_col(Invitations::Id))
                    .col(ColumnDef::new(Invitations::TaskId).integer().not_null())
                    .col(ColumnDef::new(Invitations::UserId).integer().not_null())
                    .col(ColumnDef::new(Invitations::Role).string_len(16).not_null())
                    .col(ColumnDef::new(Invitations::Status).string_len(16).not_null())
                    .col(&mut timestamp_col(Invitations::CreatedAt))
                    .col(&mut timestamp_col(Invitations::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invitations_task")
                            .from(Invitations::Table, Invitations::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invitations_user")
                            .from(Invitations::Table, Invitations::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_invitations_task_user_role")
                    .table(Invitations::Table)
                    .col(Invitations::TaskId)
                    .col(Invitations::UserId)
                    .col(Invitations::Role)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Managers::Table)
                    .if_not_exists()
                    .col(&mut id_col(Managers::Id))
                    .col(ColumnDef::new(Managers::TaskId).integer().not_null())
                    .col(ColumnDef::new(Managers::Email).string_len(320).not_null())
                    .col(ColumnDef::new(Managers::UserId).integer().not_null())
                    .col(ColumnDef::new(Managers::CustomRole).string_len(255))
                    .col(ColumnDef::new(Managers::InvitationId).integer())
                    .col(&mut timestamp_col(Managers::CreatedAt))
                    .col(&mut timestamp_col(Managers::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_managers_task")
                            .from(Managers::Table, Managers::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_managers_user")
                            .from(Managers::Table, Managers::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_managers_invitation")
                            .from(Managers::Table, Managers::InvitationId)
                            .to(Invitations::Table, Invitations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(&mut id_col(Employees::Id))
                    .col(ColumnDef::new(Employees::TaskId).integer().not_null())
                    .col(ColumnDef::new(Employees::Email).string_len(320).not_null())
                    .col(ColumnDef::new(Employees::UserId).integer().not_null())
                    .col(ColumnDef::new(Employees::CustomRole).string_len(255))
                    .col(ColumnDef::new(Employees::InvitationId).integer())
                    .col(&mut timestamp_col(Employees::CreatedAt))
                    .col(&mut timestamp_col(Employees::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_task")
                            .from(Employees::Table, Employees::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_user")
                            .from(Employees::Table, Employees::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_invitation")
                            .from(Employees::Table, Employees::InvitationId)
                            .to(Invitations::Table, Invitations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TaskManagers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TaskManagers::TaskId).integer().not_null())
                    .col(ColumnDef::new(TaskManagers::ManagerId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(TaskManagers::TaskId)
                            .col(TaskManagers::ManagerId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_managers_task")
                            .from(TaskManagers::Table, TaskManagers::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_managers_manager")
                            .from(TaskManagers::Table, TaskManagers::ManagerId)
                            .to(Managers::Table, Managers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TaskEmployees::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TaskEmployees::TaskId).integer().not_null())
                    .col(ColumnDef::new(TaskEmployees::EmployeeId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(TaskEmployees::TaskId)
                            .col(TaskEmployees::EmployeeId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_employees_task")
                            .from(TaskEmployees::Table, TaskEmployees::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_employees_employee")
                            .from(TaskEmployees::Table, TaskEmployees::EmployeeId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TaskEmployees::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TaskManagers::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employees::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Managers::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invitations::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Owners::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Boards::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
