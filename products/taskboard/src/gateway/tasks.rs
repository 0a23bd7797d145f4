use entity::{InvitationRole, owners, tasks, users};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryOrder, Set,
};
use serde::Serialize;

use super::{FileKind, files, invitations, members, now};

pub async fn find_task<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Option<tasks::Model>, DbErr> {
    tasks::Entity::find_by_id(id).one(conn).await
}

pub async fn list_tasks<C: ConnectionTrait>(conn: &C) -> Result<Vec<tasks::Model>, DbErr> {
    tasks::Entity::find()
        .order_by_asc(tasks::Column::Id)
        .all(conn)
        .await
}

/// Inserts the owner row and the task that points at it. Run inside a transaction.
pub async fn insert_with_owner<C: ConnectionTrait>(
    conn: &C,
    board_id: i32,
    name_task: &str,
    creator: &users::Model,
) -> Result<(tasks::Model, owners::Model), DbErr> {
    let now = now();
    let owner = owners::ActiveModel {
        email: Set(creator.email.clone()),
        user_id: Set(creator.id),
        custom_role: Set(None),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    let task = tasks::ActiveModel {
        board_id: Set(board_id),
        owner_id: Set(owner.id),
        name_task: Set(name_task.to_string()),
        planning_description: Set(None),
        planning_description_percent: Set(None),
        planning_status: Set(None),
        project_status: Set(None),
        planning_due_date: Set(None),
        project_due_date: Set(None),
        priority: Set(None),
        project_comment: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok((task, owner))
}

pub async fn find_owner<C: ConnectionTrait>(
    conn: &C,
    task: &tasks::Model,
) -> Result<Option<owners::Model>, DbErr> {
    owners::Entity::find_by_id(task.owner_id).one(conn).await
}

pub async fn list_owners<C: ConnectionTrait>(
    conn: &C,
) -> Result<Vec<(tasks::Model, Option<owners::Model>)>, DbErr> {
    tasks::Entity::find()
        .find_also_related(owners::Entity)
        .order_by_asc(tasks::Column::Id)
        .all(conn)
        .await
}

pub async fn set_owner_custom_role<C: ConnectionTrait>(
    conn: &C,
    owner: owners::Model,
    custom_role: &str,
) -> Result<owners::Model, DbErr> {
    let mut active: owners::ActiveModel = owner.into();
    active.custom_role = Set(Some(custom_role.to_string()));
    active.update(conn).await
}

/// Rows swept while deleting a task, plus the object names to remove from
/// storage once the transaction commits.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TaskPurge {
    pub invitations: u64,
    pub managers: u64,
    pub employees: u64,
    pub planning_files: u64,
    pub project_files: u64,
    pub planning_description_files: u64,
    #[serde(skip)]
    pub object_names: Vec<String>,
}

/// Deletes a task and everything hanging off it. Owner goes last because the
/// task row references it.
pub async fn purge<C: ConnectionTrait>(conn: &C, task: &tasks::Model) -> Result<TaskPurge, DbErr> {
    let mut purge = TaskPurge {
        invitations: invitations::delete_for_task(conn, task.id).await?,
        managers: members::purge_for_task(conn, task.id, InvitationRole::Manager).await?,
        employees: members::purge_for_task(conn, task.id, InvitationRole::Employee).await?,
        ..Default::default()
    };
    for kind in FileKind::ALL {
        let names = files::purge_for_task(conn, task.id, kind).await?;
        let count = names.len() as u64;
        match kind {
            FileKind::Planning => purge.planning_files = count,
            FileKind::Project => purge.project_files = count,
            FileKind::PlanningDescription => purge.planning_description_files = count,
        }
        purge.object_names.extend(names);
    }
    tasks::Entity::delete_by_id(task.id).exec(conn).await?;
    owners::Entity::delete_by_id(task.owner_id).exec(conn).await?;
    Ok(purge)
}
