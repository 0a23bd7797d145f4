//! Manager and employee rows. The two tables are identical apart from the
//! link column, so `for_role!` binds the pair for a role.

use std::collections::HashSet;

use entity::{InvitationRole, users};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use serde::Serialize;

use super::now;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemberRow {
    pub id: i32,
    pub task_id: i32,
    pub email: String,
    pub user_id: i32,
    pub custom_role: Option<String>,
    pub invitation_id: Option<i32>,
    /// A link row exists, i.e. the invitation was accepted.
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
}

macro_rules! for_role {
    ($role:expr, $member:ident, $link:ident, $member_id:ident => $body:block) => {
        match $role {
            InvitationRole::Manager => {
                #[allow(unused_imports)]
                use entity::{
                    managers as $member, task_managers as $link,
                    task_managers::Column::ManagerId as $member_id,
                };
                $body
            }
            InvitationRole::Employee => {
                #[allow(unused_imports)]
                use entity::{
                    employees as $member, task_employees as $link,
                    task_employees::Column::EmployeeId as $member_id,
                };
                $body
            }
        }
    };
}

macro_rules! row {
    ($model:expr, $active:expr) => {{
        let model = $model;
        MemberRow {
            id: model.id,
            task_id: model.task_id,
            email: model.email,
            user_id: model.user_id,
            custom_role: model.custom_role,
            invitation_id: model.invitation_id,
            active: $active,
            created_at: model.created_at,
        }
    }};
}

async fn active_ids<C: ConnectionTrait>(
    conn: &C,
    task_id: Option<i32>,
    role: InvitationRole,
) -> Result<HashSet<i32>, DbErr> {
    for_role!(role, member, link, MemberIdCol => {
        let mut query = link::Entity::find().select_only().column(MemberIdCol);
        if let Some(task_id) = task_id {
            query = query.filter(link::Column::TaskId.eq(task_id));
        }
        let ids: Vec<i32> = query.into_tuple().all(conn).await?;
        Ok(ids.into_iter().collect())
    })
}

pub async fn list_for_task<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    role: InvitationRole,
) -> Result<Vec<MemberRow>, DbErr> {
    let active = active_ids(conn, Some(task_id), role).await?;
    for_role!(role, member, link, MemberIdCol => {
        let models = member::Entity::find()
            .filter(member::Column::TaskId.eq(task_id))
            .order_by_asc(member::Column::Id)
            .all(conn)
            .await?;
        Ok(models
            .into_iter()
            .map(|model| {
                let is_active = active.contains(&model.id);
                row!(model, is_active)
            })
            .collect())
    })
}

pub async fn list_all<C: ConnectionTrait>(
    conn: &C,
    role: InvitationRole,
) -> Result<Vec<MemberRow>, DbErr> {
    let active = active_ids(conn, None, role).await?;
    for_role!(role, member, link, MemberIdCol => {
        let models = member::Entity::find()
            .order_by_asc(member::Column::TaskId)
            .order_by_asc(member::Column::Id)
            .all(conn)
            .await?;
        Ok(models
            .into_iter()
            .map(|model| {
                let is_active = active.contains(&model.id);
                row!(model, is_active)
            })
            .collect())
    })
}

pub async fn active_emails<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    role: InvitationRole,
) -> Result<Vec<String>, DbErr> {
    Ok(list_for_task(conn, task_id, role)
        .await?
        .into_iter()
        .filter(|row| row.active)
        .map(|row| row.email)
        .collect())
}

pub async fn count_active<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    role: InvitationRole,
) -> Result<u64, DbErr> {
    for_role!(role, member, link, MemberIdCol => {
        link::Entity::find()
            .filter(link::Column::TaskId.eq(task_id))
            .count(conn)
            .await
    })
}

pub async fn find<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    member_id: i32,
    role: InvitationRole,
) -> Result<Option<MemberRow>, DbErr> {
    Ok(list_for_task(conn, task_id, role)
        .await?
        .into_iter()
        .find(|row| row.id == member_id))
}

pub async fn find_by_email<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    email: &str,
    role: InvitationRole,
) -> Result<Option<MemberRow>, DbErr> {
    Ok(list_for_task(conn, task_id, role)
        .await?
        .into_iter()
        .find(|row| row.email == email))
}

pub async fn find_by_invitation<C: ConnectionTrait>(
    conn: &C,
    invitation_id: i32,
    role: InvitationRole,
) -> Result<Option<MemberRow>, DbErr> {
    for_role!(role, member, link, MemberIdCol => {
        let Some(model) = member::Entity::find()
            .filter(member::Column::InvitationId.eq(invitation_id))
            .one(conn)
            .await?
        else {
            return Ok(None);
        };
        let is_active = link::Entity::find()
            .filter(link::Column::TaskId.eq(model.task_id))
            .filter(MemberIdCol.eq(model.id))
            .count(conn)
            .await?
            > 0;
        Ok(Some(row!(model, is_active)))
    })
}

/// Creates an inactive member row; membership starts once [`activate`] runs.
pub async fn insert<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    user: &users::Model,
    role: InvitationRole,
    invitation_id: Option<i32>,
) -> Result<MemberRow, DbErr> {
    let now = now();
    for_role!(role, member, link, MemberIdCol => {
        let saved = member::ActiveModel {
            task_id: Set(task_id),
            email: Set(user.email.clone()),
            user_id: Set(user.id),
            custom_role: Set(None),
            invitation_id: Set(invitation_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(row!(saved, false))
    })
}

pub async fn activate<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    member_id: i32,
    role: InvitationRole,
) -> Result<(), DbErr> {
    for_role!(role, member, link, MemberIdCol => {
        let mut link_row = <link::ActiveModel as Default>::default();
        link_row.set(link::Column::TaskId, task_id.into());
        link_row.set(MemberIdCol, member_id.into());
        link::Entity::insert(link_row).exec_without_returning(conn).await?;
        Ok(())
    })
}

/// Deletes the member row together with its link row.
pub async fn remove<C: ConnectionTrait>(
    conn: &C,
    member_id: i32,
    role: InvitationRole,
) -> Result<(), DbErr> {
    for_role!(role, member, link, MemberIdCol => {
        link::Entity::delete_many()
            .filter(MemberIdCol.eq(member_id))
            .exec(conn)
            .await?;
        member::Entity::delete_by_id(member_id).exec(conn).await?;
        Ok(())
    })
}

/// Points a member row at another registered user.
pub async fn repoint<C: ConnectionTrait>(
    conn: &C,
    member_id: i32,
    role: InvitationRole,
    user: &users::Model,
) -> Result<(), DbErr> {
    for_role!(role, member, link, MemberIdCol => {
        member::Entity::update_many()
            .col_expr(member::Column::Email, Expr::value(user.email.clone()))
            .col_expr(member::Column::UserId, Expr::value(user.id))
            .col_expr(member::Column::UpdatedAt, Expr::value(now()))
            .filter(member::Column::Id.eq(member_id))
            .exec(conn)
            .await?;
        Ok(())
    })
}

pub async fn set_custom_role<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    email: &str,
    role: InvitationRole,
    custom_role: &str,
) -> Result<u64, DbErr> {
    for_role!(role, member, link, MemberIdCol => {
        let result = member::Entity::update_many()
            .col_expr(member::Column::CustomRole, Expr::value(custom_role))
            .col_expr(member::Column::UpdatedAt, Expr::value(now()))
            .filter(member::Column::TaskId.eq(task_id))
            .filter(member::Column::Email.eq(email))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    })
}

/// Removes every member of a role from a task and returns how many rows went.
pub async fn purge_for_task<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    role: InvitationRole,
) -> Result<u64, DbErr> {
    for_role!(role, member, link, MemberIdCol => {
        link::Entity::delete_many()
            .filter(link::Column::TaskId.eq(task_id))
            .exec(conn)
            .await?;
        let removed = member::Entity::delete_many()
            .filter(member::Column::TaskId.eq(task_id))
            .exec(conn)
            .await?;
        Ok(removed.rows_affected)
    })
}
