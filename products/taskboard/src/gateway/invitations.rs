use std::collections::HashMap;

use entity::{InvitationRole, InvitationStatus, invitations, users};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use super::now;

pub async fn find<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Option<invitations::Model>, DbErr> {
    invitations::Entity::find_by_id(id).one(conn).await
}

pub async fn pending_exists<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    user_id: i32,
    role: InvitationRole,
) -> Result<bool, DbErr> {
    let count = invitations::Entity::find()
        .filter(invitations::Column::TaskId.eq(task_id))
        .filter(invitations::Column::UserId.eq(user_id))
        .filter(invitations::Column::Role.eq(role))
        .filter(invitations::Column::Status.eq(InvitationStatus::Pending))
        .count(conn)
        .await?;
    Ok(count > 0)
}

pub async fn insert_pending<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    user_id: i32,
    role: InvitationRole,
) -> Result<invitations::Model, DbErr> {
    let now = now();
    invitations::ActiveModel {
        task_id: Set(task_id),
        user_id: Set(user_id),
        role: Set(role),
        status: Set(InvitationStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
}

pub async fn set_status<C: ConnectionTrait>(
    conn: &C,
    invitation: invitations::Model,
    status: InvitationStatus,
) -> Result<invitations::Model, DbErr> {
    let mut active: invitations::ActiveModel = invitation.into();
    active.status = Set(status);
    active.updated_at = Set(now());
    active.update(conn).await
}

/// Hands an invitation over to another user.
pub async fn reassign<C: ConnectionTrait>(
    conn: &C,
    invitation: invitations::Model,
    user_id: i32,
) -> Result<invitations::Model, DbErr> {
    let mut active: invitations::ActiveModel = invitation.into();
    active.user_id = Set(user_id);
    active.updated_at = Set(now());
    active.update(conn).await
}

/// Every invitation joined with the invitee's email.
pub async fn list_with_email<C: ConnectionTrait>(
    conn: &C,
) -> Result<Vec<(invitations::Model, Option<users::Model>)>, DbErr> {
    invitations::Entity::find()
        .find_also_related(users::Entity)
        .order_by_asc(invitations::Column::Id)
        .all(conn)
        .await
}

pub async fn statuses_for_task<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
) -> Result<Vec<invitations::Model>, DbErr> {
    invitations::Entity::find()
        .filter(invitations::Column::TaskId.eq(task_id))
        .all(conn)
        .await
}

pub async fn delete_one<C: ConnectionTrait>(conn: &C, id: i32) -> Result<(), DbErr> {
    invitations::Entity::delete_by_id(id).exec(conn).await?;
    Ok(())
}

/// Drops pending invitations of one role on a task. Answered ones stay as history.
pub async fn delete_pending_for_role<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    role: InvitationRole,
) -> Result<u64, DbErr> {
    let result = invitations::Entity::delete_many()
        .filter(invitations::Column::TaskId.eq(task_id))
        .filter(invitations::Column::Role.eq(role))
        .filter(invitations::Column::Status.eq(InvitationStatus::Pending))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn delete_for_task<C: ConnectionTrait>(conn: &C, task_id: i32) -> Result<u64, DbErr> {
    let result = invitations::Entity::delete_many()
        .filter(invitations::Column::TaskId.eq(task_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn all_statuses<C: ConnectionTrait>(
    conn: &C,
) -> Result<HashMap<i32, InvitationStatus>, DbErr> {
    Ok(invitations::Entity::find()
        .all(conn)
        .await?
        .into_iter()
        .map(|invitation| (invitation.id, invitation.status))
        .collect())
}
