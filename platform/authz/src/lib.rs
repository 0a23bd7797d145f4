//! Authorization primitives for task roles.
//!
//! A role is never cached: every check reads the owner row or the membership
//! link tables as they are at the time of the call.

use entity::{employees, managers, owners, task_employees, task_managers, tasks};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    RelationTrait, sea_query::JoinType,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRole {
    Owner,
    Manager,
    Employee,
}

impl TaskRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Manager => "manager",
            Self::Employee => "employee",
        }
    }

    fn denial(self) -> &'static str {
        match self {
            Self::Owner => "Only for owner",
            Self::Manager => "Only for manager",
            Self::Employee => "Only for employee",
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("task {0} not found")]
    TaskNotFound(i32),
    #[error(transparent)]
    Db(#[from] DbErr),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RoleValidator;

impl RoleValidator {
    pub async fn require_role<C>(
        &self,
        conn: &C,
        task_id: i32,
        user_id: i32,
        role: TaskRole,
    ) -> Result<(), AuthzError>
    where
        C: ConnectionTrait,
    {
        let task = tasks::Entity::find_by_id(task_id)
            .one(conn)
            .await?
            .ok_or(AuthzError::TaskNotFound(task_id))?;
        let allowed = match role {
            TaskRole::Owner => owners::Entity::find_by_id(task.owner_id)
                .one(conn)
                .await?
                .is_some_and(|owner| owner.user_id == user_id),
            TaskRole::Manager => is_active_manager(conn, task_id, user_id).await?,
            TaskRole::Employee => is_active_employee(conn, task_id, user_id).await?,
        };
        debug!(task_id, user_id, role = role.as_str(), allowed, "role check");
        if allowed {
            Ok(())
        } else {
            Err(AuthzError::Forbidden(role.denial()))
        }
    }
}

pub async fn is_active_manager<C>(conn: &C, task_id: i32, user_id: i32) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let count = task_managers::Entity::find()
        .join(JoinType::InnerJoin, task_managers::Relation::Manager.def())
        .filter(task_managers::Column::TaskId.eq(task_id))
        .filter(managers::Column::UserId.eq(user_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

pub async fn is_active_employee<C>(conn: &C, task_id: i32, user_id: i32) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let count = task_employees::Entity::find()
        .join(JoinType::InnerJoin, task_employees::Relation::Employee.def())
        .filter(task_employees::Column::TaskId.eq(task_id))
        .filter(employees::Column::UserId.eq(user_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}
