//! Serialisable read models returned by the services.

use std::collections::HashMap;

use entity::{InvitationRole, InvitationStatus, boards, invitations, owners, tasks, users};
use sea_orm::{ConnectionTrait, DbErr, prelude::DateTimeWithTimeZone};
use serde::Serialize;

use crate::gateway::{self, FileKind, FileRow, MemberRow};

#[derive(Clone, Debug, Serialize)]
pub struct UserView {
    pub id: i32,
    pub email: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl From<users::Model> for UserView {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OwnerView {
    pub id: i32,
    pub user_id: i32,
    pub email: String,
    pub custom_role: Option<String>,
}

impl From<owners::Model> for OwnerView {
    fn from(owner: owners::Model) -> Self {
        Self {
            id: owner.id,
            user_id: owner.user_id,
            email: owner.email,
            custom_role: owner.custom_role,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MemberView {
    pub id: i32,
    pub task_id: i32,
    pub user_id: i32,
    pub email: String,
    pub custom_role: Option<String>,
    pub invitation_id: Option<i32>,
    pub invitation_status: InvitationStatus,
}

impl MemberView {
    fn from_row(row: MemberRow, statuses: &HashMap<i32, InvitationStatus>) -> Self {
        let invitation_status = if row.active {
            InvitationStatus::Accepted
        } else {
            row.invitation_id
                .and_then(|id| statuses.get(&id).copied())
                .unwrap_or(InvitationStatus::Pending)
        };
        Self {
            id: row.id,
            task_id: row.task_id,
            user_id: row.user_id,
            email: row.email,
            custom_role: row.custom_role,
            invitation_id: row.invitation_id,
            invitation_status,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskView {
    pub id: i32,
    pub board_id: i32,
    pub name_task: String,
    pub planning_description: Option<String>,
    pub planning_description_percent: Option<String>,
    pub planning_status: Option<&'static str>,
    pub project_status: Option<&'static str>,
    pub planning_due_date: Option<String>,
    pub project_due_date: Option<String>,
    pub priority: Option<&'static str>,
    pub project_comment: Option<String>,
    pub owner: Option<OwnerView>,
    pub managers: Vec<MemberView>,
    pub employees: Vec<MemberView>,
    pub planning_files: Vec<FileRow>,
    pub project_files: Vec<FileRow>,
    pub planning_description_files: Vec<FileRow>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Clone, Debug, Serialize)]
pub struct BoardCreator {
    pub user_id: i32,
    pub user_email: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BoardView {
    pub id: i32,
    pub name_board: String,
    pub board_created_by: BoardCreator,
    pub tasks: Vec<TaskView>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskCreated {
    pub board_id: i32,
    pub task_id: i32,
    pub name_task: String,
    pub owner_id: i32,
    pub user_email: String,
    pub user_id: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct InvitationView {
    pub id: i32,
    pub task_id: i32,
    pub user_id: i32,
    pub user_email: Option<String>,
    pub role: InvitationRole,
    pub status: InvitationStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl InvitationView {
    pub fn new(invitation: invitations::Model, user_email: Option<String>) -> Self {
        Self {
            id: invitation.id,
            task_id: invitation.task_id,
            user_id: invitation.user_id,
            user_email,
            role: invitation.role,
            status: invitation.status,
            created_at: invitation.created_at,
            updated_at: invitation.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskOwnerView {
    pub task_id: i32,
    pub name_task: String,
    pub owner: Option<OwnerView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskFileView {
    pub task_id: i32,
    #[serde(flatten)]
    pub file: FileRow,
}

pub(crate) async fn task_view<C: ConnectionTrait>(
    conn: &C,
    task: tasks::Model,
) -> Result<TaskView, DbErr> {
    let owner = gateway::tasks::find_owner(conn, &task).await?.map(OwnerView::from);
    let statuses: HashMap<i32, InvitationStatus> =
        gateway::invitations::statuses_for_task(conn, task.id)
            .await?
            .into_iter()
            .map(|invitation| (invitation.id, invitation.status))
            .collect();
    let managers = gateway::members::list_for_task(conn, task.id, InvitationRole::Manager)
        .await?
        .into_iter()
        .map(|row| MemberView::from_row(row, &statuses))
        .collect();
    let employees = gateway::members::list_for_task(conn, task.id, InvitationRole::Employee)
        .await?
        .into_iter()
        .map(|row| MemberView::from_row(row, &statuses))
        .collect();
    Ok(TaskView {
        planning_files: gateway::files::list_for_task(conn, task.id, FileKind::Planning).await?,
        project_files: gateway::files::list_for_task(conn, task.id, FileKind::Project).await?,
        planning_description_files: gateway::files::list_for_task(
            conn,
            task.id,
            FileKind::PlanningDescription,
        )
        .await?,
        id: task.id,
        board_id: task.board_id,
        name_task: task.name_task,
        planning_description: task.planning_description,
        planning_description_percent: task.planning_description_percent,
        planning_status: task.planning_status.map(|status| status.label()),
        project_status: task.project_status.map(|status| status.label()),
        planning_due_date: task.planning_due_date,
        project_due_date: task.project_due_date,
        priority: task.priority.map(|priority| priority.label()),
        project_comment: task.project_comment,
        owner,
        managers,
        employees,
        created_at: task.created_at,
        updated_at: task.updated_at,
    })
}

pub(crate) async fn board_view<C: ConnectionTrait>(
    conn: &C,
    board: boards::Model,
) -> Result<BoardView, DbErr> {
    let creator = gateway::users::find_user(conn, board.user_id).await?;
    let mut tasks = Vec::new();
    for task in gateway::boards::tasks_of_board(conn, board.id).await? {
        tasks.push(task_view(conn, task).await?);
    }
    Ok(BoardView {
        id: board.id,
        name_board: board.name_board,
        board_created_by: BoardCreator {
            user_id: board.user_id,
            user_email: creator.map(|user| user.email),
        },
        tasks,
        created_at: board.created_at,
        updated_at: board.updated_at,
    })
}

pub(crate) fn member_views(rows: Vec<MemberRow>, statuses: &HashMap<i32, InvitationStatus>) -> Vec<MemberView> {
    rows.into_iter()
        .map(|row| MemberView::from_row(row, statuses))
        .collect()
}
