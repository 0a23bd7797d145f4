use axum::{
    Extension, Form,
    extract::{Multipart, Path, State},
};
use entity::InvitationRole;
use platform_api::{ApiResponse, ApiResult};
use platform_authn::AuthenticatedPrincipal;
use products_taskboard::{
    TaskUpdateOutcome,
    deletion::{EmployeeDeletion, FileDeletion, ManagerDeletion},
    gateway::{FileKind, TaskPurge},
    views::{MemberView, TaskCreated, TaskFileView, TaskOwnerView, TaskView},
};
use serde::Deserialize;

use super::read_changeset;
use crate::http::AppState;

#[derive(Deserialize)]
pub struct NewTask {
    #[serde(default)]
    name_task: String,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path(board_id): Path<i32>,
    Form(body): Form<NewTask>,
) -> ApiResult<ApiResponse<TaskCreated>> {
    let created = state
        .taskboard
        .create_task(&principal, board_id, &body.name_task)
        .await?;
    Ok(ApiResponse::created(created))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path((board_id, task_id)): Path<(i32, i32)>,
    multipart: Multipart,
) -> ApiResult<ApiResponse<TaskUpdateOutcome>> {
    let changeset = read_changeset(multipart).await?;
    let outcome = state
        .taskboard
        .update_task(&principal, board_id, task_id, changeset)
        .await?;
    Ok(ApiResponse::ok(outcome).with_message("Task updated"))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<TaskView>> {
    Ok(ApiResponse::ok(state.taskboard.get_task(id).await?))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<TaskView>>> {
    Ok(ApiResponse::ok(state.taskboard.list_tasks().await?))
}

pub async fn owners(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<TaskOwnerView>>> {
    Ok(ApiResponse::ok(state.taskboard.list_task_owners().await?))
}

pub async fn managers(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<MemberView>>> {
    let rows = state.taskboard.list_task_members(InvitationRole::Manager).await?;
    Ok(ApiResponse::ok(rows))
}

pub async fn employees(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<MemberView>>> {
    let rows = state.taskboard.list_task_members(InvitationRole::Employee).await?;
    Ok(ApiResponse::ok(rows))
}

pub async fn planning_files(
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<TaskFileView>>> {
    Ok(ApiResponse::ok(state.taskboard.list_task_files(FileKind::Planning).await?))
}

pub async fn project_files(
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<TaskFileView>>> {
    Ok(ApiResponse::ok(state.taskboard.list_task_files(FileKind::Project).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<TaskPurge>> {
    let purge = state.taskboard.delete_task(&principal, id).await?;
    Ok(ApiResponse::ok(purge).with_message("Task deleted"))
}

pub async fn delete_manager(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path((id, manager_id)): Path<(i32, i32)>,
) -> ApiResult<ApiResponse<ManagerDeletion>> {
    let report = state.taskboard.delete_manager(&principal, id, manager_id).await?;
    Ok(ApiResponse::ok(report).with_message("Manager removed"))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path((id, employee_id)): Path<(i32, i32)>,
) -> ApiResult<ApiResponse<EmployeeDeletion>> {
    let report = state.taskboard.delete_employee(&principal, id, employee_id).await?;
    Ok(ApiResponse::ok(report).with_message("Employee removed"))
}

pub async fn delete_planning_file(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path((id, file_id)): Path<(i32, i32)>,
) -> ApiResult<ApiResponse<FileDeletion>> {
    let deleted = state.taskboard.delete_planning_file(&principal, id, file_id).await?;
    Ok(ApiResponse::ok(deleted).with_message("Planning file deleted"))
}

pub async fn delete_project_file(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path((id, file_id)): Path<(i32, i32)>,
) -> ApiResult<ApiResponse<FileDeletion>> {
    let deleted = state.taskboard.delete_project_file(&principal, id, file_id).await?;
    Ok(ApiResponse::ok(deleted).with_message("Project file deleted"))
}
