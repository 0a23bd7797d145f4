use axum::{
    Extension, Json,
    extract::{Path, State},
};
use platform_api::{ApiResponse, ApiResult};
use platform_authn::AuthenticatedPrincipal;
use products_taskboard::{deletion::BoardDeletion, views::BoardView};
use serde::Deserialize;

use crate::http::AppState;

#[derive(Deserialize)]
pub struct BoardName {
    #[serde(default)]
    name_board: String,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Json(body): Json<BoardName>,
) -> ApiResult<ApiResponse<BoardView>> {
    let board = state.taskboard.create_board(&principal, &body.name_board).await?;
    Ok(ApiResponse::created(board))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<BoardView>> {
    Ok(ApiResponse::ok(state.taskboard.get_board(id).await?))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<BoardView>>> {
    Ok(ApiResponse::ok(state.taskboard.list_boards().await?))
}

pub async fn rename(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path(id): Path<i32>,
    Json(body): Json<BoardName>,
) -> ApiResult<ApiResponse<BoardView>> {
    let board = state
        .taskboard
        .rename_board(&principal, id, &body.name_board)
        .await?;
    Ok(ApiResponse::ok(board))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<BoardDeletion>> {
    let report = state.taskboard.delete_board(&principal, id).await?;
    Ok(ApiResponse::ok(report).with_message("Board deleted"))
}
