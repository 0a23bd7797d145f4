use axum::{
    Extension,
    extract::{Path, Query, State},
};
use platform_api::{ApiResponse, ApiResult};
use platform_authn::AuthenticatedPrincipal;
use products_taskboard::views::InvitationView;
use serde::Deserialize;

use crate::http::AppState;

#[derive(Deserialize)]
pub struct RespondQuery {
    #[serde(default)]
    response: String,
    #[serde(default)]
    role: String,
}

pub async fn respond(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path(id): Path<i32>,
    Query(query): Query<RespondQuery>,
) -> ApiResult<ApiResponse<InvitationView>> {
    let invitation = state
        .taskboard
        .respond_to_invitation(&principal, id, &query.response, &query.role)
        .await?;
    Ok(ApiResponse::ok(invitation))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<InvitationView>>> {
    Ok(ApiResponse::ok(state.taskboard.list_invitations().await?))
}
