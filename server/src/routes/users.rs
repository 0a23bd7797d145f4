use axum::{
    Extension, Json,
    extract::{Path, State},
};
use axum_extra::extract::cookie::CookieJar;
use platform_api::{ApiError, ApiResponse, ApiResult};
use platform_authn::{AuthMethod, AuthenticatedPrincipal, issue_token};
use products_taskboard::views::UserView;
use serde::Deserialize;

use crate::{
    auth,
    http::{self, AppState, TokenBody},
};

#[derive(Deserialize)]
pub struct Credentials {
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct ForgotPassword {
    email: String,
}

#[derive(Deserialize)]
pub struct ResetPassword {
    email: String,
    reset_code: String,
    new_password: String,
}

#[derive(Deserialize)]
pub struct EmailUpdate {
    email: String,
}

fn start_session(
    state: &AppState,
    cookies: CookieJar,
    user: UserView,
) -> ApiResult<(CookieJar, TokenBody)> {
    let principal = AuthenticatedPrincipal::new(user.id, user.email, AuthMethod::Password);
    let token = issue_token(&principal, &state.auth).map_err(|err| ApiError::internal(err.into()))?;
    let cookies = cookies.add(auth::session_cookie(&token, &state.auth));
    Ok((cookies, TokenBody { token }))
}

pub async fn signup(
    State(state): State<AppState>,
    cookies: CookieJar,
    Json(body): Json<Credentials>,
) -> ApiResult<(CookieJar, ApiResponse<TokenBody>)> {
    let user = state.taskboard.signup(&body.email, &body.password).await?;
    let (cookies, token) = start_session(&state, cookies, user)?;
    Ok((cookies, ApiResponse::created(token)))
}

pub async fn login(
    State(state): State<AppState>,
    cookies: CookieJar,
    Json(body): Json<Credentials>,
) -> ApiResult<(CookieJar, ApiResponse<TokenBody>)> {
    let user = state.taskboard.login(&body.email, &body.password).await?;
    let (cookies, token) = start_session(&state, cookies, user)?;
    Ok((cookies, ApiResponse::ok(token)))
}

pub async fn logout(cookies: CookieJar) -> (CookieJar, ApiResponse<()>) {
    (http::clear_session(cookies), ApiResponse::ok(()).with_message("Logged out"))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPassword>,
) -> ApiResult<ApiResponse<()>> {
    state.taskboard.forgot_password(&body.email).await?;
    Ok(ApiResponse::ok(()).with_message("Reset code sent to your email"))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPassword>,
) -> ApiResult<ApiResponse<()>> {
    state
        .taskboard
        .reset_password(&body.email, &body.reset_code, &body.new_password)
        .await?;
    Ok(ApiResponse::ok(()).with_message("Password has been reset"))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<UserView>>> {
    Ok(ApiResponse::ok(state.taskboard.list_users().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<UserView>> {
    Ok(ApiResponse::ok(state.taskboard.get_user(id).await?))
}

pub async fn update_email(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path(id): Path<i32>,
    Json(body): Json<EmailUpdate>,
) -> ApiResult<ApiResponse<UserView>> {
    let user = state
        .taskboard
        .update_user_email(&principal, id, &body.email)
        .await?;
    Ok(ApiResponse::ok(user))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<()>> {
    state.taskboard.delete_user(&principal, id).await?;
    Ok(ApiResponse::ok(()).with_message("User deleted"))
}
