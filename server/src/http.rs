use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef, Query, State},
    http::{self, HeaderName, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Redirect},
    routing::{delete, get, post, put},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, Key, PrivateCookieJar, SameSite};
use platform_api::{ApiError, ApiResult};
use platform_authn::{
    AuthConfig, AuthMethod, AuthenticatedPrincipal, GoogleOidc, LoginChallenge, issue_token,
};
use products_taskboard::Taskboard;
use sea_orm::{ConnectionTrait, Statement};
use serde::{Deserialize, Serialize};
use time::Duration as TimeDuration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    auth::{self, AUTH_COOKIE},
    routes,
};

const OIDC_STATE_COOKIE: &str = "taskboard_oidc";
const UPLOAD_LIMIT_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub taskboard: Taskboard,
    pub auth: Arc<AuthConfig>,
    pub oidc: Option<Arc<GoogleOidc>>,
    pub cookie_key: Key,
    pub cors_allowed_origins: Arc<[String]>,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "taskboard server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_credentials(true)
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");

    let public = Router::new()
        .route("/health", get(health_handler))
        .route("/user/signup", post(routes::users::signup))
        .route("/user/login", post(routes::users::login))
        .route("/user/forgot-password", post(routes::users::forgot_password))
        .route("/user/reset-password", post(routes::users::reset_password))
        .route("/auth/oauth", get(oauth_login_handler))
        .route("/auth/callback", get(oauth_callback_handler));

    let uploads = Router::new()
        .route("/board/{board_id}/task/{task_id}", put(routes::tasks::update))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(UPLOAD_LIMIT_BYTES));

    let protected = Router::new()
        .route("/user/logout", post(routes::users::logout))
        .route("/users", get(routes::users::list))
        .route(
            "/user/{id}",
            get(routes::users::get)
                .put(routes::users::update_email)
                .delete(routes::users::delete),
        )
        .route("/board", post(routes::boards::create))
        .route("/boards", get(routes::boards::list))
        .route(
            "/board/{id}",
            get(routes::boards::get)
                .put(routes::boards::rename)
                .delete(routes::boards::delete),
        )
        .route(
            "/task/{id}",
            get(routes::tasks::get)
                .post(routes::tasks::create)
                .delete(routes::tasks::delete),
        )
        .route("/tasks", get(routes::tasks::list))
        .route("/tasks/owners", get(routes::tasks::owners))
        .route("/tasks/managers", get(routes::tasks::managers))
        .route("/tasks/employees", get(routes::tasks::employees))
        .route("/tasks/planning_files", get(routes::tasks::planning_files))
        .route("/tasks/project_files", get(routes::tasks::project_files))
        .route(
            "/task/{id}/manager/{manager_id}",
            delete(routes::tasks::delete_manager),
        )
        .route(
            "/task/{id}/employee/{employee_id}",
            delete(routes::tasks::delete_employee),
        )
        .route(
            "/task/{id}/planning_file/{file_id}",
            delete(routes::tasks::delete_planning_file),
        )
        .route(
            "/task/{id}/project_file/{file_id}",
            delete(routes::tasks::delete_project_file),
        )
        .route("/invitations", get(routes::invitations::list))
        .route("/invitations/{id}/respond", put(routes::invitations::respond))
        .merge(uploads)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_principal,
        ));

    public
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.cors_allowed_origins)),
        )
        .with_state(state)
}

#[derive(Deserialize)]
struct CallbackQuery {
    code: String,
    state: String,
}

#[derive(Serialize)]
pub struct TokenBody {
    pub token: String,
}

async fn oauth_login_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> ApiResult<(PrivateCookieJar, Redirect)> {
    let oidc = state
        .oidc
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("Google login is not configured".into()))?;
    let challenge = oidc.authorize();
    let Some(url) = challenge.url.clone() else {
        return Err(ApiError::Upstream("provider returned no authorization url".into()));
    };
    let payload = serde_json::to_string(&challenge)
        .map_err(|err| ApiError::internal(err.into()))?;
    let state_cookie = Cookie::build((OIDC_STATE_COOKIE, payload))
        .path("/")
        .secure(true)
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10))
        .build();
    Ok((jar.add(state_cookie), Redirect::to(url.as_str())))
}

async fn oauth_callback_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    cookies: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> ApiResult<(PrivateCookieJar, CookieJar, Json<TokenBody>)> {
    let oidc = state
        .oidc
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("Google login is not configured".into()))?;
    let Some(cookie) = jar.get(OIDC_STATE_COOKIE) else {
        return Err(ApiError::invalid("missing authentication state"));
    };
    let jar = jar.remove(Cookie::build((OIDC_STATE_COOKIE, "")).path("/").build());
    let challenge: LoginChallenge = serde_json::from_str(cookie.value())
        .map_err(|_| ApiError::invalid("invalid state cookie"))?;
    if challenge.csrf != params.state {
        return Err(ApiError::invalid("state mismatch"));
    }

    let identity = oidc
        .exchange(params.code, &challenge)
        .await
        .map_err(|err| ApiError::Unauthorized(err.to_string()))?;
    let user = state.taskboard.upsert_oauth_user(&identity.email).await?;
    let principal = AuthenticatedPrincipal::new(user.id, user.email, AuthMethod::Google);
    let token = issue_token(&principal, &state.auth)
        .map_err(|err| ApiError::internal(err.into()))?;
    info!(user_id = principal.user_id, "google login completed");
    let cookies = cookies.add(auth::session_cookie(&token, &state.auth));
    Ok((jar, cookies, Json(TokenBody { token })))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db = state.taskboard.db();
    let db_ok = db
        .execute(Statement::from_string(
            db.get_database_backend(),
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

pub fn clear_session(cookies: CookieJar) -> CookieJar {
    cookies.remove(Cookie::build((AUTH_COOKIE, "")).path("/").build())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use products_taskboard::testing::Harness;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    const BOUNDARY: &str = "taskboard-test-boundary";

    async fn app() -> (Router, Harness) {
        let harness = Harness::new().await.unwrap();
        let state = AppState {
            taskboard: harness.taskboard.clone(),
            auth: Arc::new(AuthConfig {
                jwt_secret: "router-test-secret-router-test-secret".into(),
                session_ttl_minutes: 60,
            }),
            oidc: None,
            cookie_key: Key::from(&[7u8; 64]),
            cors_allowed_origins: Arc::from(vec!["http://localhost:5173".to_string()]),
        };
        (build_router(state), harness)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn multipart_request(uri: &str, token: &str, fields: &[(&str, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header(header::AUTHORIZATION, token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn signup(app: &Router, email: &str) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/user/signup",
                None,
                json!({ "email": email, "password": "correct-horse" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get(header::SET_COOKIE).is_some());
        body_json(response).await["data"]["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn health_reports_database() {
        let (app, _) = app().await;
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["db_ok"], true);
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let (app, _) = app().await;
        let response = app
            .clone()
            .oneshot(Request::get("/boards").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], 401);

        let response = app
            .oneshot(
                Request::get("/boards")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn owner_updates_status_and_outsider_is_refused() {
        let (app, _) = app().await;
        let owner = signup(&app, "owner@example.com").await;
        let outsider = signup(&app, "outsider@example.com").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/board",
                Some(&owner),
                json!({ "name_board": "Sprint 1" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let board_id = body_json(response).await["data"]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::post(format!("/task/{board_id}"))
                    .header(header::AUTHORIZATION, format!("Bearer {owner}"))
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("name_task=Design"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let task_id = body_json(response).await["data"]["task_id"].as_i64().unwrap();

        let uri = format!("/board/{board_id}/task/{task_id}");
        let response = app
            .clone()
            .oneshot(multipart_request(&uri, &owner, &[("planning_status", "Approved")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["updated_fields"], json!(["planning_status"]));

        let response = app
            .oneshot(multipart_request(&uri, &outsider, &[("planning_status", "Approved")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["message"], "Only for owner");
    }

    #[tokio::test]
    async fn deleted_account_token_is_unauthorized() {
        let (app, harness) = app().await;
        let token = signup(&app, "gone@example.com").await;
        let user = harness
            .taskboard
            .login("gone@example.com", "correct-horse")
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::delete(format!("/user/{}", user.id))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(json_request(
                "POST",
                "/board",
                Some(&token),
                json!({ "name_board": "Orphan" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
