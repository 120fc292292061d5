use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::auth::{LoginRequest, RegisterRequest, TokenResponse, UserDetailsResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/admin", post(admin_login))
        .route("/create-admin", post(create_admin))
        .route("/details", post(details))
        .route("/verify", get(verify_token))
}

#[utoipa::path(
    post,
    path = "/api/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered, token returned", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Duplicate email or weak credentials"),
    ),
    tag = "Users"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    let resp = auth_service::register_user(&state.pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Invalid credentials"),
    ),
    tag = "Users"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    let resp = auth_service::login_user(&state.pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/admin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Admin logged in", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Invalid admin credentials"),
    ),
    tag = "Users"
)]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    let resp = auth_service::admin_login(&state.pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/create-admin",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Admin user created", body = ApiResponse<TokenResponse>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    let resp = auth_service::create_admin(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/details",
    responses(
        (status = 200, description = "Caller's profile", body = ApiResponse<UserDetailsResponse>),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn details(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserDetailsResponse>>> {
    let resp = auth_service::user_details(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/user/verify",
    responses(
        (status = 200, description = "Token is valid", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn verify_token(_user: AuthUser) -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::message("Token is valid"))
}
