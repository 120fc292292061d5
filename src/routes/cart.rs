use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::cart::{AddToCartRequest, CartResponse, UpdateCartRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_to_cart))
        .route("/update", post(update_cart))
        .route("/get", post(get_cart))
}

#[utoipa::path(
    post,
    path = "/api/cart/add",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "One unit added", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::add_to_cart(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/update",
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Quantity overwritten; zero removes the line", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Negative quantity"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateCartRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::update_cart(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/get",
    responses(
        (status = 200, description = "Caller's cart lines", body = ApiResponse<CartResponse>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let resp = cart_service::get_cart(&state.pool, &user).await?;
    Ok(Json(resp))
}
