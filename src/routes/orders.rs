use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, header},
    routing::{get, post},
};

use crate::{
    dto::orders::{
        CheckoutSessionResponse, OrderListResponse, OrderResponse, PlaceOrderRequest,
        UpdateStatusRequest, UserOrdersResponse, VerifyStripeRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/place", post(place_order))
        .route("/stripe", post(place_order_stripe))
        .route("/status", post(update_status))
        .route("/admin/list", get(all_orders))
        .route("/userorders", post(user_orders))
        .route("/verifystripe", post(verify_stripe))
}

#[utoipa::path(
    post,
    path = "/api/order/place",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Cash-on-delivery order created", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = order_service::place_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/stripe",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Checkout session created", body = ApiResponse<CheckoutSessionResponse>),
        (status = 502, description = "Payment gateway failure"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order_stripe(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<CheckoutSessionResponse>>> {
    // Redirect URLs are built from the calling frontend's origin.
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(state.config.frontend_url.as_str())
        .to_string();
    let resp = order_service::place_order_stripe(&state, &user, &origin, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/status",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Order status overwritten", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Unknown status value"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderResponse>>> {
    let resp = order_service::update_status(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/order/admin/list",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("limit" = Option<i64>, Query, description = "Orders per page, default 10"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("paymentMethod" = Option<String>, Query, description = "Filter by payment method"),
    ),
    responses(
        (status = 200, description = "Paginated order list, newest first", body = ApiResponse<OrderListResponse>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderListResponse>>> {
    let resp = order_service::all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/userorders",
    responses(
        (status = 200, description = "Caller's orders, unpaginated", body = ApiResponse<UserOrdersResponse>),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn user_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserOrdersResponse>>> {
    let resp = order_service::user_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/verifystripe",
    request_body = VerifyStripeRequest,
    responses(
        (status = 200, description = "Payment result reconciled; success mirrors the payment outcome", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn verify_stripe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<VerifyStripeRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = order_service::verify_stripe(&state, &user, payload).await?;
    Ok(Json(resp))
}
