use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::OrmConn,
    dto::orders::{
        CheckoutSessionResponse, OrderListResponse, OrderResponse, PlaceOrderRequest,
        UpdateStatusRequest, UserOrdersResponse, VerifyStripeRequest,
    },
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{LineItem, Order},
    response::{ApiResponse, PageInfo},
    routes::params::OrderListQuery,
    services::cart_service,
    state::AppState,
};

/// Flat fee the storefront bakes into the client-computed total; also billed
/// as its own checkout line.
pub const DELIVERY_CHARGE: i64 = 49;

pub const METHOD_COD: &str = "COD";
pub const METHOD_STRIPE: &str = "stripe";

pub const STATUS_PLACED: &str = "Order Placed";

const VALID_STATUSES: [&str; 7] = [
    "Order Placed",
    "Processing",
    "Packed",
    "Shipped",
    "Out for delivery",
    "Delivered",
    "Cancelled",
];

/// Set-membership check only; any known status may follow any other.
pub fn validate_order_status(status: &str) -> Result<(), AppError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid status value".to_string()))
    }
}

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let exists = Users::find_by_id(user.user_id).one(&state.orm).await?;
    if exists.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let order = create_order(&state.orm, user.user_id, &payload, METHOD_COD).await?;

    cart_service::clear_cart(&state.pool, user.user_id).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_placed",
        serde_json::json!({ "order_id": order.id, "payment_method": METHOD_COD }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::message("Order Placed"))
}

pub async fn place_order_stripe(
    state: &AppState,
    user: &AuthUser,
    origin: &str,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<CheckoutSessionResponse>> {
    // The row must exist before the gateway call: the checkout session
    // carries the order id in its redirect URLs.
    let order = create_order(&state.orm, user.user_id, &payload, METHOD_STRIPE).await?;

    let session_url = state
        .gateway
        .create_checkout_session(origin, order.id, &payload.items, DELIVERY_CHARGE)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_placed",
        serde_json::json!({ "order_id": order.id, "payment_method": METHOD_STRIPE }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(CheckoutSessionResponse { session_url }))
}

/// Reconcile the redirect result of a checkout session. Success marks the
/// order paid and empties the cart; failure deletes the order outright, so a
/// later lookup of the id reports it missing.
pub async fn verify_stripe(
    state: &AppState,
    user: &AuthUser,
    payload: VerifyStripeRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.success {
        let order = Orders::find_by_id(payload.order_id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        let mut active: OrderActive = order.into();
        active.payment = Set(true);
        active.updated_at = Set(Utc::now().into());
        active.update(&state.orm).await?;

        // Separate write from the payment flag; no cross-entity transaction.
        cart_service::clear_cart(&state.pool, user.user_id).await?;

        if let Err(err) = log_audit(
            &state.pool,
            Some(user.user_id),
            "payment_confirmed",
            serde_json::json!({ "order_id": payload.order_id }),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }

        Ok(ApiResponse {
            success: true,
            message: None,
            data: None,
        })
    } else {
        Orders::delete_by_id(payload.order_id)
            .exec(&state.orm)
            .await?;

        if let Err(err) = log_audit(
            &state.pool,
            Some(user.user_id),
            "payment_failed",
            serde_json::json!({ "order_id": payload.order_id }),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }

        // success mirrors the payment outcome here, not an error state.
        Ok(ApiResponse {
            success: false,
            message: None,
            data: None,
        })
    }
}

pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateStatusRequest,
) -> AppResult<ApiResponse<OrderResponse>> {
    ensure_admin(user)?;
    validate_order_status(&payload.status)?;

    let existing = Orders::find_by_id(payload.order_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status.clone());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(line_item_from_entity)
        .collect();

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::with_message(
        "Status updated",
        OrderResponse {
            order: order_from_entity(order, items),
        },
    ))
}

pub async fn all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderListResponse>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.normalize_pagination();

    // Filters compose as a logical AND; absent fields match everything.
    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }
    if let Some(method) = query.payment_method.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::PaymentMethod.eq(method.clone()));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let rows = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let orders = assemble_orders(&state.orm, rows).await?;

    let pagination = PageInfo::new(page, limit, total);
    Ok(ApiResponse::ok(OrderListResponse { orders, pagination }))
}

pub async fn user_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<UserOrdersResponse>> {
    // Storage order, unpaginated; clients sort on their side.
    let rows = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .all(&state.orm)
        .await?;
    let orders = assemble_orders(&state.orm, rows).await?;
    Ok(ApiResponse::ok(UserOrdersResponse { orders }))
}

/// Insert the order row and its line-item snapshots in one transaction.
/// `amount` is stored as submitted; the server does not recompute it.
async fn create_order(
    orm: &OrmConn,
    user_id: Uuid,
    payload: &PlaceOrderRequest,
    method: &str,
) -> AppResult<OrderModel> {
    let txn = orm.begin().await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        amount: Set(payload.amount),
        address: Set(payload.address.clone()),
        payment_method: Set(method.to_string()),
        payment: Set(false),
        status: Set(STATUS_PLACED.to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for item in &payload.items {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            name: Set(item.name.clone()),
            price: Set(item.price),
            size: Set(item.size.clone()),
            quantity: Set(item.quantity),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(order)
}

async fn assemble_orders(orm: &OrmConn, rows: Vec<OrderModel>) -> AppResult<Vec<Order>> {
    let ids: Vec<Uuid> = rows.iter().map(|o| o.id).collect();
    let mut by_order: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
    if !ids.is_empty() {
        for item in OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(ids))
            .all(orm)
            .await?
        {
            by_order
                .entry(item.order_id)
                .or_default()
                .push(line_item_from_entity(item));
        }
    }

    Ok(rows
        .into_iter()
        .map(|model| {
            let items = by_order.remove(&model.id).unwrap_or_default();
            order_from_entity(model, items)
        })
        .collect())
}

fn order_from_entity(model: OrderModel, items: Vec<LineItem>) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        items,
        address: model.address,
        amount: model.amount,
        payment_method: model.payment_method,
        payment: model.payment,
        status: model.status,
        date: model.created_at.with_timezone(&Utc),
    }
}

fn line_item_from_entity(model: OrderItemModel) -> LineItem {
    LineItem {
        product_id: model.product_id,
        name: model.name,
        price: model.price,
        size: model.size,
        quantity: model.quantity,
    }
}
