use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::cart::{AddToCartRequest, CartResponse, UpdateCartRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartLine,
    response::ApiResponse,
};

#[derive(FromRow)]
struct CartRow {
    product_id: Uuid,
    size: String,
    quantity: i32,
}

pub async fn get_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartResponse>> {
    let rows = sqlx::query_as::<_, CartRow>(
        "SELECT product_id, size, quantity FROM cart_items WHERE user_id = $1",
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    let cart = rows
        .into_iter()
        .map(|row| CartLine {
            product_id: row.product_id,
            size: row.size,
            quantity: row.quantity,
        })
        .collect();

    Ok(ApiResponse::ok(CartResponse { cart }))
}

/// Add one unit of a product+size; repeated adds increment the quantity.
pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product_exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product_exist.is_none() {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    sqlx::query(
        r#"
        INSERT INTO cart_items (user_id, product_id, size, quantity)
        VALUES ($1, $2, $3, 1)
        ON CONFLICT (user_id, product_id, size)
        DO UPDATE SET quantity = cart_items.quantity + 1
        "#,
    )
    .bind(user.user_id)
    .bind(payload.product_id)
    .bind(payload.size.as_str())
    .execute(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_add",
        serde_json::json!({ "product_id": payload.product_id, "size": payload.size }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::message("Added To Cart"))
}

/// Overwrite the quantity for a product+size; zero removes the line.
pub async fn update_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpdateCartRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.quantity < 0 {
        return Err(AppError::BadRequest(
            "quantity must not be negative".to_string(),
        ));
    }

    if payload.quantity == 0 {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2 AND size = $3")
            .bind(user.user_id)
            .bind(payload.product_id)
            .bind(payload.size.as_str())
            .execute(pool)
            .await?;
    } else {
        sqlx::query(
            r#"
            INSERT INTO cart_items (user_id, product_id, size, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, product_id, size)
            DO UPDATE SET quantity = EXCLUDED.quantity
            "#,
        )
        .bind(user.user_id)
        .bind(payload.product_id)
        .bind(payload.size.as_str())
        .bind(payload.quantity)
        .execute(pool)
        .await?;
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_update",
        serde_json::json!({
            "product_id": payload.product_id,
            "size": payload.size,
            "quantity": payload.quantity
        }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::message("Cart Updated"))
}

/// Drop every line for the user. Called after order placement and payment
/// confirmation as its own write.
pub async fn clear_cart(pool: &DbPool, user_id: Uuid) -> AppResult<()> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
