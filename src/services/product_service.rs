use std::path::Path;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{
        AddProductRequest, ProductListResponse, ProductResponse, UpdateProductRequest,
    },
    entity::products::{ActiveModel, Entity as Products, Model as ProductModel, StringList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::ApiResponse,
    state::AppState,
};

pub async fn add_product(
    state: &AppState,
    user: &AuthUser,
    payload: AddProductRequest,
) -> AppResult<ApiResponse<ProductResponse>> {
    ensure_admin(user)?;

    if payload.images.is_empty() {
        return Err(AppError::BadRequest(
            "At least one image is required".to_string(),
        ));
    }

    let id = Uuid::new_v4();
    let sub_category = payload
        .sub_category
        .unwrap_or_else(|| payload.category.clone());
    let active = ActiveModel {
        id: Set(id),
        name: Set(payload.name),
        description: Set(payload.description),
        details: Set(StringList(payload.details)),
        price: Set(payload.price),
        category: Set(payload.category),
        sub_category: Set(sub_category),
        images: Set(StringList(payload.images)),
        sizes: Set(StringList(payload.sizes)),
        bestseller: Set(payload.bestseller),
        created_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        serde_json::json!({ "product_id": product.id }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(ProductResponse {
        product: product_from_entity(product),
    }))
}

pub async fn list_products(state: &AppState) -> AppResult<ApiResponse<ProductListResponse>> {
    let products = Products::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    Ok(ApiResponse::ok(ProductListResponse { products }))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductResponse>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(product_from_entity);
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound("Product not found".to_string())),
    };

    Ok(ApiResponse::ok(ProductResponse { product }))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductResponse>> {
    ensure_admin(user)?;

    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound("Product not found".to_string())),
    };

    // Appends first, then removals, so an image can be replaced in one call.
    let mut images = existing.images.0.clone();
    images.extend(payload.images.iter().cloned());
    let removed: Vec<String> = payload
        .delete_images
        .iter()
        .filter(|path| images.contains(*path))
        .cloned()
        .collect();
    images.retain(|path| !removed.contains(path));

    if images.is_empty() {
        return Err(AppError::BadRequest(
            "Product must have at least one image".to_string(),
        ));
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(details) = payload.details {
        active.details = Set(StringList(details));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(sub_category) = payload.sub_category {
        active.sub_category = Set(sub_category);
    }
    if let Some(sizes) = payload.sizes {
        active.sizes = Set(StringList(sizes));
    }
    if let Some(bestseller) = payload.bestseller {
        active.bestseller = Set(bestseller);
    }
    active.images = Set(StringList(images));

    let product = active.update(&state.orm).await?;

    remove_image_files(&removed).await;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_update",
        serde_json::json!({ "product_id": product.id }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::with_message(
        "Product updated successfully",
        ProductResponse {
            product: product_from_entity(product),
        },
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound("Product not found".to_string())),
    };

    let images = existing.images.0.clone();
    Products::delete_by_id(id).exec(&state.orm).await?;

    remove_image_files(&images).await;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        serde_json::json!({ "product_id": id }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::message("Product deleted"))
}

/// Best-effort removal of stored image files; only paths under the uploads
/// directory are touched.
async fn remove_image_files(paths: &[String]) {
    for path in paths {
        let Some(relative) = path.strip_prefix("/uploads/") else {
            continue;
        };
        if relative.contains("..") {
            continue;
        }
        let file = Path::new("uploads").join(relative);
        if let Err(err) = tokio::fs::remove_file(&file).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %err, path = %file.display(), "image file removal failed");
            }
        }
    }
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        details: model.details.0,
        price: model.price,
        category: model.category,
        sub_category: model.sub_category,
        images: model.images.0,
        sizes: model.sizes.0,
        bestseller: model.bestseller,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
