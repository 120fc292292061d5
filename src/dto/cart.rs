use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CartLine;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub size: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub product_id: Uuid,
    pub size: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub cart: Vec<CartLine>,
}
