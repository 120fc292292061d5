use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Address, LineItem, Order};
use crate::response::PageInfo;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub address: Address,
    pub items: Vec<LineItem>,
    /// Total charge including the delivery fee, computed by the client and
    /// stored as-is.
    pub amount: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub order_id: Uuid,
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyStripeRequest {
    pub order_id: Uuid,
    pub success: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutSessionResponse {
    pub session_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order: Order,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserOrdersResponse {
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
    pub pagination: PageInfo,
}
