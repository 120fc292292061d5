use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddProductRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub details: Vec<String>,
    pub price: i64,
    pub category: String,
    pub sub_category: Option<String>,
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub bestseller: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub details: Option<Vec<String>>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    /// New image paths appended to the existing set.
    #[serde(default)]
    pub images: Vec<String>,
    /// Image paths removed from the set; their files are unlinked.
    #[serde(default)]
    pub delete_images: Vec<String>,
    pub sizes: Option<Vec<String>>,
    pub bestseller: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub product: Product,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
}
