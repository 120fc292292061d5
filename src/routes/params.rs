use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    #[serde(rename = "paymentMethod")]
    pub payment_method: Option<String>,
}

impl OrderListQuery {
    /// Clamp to sane bounds: page from 1, limit 1..=100 (default 10).
    pub fn normalize_pagination(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(10).clamp(1, 100);
        let offset = (page - 1) * limit;
        (page, limit, offset)
    }
}
