//! Stripe Checkout over the REST API (no SDK dependency).

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::LineItem;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
const CURRENCY: &str = "inr";

#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: Option<String>,
}

impl StripeGateway {
    pub fn new(secret_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
        }
    }

    /// Create a payment-mode Checkout Session for an order snapshot and return
    /// the hosted page URL. Both redirect URLs point back at the verification
    /// endpoint with the order id carried as a query parameter.
    pub async fn create_checkout_session(
        &self,
        origin: &str,
        order_id: Uuid,
        items: &[LineItem],
        delivery_charge: i64,
    ) -> AppResult<String> {
        let secret_key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| AppError::Gateway("STRIPE_SECRET_KEY is not configured".to_string()))?;

        let form = checkout_session_form(origin, order_id, items, delivery_charge);
        let resp: serde_json::Value = self
            .client
            .post(format!("{STRIPE_API_BASE}/checkout/sessions"))
            .basic_auth(secret_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?
            .json()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        resp["url"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| AppError::Gateway(format!("Stripe checkout session failed: {resp}")))
    }
}

/// Form parameters for a Checkout Session: one line item per snapshot line
/// plus a synthetic delivery-charge line. Unit amounts are minor units.
pub fn checkout_session_form(
    origin: &str,
    order_id: Uuid,
    items: &[LineItem],
    delivery_charge: i64,
) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        (
            "success_url".to_string(),
            format!("{origin}/verify?success=true&orderId={order_id}"),
        ),
        (
            "cancel_url".to_string(),
            format!("{origin}/verify?success=false&orderId={order_id}"),
        ),
    ];

    for (i, item) in items.iter().enumerate() {
        form.push((
            format!("line_items[{i}][price_data][currency]"),
            CURRENCY.to_string(),
        ));
        form.push((
            format!("line_items[{i}][price_data][product_data][name]"),
            item.name.clone(),
        ));
        form.push((
            format!("line_items[{i}][price_data][unit_amount]"),
            (item.price * 100).to_string(),
        ));
        form.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
    }

    let i = items.len();
    form.push((
        format!("line_items[{i}][price_data][currency]"),
        CURRENCY.to_string(),
    ));
    form.push((
        format!("line_items[{i}][price_data][product_data][name]"),
        "Delivery Charges".to_string(),
    ));
    form.push((
        format!("line_items[{i}][price_data][unit_amount]"),
        (delivery_charge * 100).to_string(),
    ));
    form.push((format!("line_items[{i}][quantity]"), "1".to_string()));

    form
}
