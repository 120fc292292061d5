use axum_storefront_api::{
    dto::orders::{CheckoutSessionResponse, PlaceOrderRequest},
    gateway::checkout_session_form,
    response::{ApiResponse, PageInfo},
    routes::params::OrderListQuery,
    services::order_service::validate_order_status,
};
use uuid::Uuid;

#[test]
fn status_validation_accepts_the_seven_known_values() {
    for status in [
        "Order Placed",
        "Processing",
        "Packed",
        "Shipped",
        "Out for delivery",
        "Delivered",
        "Cancelled",
    ] {
        assert!(validate_order_status(status).is_ok(), "{status} rejected");
    }
}

#[test]
fn status_validation_rejects_unknown_values() {
    for status in ["Returned", "order placed", "Out For Delivery", "", "placed"] {
        let err = validate_order_status(status).expect_err(status);
        assert_eq!(err.to_string(), "Invalid status value");
    }
}

#[test]
fn page_info_has_more_iff_pages_remain() {
    let cases = [
        // (page, limit, total, total_pages, has_more)
        (1, 10, 25, 3, true),
        (2, 10, 25, 3, true),
        (3, 10, 25, 3, false),
        (1, 10, 10, 1, false),
        (1, 10, 11, 2, true),
        (1, 10, 0, 0, false),
        (5, 10, 25, 3, false),
    ];
    for (page, limit, total, total_pages, has_more) in cases {
        let info = PageInfo::new(page, limit, total);
        assert_eq!(info.current_page, page);
        assert_eq!(info.total_orders, total);
        assert_eq!(info.total_pages, total_pages, "pages for {page}/{limit}/{total}");
        assert_eq!(info.has_more, has_more, "hasMore for {page}/{limit}/{total}");
        // hasMore is equivalent to page * limit < total for in-range pages.
        if page <= total_pages {
            assert_eq!(info.has_more, page * limit < total);
        }
    }
}

#[test]
fn pagination_normalizes_defaults_and_bounds() {
    let query = |page, limit| OrderListQuery {
        page,
        limit,
        status: None,
        payment_method: None,
    };
    assert_eq!(query(None, None).normalize_pagination(), (1, 10, 0));
    assert_eq!(query(Some(0), Some(1000)).normalize_pagination(), (1, 100, 0));
    assert_eq!(query(Some(3), Some(20)).normalize_pagination(), (3, 20, 40));
}

#[test]
fn checkout_form_maps_items_and_appends_delivery_line() {
    let order_id = Uuid::new_v4();
    let body = serde_json::json!({
        "address": sample_address_json(),
        "amount": 598,
        "items": [
            { "productId": Uuid::new_v4(), "name": "Classic Cotton Tee", "price": 399, "size": "M", "quantity": 1 },
            { "productId": Uuid::new_v4(), "name": "Relaxed Fit Jeans", "price": 75, "size": "L", "quantity": 2 },
        ],
    });
    let payload: PlaceOrderRequest = serde_json::from_value(body).unwrap();

    let form = checkout_session_form("https://shop.example", order_id, &payload.items, 49);
    let get = |key: &str| -> &str {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing form key {key}"))
    };

    assert_eq!(get("mode"), "payment");
    assert_eq!(
        get("success_url"),
        format!("https://shop.example/verify?success=true&orderId={order_id}")
    );
    assert_eq!(
        get("cancel_url"),
        format!("https://shop.example/verify?success=false&orderId={order_id}")
    );

    // Snapshot lines map 1:1, minor units.
    assert_eq!(get("line_items[0][price_data][currency]"), "inr");
    assert_eq!(
        get("line_items[0][price_data][product_data][name]"),
        "Classic Cotton Tee"
    );
    assert_eq!(get("line_items[0][price_data][unit_amount]"), "39900");
    assert_eq!(get("line_items[0][quantity]"), "1");
    assert_eq!(get("line_items[1][price_data][unit_amount]"), "7500");
    assert_eq!(get("line_items[1][quantity]"), "2");

    // The synthetic delivery line comes last.
    assert_eq!(
        get("line_items[2][price_data][product_data][name]"),
        "Delivery Charges"
    );
    assert_eq!(get("line_items[2][price_data][unit_amount]"), "4900");
    assert_eq!(get("line_items[2][quantity]"), "1");
}

#[test]
fn response_envelope_flattens_payload_next_to_success() {
    let resp = ApiResponse::ok(CheckoutSessionResponse {
        session_url: "https://checkout.stripe.com/pay/cs_test".to_string(),
    });
    let value = serde_json::to_value(&resp).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "success": true,
            "session_url": "https://checkout.stripe.com/pay/cs_test",
        })
    );

    let message = ApiResponse::message("Order Placed");
    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(
        value,
        serde_json::json!({ "success": true, "message": "Order Placed" })
    );
}

#[test]
fn place_order_request_accepts_storefront_body() {
    let body = serde_json::json!({
        "address": sample_address_json(),
        "amount": 598,
        "items": [
            { "productId": "7f2c1f6e-58a4-4b7a-9f3d-2b45cb6a8a11", "name": "Classic Cotton Tee", "price": 549, "size": "M", "quantity": 1 },
        ],
    });
    let payload: PlaceOrderRequest = serde_json::from_value(body).unwrap();
    assert_eq!(payload.amount, 598);
    assert_eq!(payload.items.len(), 1);
    assert_eq!(payload.items[0].name, "Classic Cotton Tee");
    assert_eq!(payload.items[0].size, "M");
    assert_eq!(payload.address.city, "Mumbai");
    assert_eq!(payload.address.zipcode, "400001");
}

fn sample_address_json() -> serde_json::Value {
    serde_json::json!({
        "firstName": "Asha",
        "lastName": "Verma",
        "email": "asha@example.com",
        "street": "14 MG Road",
        "city": "Mumbai",
        "state": "MH",
        "zipcode": "400001",
        "country": "India",
        "phone": "+91-9000000000",
    })
}
