use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, RegisterRequest, TokenResponse, UserDetailsResponse},
        cart::{AddToCartRequest, CartResponse, UpdateCartRequest},
        orders::{
            CheckoutSessionResponse, OrderListResponse, OrderResponse, PlaceOrderRequest,
            UpdateStatusRequest, UserOrdersResponse, VerifyStripeRequest,
        },
        products::{
            AddProductRequest, ProductListResponse, ProductResponse, UpdateProductRequest,
        },
    },
    models::{Address, CartLine, LineItem, Order, Product, UserProfile},
    response::{ApiResponse, PageInfo},
    routes::{cart, health, orders, params, products, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::register,
        users::login,
        users::admin_login,
        users::create_admin,
        users::details,
        users::verify_token,
        products::add_product,
        products::list_products,
        products::get_product,
        products::update_product,
        products::delete_product,
        cart::add_to_cart,
        cart::update_cart,
        cart::get_cart,
        orders::place_order,
        orders::place_order_stripe,
        orders::update_status,
        orders::all_orders,
        orders::user_orders,
        orders::verify_stripe
    ),
    components(
        schemas(
            UserProfile,
            Product,
            Address,
            LineItem,
            Order,
            CartLine,
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            UserDetailsResponse,
            AddProductRequest,
            UpdateProductRequest,
            ProductResponse,
            ProductListResponse,
            AddToCartRequest,
            UpdateCartRequest,
            CartResponse,
            PlaceOrderRequest,
            UpdateStatusRequest,
            VerifyStripeRequest,
            CheckoutSessionResponse,
            OrderResponse,
            OrderListResponse,
            UserOrdersResponse,
            params::OrderListQuery,
            PageInfo,
            ApiResponse<ProductResponse>,
            ApiResponse<OrderListResponse>,
            ApiResponse<UserOrdersResponse>,
            ApiResponse<CheckoutSessionResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "Registration and sign-in"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Server-mirrored cart"),
        (name = "Orders", description = "Order lifecycle and payment"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
