mod cart;
mod health;
mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use cart::CART_PATH;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/product", get(products::list_products))
        .route("/product-detail/{id}", get(products::get_product))
        .route("/special-tags", get(products::special_tags))
        .route(CART_PATH, get(cart::view_cart).post(cart::update_cart))
        .route("/add-to-cart/{id}", post(cart::add_to_cart))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}
