//! Product and order routes.

use crate::handlers::{orders, products};
use crate::state::AppState;
use axum::{
    routing::{get, patch},
    Router,
};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/:id",
            get(products::read_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route(
            "/orders/:id",
            get(orders::read_order)
                .put(orders::update_order)
                .delete(orders::delete_order),
        )
        .route("/orders/:id/status", patch(orders::update_order_status))
        .with_state(state)
}
