//! OpenAPI document for the HTTP surface.

use crate::handlers::{orders, products};
use crate::models::{
    OrderCreate, OrderItemCreate, OrderItemResponse, OrderItemUpdate, OrderResponse, OrderStatus, OrderUpdate,
    Product, ProductCreate, ProductUpdate,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        products::list_products,
        products::create_product,
        products::read_product,
        products::update_product,
        products::delete_product,
        orders::list_orders,
        orders::create_order,
        orders::read_order,
        orders::update_order,
        orders::update_order_status,
        orders::delete_order,
    ),
    components(schemas(
        Product,
        ProductCreate,
        ProductUpdate,
        OrderStatus,
        OrderItemCreate,
        OrderCreate,
        OrderItemUpdate,
        OrderUpdate,
        OrderItemResponse,
        OrderResponse,
    )),
    tags(
        (name = "products", description = "Product catalogue and stock"),
        (name = "orders", description = "Orders and their items"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for path in ["/products", "/products/{id}", "/orders", "/orders/{id}", "/orders/{id}/status"] {
            assert!(paths.contains(&path), "missing {}", path);
        }
    }
}
