//! Product CRUD handlers.

use super::{empty_list, list_window, parse_id, ListParams};
use crate::error::AppError;
use crate::extractors::ValidJson;
use crate::models::{Product, ProductCreate, ProductField, ProductUpdate};
use crate::response::{success_created, success_one, success_page};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::IntoResponse,
};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Product {} not found", id))
}

#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    params(ListParams),
    responses(
        (status = 200, description = "Page of products", body = [Product]),
        (status = 400, description = "Unknown order_by field"),
        (status = 404, description = "No products in the window"),
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset, order_by) = list_window(params, ProductField::Name)?;
    let products = state.products.list_products(limit, offset, order_by).await?;
    if products.is_empty() {
        return Err(empty_list());
    }
    Ok(success_page(products, limit, offset))
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    request_body = ProductCreate,
    responses(
        (status = 201, description = "Created product", body = Product),
        (status = 422, description = "Invalid payload"),
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<ProductCreate>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.products.create_product(body).await?;
    Ok(success_created(product))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "No such product"),
    )
)]
pub async fn read_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let product = state.products.read_product(id).await?.ok_or_else(|| not_found(id))?;
    Ok(success_one(product))
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ProductUpdate,
    responses(
        (status = 200, description = "Updated product", body = Product),
        (status = 404, description = "No such product"),
        (status = 422, description = "Invalid payload"),
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<ProductUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let product = state
        .products
        .update_product(id, body)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(success_one(product))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Deleted product", body = Product),
        (status = 404, description = "No such product"),
        (status = 409, description = "Product is referenced by an order"),
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let product = state
        .products
        .delete_product(id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(success_one(product))
}
