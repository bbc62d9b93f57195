//! Order handlers. Stock checks and item writes live in [`OrderRepository`](crate::repository::OrderRepository).

use super::{empty_list, list_window, parse_id, query_error, ListParams};
use crate::error::AppError;
use crate::extractors::ValidJson;
use crate::models::{OrderCreate, OrderField, OrderResponse, OrderUpdate, StatusParams};
use crate::response::{success_created, success_one, success_page};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::IntoResponse,
};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Order {} not found", id))
}

#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    params(ListParams),
    responses(
        (status = 200, description = "Page of orders with their items", body = [OrderResponse]),
        (status = 400, description = "Unknown order_by field"),
        (status = 404, description = "No orders in the window"),
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset, order_by) = list_window(params, OrderField::CreatedAt)?;
    let orders = state.orders.list_orders(limit, offset, order_by).await?;
    if orders.is_empty() {
        return Err(empty_list());
    }
    Ok(success_page(orders, limit, offset))
}

#[utoipa::path(
    post,
    path = "/orders",
    tag = "orders",
    request_body = OrderCreate,
    responses(
        (status = 201, description = "Created order", body = OrderResponse),
        (status = 400, description = "Insufficient stock"),
        (status = 422, description = "Invalid payload"),
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<OrderCreate>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.orders.create_order(body).await?;
    Ok(success_created(order))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "orders",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items", body = OrderResponse),
        (status = 404, description = "No such order"),
    )
)]
pub async fn read_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let order = state.orders.read_order(id).await?.ok_or_else(|| not_found(id))?;
    Ok(success_one(order))
}

#[utoipa::path(
    put,
    path = "/orders/{id}",
    tag = "orders",
    params(("id" = i64, Path, description = "Order id")),
    request_body = OrderUpdate,
    responses(
        (status = 200, description = "Order after upserting items", body = OrderResponse),
        (status = 400, description = "Insufficient stock"),
        (status = 404, description = "No such order, or no items given"),
    )
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<OrderUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let order = state
        .orders
        .update_order(id, body)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(success_one(order))
}

#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    tag = "orders",
    params(("id" = i64, Path, description = "Order id"), StatusParams),
    responses(
        (status = 200, description = "Order with new status", body = OrderResponse),
        (status = 404, description = "No such order"),
        (status = 422, description = "Unknown status"),
    )
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<StatusParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let Query(params) = params.map_err(query_error)?;
    let order = state
        .orders
        .update_order_status(id, params.new_status)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(success_one(order))
}

#[utoipa::path(
    delete,
    path = "/orders/{id}",
    tag = "orders",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order as it was before deletion", body = OrderResponse),
        (status = 404, description = "No such order"),
    )
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let order = state.orders.delete_order(id).await?.ok_or_else(|| not_found(id))?;
    Ok(success_one(order))
}
