use super::UnknownField;
use crate::service::{HasMany, Model};
use crate::sql::{BindValue, Column};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Stored as the PostgreSQL enum `order_status`. Any status may follow any other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    InProgress,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown order status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(OrderStatus::InProgress),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = UnknownStatus;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<OrderStatus> for BindValue {
    fn from(s: OrderStatus) -> Self {
        BindValue::Text(s.as_str().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    /// Filled only when loaded with [`Order::items`].
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

impl Order {
    pub const ID: Column = Column::new("orders", "id");
    pub const CREATED_AT: Column = Column::new("orders", "created_at");
    pub const STATUS: Column = Column::typed("orders", "status", "order_status");

    /// Eager-load directive for the order's items.
    pub fn items() -> HasMany<Order, OrderItem> {
        HasMany {
            foreign_key: OrderItem::ORDER_ID,
            parent_key: |order| order.id,
            child_key: |item| item.order_id,
            attach: |order, items| order.items = items,
        }
    }
}

impl Model for Order {
    const TABLE: &'static str = "orders";
    const COLUMNS: &'static [Column] = &[Order::ID, Order::CREATED_AT, Order::STATUS];
    const PRIMARY_KEY: Column = Order::ID;

    fn primary_key(&self) -> i64 {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

impl OrderItem {
    pub const ID: Column = Column::new("order_items", "id");
    pub const ORDER_ID: Column = Column::new("order_items", "order_id");
    pub const PRODUCT_ID: Column = Column::new("order_items", "product_id");
    pub const QUANTITY: Column = Column::new("order_items", "quantity");
}

impl Model for OrderItem {
    const TABLE: &'static str = "order_items";
    const COLUMNS: &'static [Column] = &[
        OrderItem::ID,
        OrderItem::ORDER_ID,
        OrderItem::PRODUCT_ID,
        OrderItem::QUANTITY,
    ];
    const PRIMARY_KEY: Column = OrderItem::ID;

    fn primary_key(&self) -> i64 {
        self.id
    }
}

/// Fields an order list can be ordered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderField {
    Id,
    CreatedAt,
    Status,
}

impl OrderField {
    pub fn column(self) -> Column {
        match self {
            OrderField::Id => Order::ID,
            OrderField::CreatedAt => Order::CREATED_AT,
            OrderField::Status => Order::STATUS,
        }
    }
}

impl FromStr for OrderField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(OrderField::Id),
            "created_at" => Ok(OrderField::CreatedAt),
            "status" => Ok(OrderField::Status),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemCreate {
    pub product_id: i64,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

/// An order may be created without items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderCreate {
    #[serde(default)]
    pub status: OrderStatus,
    #[validate(nested)]
    pub items: Vec<OrderItemCreate>,
}

/// Upsert of one line: keyed by product within the order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemUpdate {
    pub product_id: i64,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

/// `status` is accepted but not applied here; use the status endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderUpdate {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Option<Vec<OrderItemUpdate>>,
}

#[derive(Clone, Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusParams {
    pub new_status: OrderStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    /// Flatten an order and its loaded items into the wire shape.
    pub fn from_order(order: &Order) -> Self {
        OrderResponse {
            id: order.id,
            created_at: order.created_at,
            status: order.status,
            items: order
                .items
                .iter()
                .map(|item| OrderItemResponse {
                    id: item.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_order() -> Order {
        Order {
            id: 4,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            status: OrderStatus::Shipped,
            items: vec![
                OrderItem {
                    id: 10,
                    order_id: 4,
                    product_id: 1,
                    quantity: 3,
                },
                OrderItem {
                    id: 11,
                    order_id: 4,
                    product_id: 2,
                    quantity: 1,
                },
            ],
        }
    }

    #[test]
    fn response_keeps_header_and_projects_items() {
        let order = sample_order();
        let response = OrderResponse::from_order(&order);
        assert_eq!(response.id, 4);
        assert_eq!(response.created_at, order.created_at);
        assert_eq!(response.status, OrderStatus::Shipped);
        assert_eq!(
            response.items,
            vec![
                OrderItemResponse {
                    id: 10,
                    product_id: 1,
                    quantity: 3
                },
                OrderItemResponse {
                    id: 11,
                    product_id: 2,
                    quantity: 1
                },
            ]
        );
    }

    #[test]
    fn response_without_loaded_items_is_empty() {
        let mut order = sample_order();
        order.items.clear();
        assert!(OrderResponse::from_order(&order).items.is_empty());
    }

    #[test]
    fn response_serializes_status_by_name() {
        let json = serde_json::to_value(OrderResponse::from_order(&sample_order())).unwrap();
        assert_eq!(json["status"], "SHIPPED");
        assert_eq!(json["items"][0]["product_id"], 1);
        assert!(json["items"][0].get("order_id").is_none());
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [OrderStatus::InProgress, OrderStatus::Shipped, OrderStatus::Delivered] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!(OrderStatus::try_from("LOST".to_string()).is_err());
        assert_eq!(BindValue::from(OrderStatus::Delivered), BindValue::Text("DELIVERED".into()));
    }

    #[test]
    fn order_field_parsing() {
        assert_eq!("created_at".parse::<OrderField>(), Ok(OrderField::CreatedAt));
        assert!("items".parse::<OrderField>().is_err());
        assert_eq!(OrderField::Status.column(), Order::STATUS);
    }

    #[test]
    fn create_payload_defaults_status() {
        let order: OrderCreate =
            serde_json::from_str(r#"{"items": [{"product_id": 1, "quantity": 2}]}"#).unwrap();
        assert_eq!(order.status, OrderStatus::InProgress);
        assert_eq!(order.items.len(), 1);
    }

    #[test]
    fn order_items_need_positive_quantity() {
        let empty = OrderCreate {
            status: OrderStatus::InProgress,
            items: vec![],
        };
        assert!(empty.validate().is_ok());

        let zero = OrderCreate {
            status: OrderStatus::InProgress,
            items: vec![
                OrderItemCreate {
                    product_id: 1,
                    quantity: 2,
                },
                OrderItemCreate {
                    product_id: 2,
                    quantity: 0,
                },
            ],
        };
        assert!(zero.validate().is_err());

        let update = OrderUpdate {
            status: None,
            items: Some(vec![OrderItemUpdate {
                product_id: 1,
                quantity: 0,
            }]),
        };
        assert!(update.validate().is_err());
        assert!(OrderUpdate::default().validate().is_ok());
    }
}
