use super::{validate_finite, UnknownField};
use crate::service::Model;
use crate::sql::Column;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock_quantity: i32,
}

impl Product {
    pub const ID: Column = Column::new("products", "id");
    pub const NAME: Column = Column::new("products", "name");
    pub const DESCRIPTION: Column = Column::new("products", "description");
    pub const PRICE: Column = Column::new("products", "price");
    pub const STOCK_QUANTITY: Column = Column::new("products", "stock_quantity");
}

impl Model for Product {
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [Column] = &[
        Product::ID,
        Product::NAME,
        Product::DESCRIPTION,
        Product::PRICE,
        Product::STOCK_QUANTITY,
    ];
    const PRIMARY_KEY: Column = Product::ID;

    fn primary_key(&self) -> i64 {
        self.id
    }
}

/// Fields a product list can be ordered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductField {
    Id,
    Name,
    Description,
    Price,
    StockQuantity,
}

impl ProductField {
    pub fn column(self) -> Column {
        match self {
            ProductField::Id => Product::ID,
            ProductField::Name => Product::NAME,
            ProductField::Description => Product::DESCRIPTION,
            ProductField::Price => Product::PRICE,
            ProductField::StockQuantity => Product::STOCK_QUANTITY,
        }
    }
}

impl FromStr for ProductField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(ProductField::Id),
            "name" => Ok(ProductField::Name),
            "description" => Ok(ProductField::Description),
            "price" => Ok(ProductField::Price),
            "stock_quantity" => Ok(ProductField::StockQuantity),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProductCreate {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(
        range(exclusive_min = 0.0, message = "price must be greater than 0"),
        custom(function = "validate_finite")
    )]
    pub price: f64,
    #[validate(range(min = 0, message = "stock_quantity must be at least 0"))]
    pub stock_quantity: i32,
}

/// Partial update. Absent fields are left alone; `"description": null` clears the description.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        range(exclusive_min = 0.0, message = "price must be greater than 0"),
        custom(function = "validate_finite")
    )]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "stock_quantity must be at least 0"))]
    pub stock_quantity: Option<i32>,
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
