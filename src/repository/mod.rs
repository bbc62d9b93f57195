//! Product and order workflows composed from the generic engine.

mod order;
mod product;

pub use order::{plan_stock, FulfillmentPolicy, ItemStockPolicy, OrderRepository, UnknownPolicy};
pub use product::ProductRepository;
