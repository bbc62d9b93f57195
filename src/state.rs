//! Shared application state for all routes.

use crate::db::Database;
use crate::repository::{FulfillmentPolicy, OrderRepository, ProductRepository};

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub products: ProductRepository,
    pub orders: OrderRepository,
}

impl AppState {
    pub fn new(db: Database, policy: FulfillmentPolicy) -> Self {
        AppState {
            products: ProductRepository::new(db.clone()),
            orders: OrderRepository::new(db.clone(), policy),
            db,
        }
    }
}
