//! storefront: product and order CRUD over PostgreSQL, served with axum.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod telemetry;

pub use config::{DatabaseSettings, LogSettings, Settings};
pub use db::{ensure_database_exists, ensure_schema, Database, Session};
pub use error::{AppError, ConfigError, InsufficientStockError};
pub use repository::{FulfillmentPolicy, ItemStockPolicy, OrderRepository, ProductRepository, UnknownPolicy};
pub use routes::{api_routes, common_routes};
pub use service::CrudService;
pub use state::AppState;
pub use telemetry::init_tracing;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The full service: API routes plus health and docs, with CORS open to any
/// origin, a body size limit and request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(api_routes(state.clone()))
        .merge(common_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
