//! HTTP handlers for products and orders.

pub mod orders;
pub mod products;

use crate::error::AppError;
use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use serde::Deserialize;
use std::str::FromStr;
use utoipa::IntoParams;

pub const DEFAULT_LIMIT: u64 = 50;
pub const MAX_LIMIT: u64 = 100;

/// Pagination and ordering for list endpoints.
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page size, 1 to 100. Defaults to 50.
    pub limit: Option<u64>,
    /// Rows to skip. Defaults to 0.
    pub offset: Option<u64>,
    /// Field to sort ascending by.
    pub order_by: Option<String>,
}

/// Checked list window: `(limit, offset, field)`.
pub(crate) fn list_window<F: FromStr>(
    params: Result<Query<ListParams>, QueryRejection>,
    default_order_by: F,
) -> Result<(u64, u64, F), AppError> {
    let Query(params) = params.map_err(query_error)?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }
    let offset = params.offset.unwrap_or(0);
    if offset > i64::MAX as u64 {
        return Err(AppError::Validation(format!(
            "offset must be at most {}",
            i64::MAX
        )));
    }
    let order_by = match params.order_by.as_deref() {
        Some(field) => field
            .parse::<F>()
            .map_err(|_| AppError::BadRequest("Invalid order_by column".into()))?,
        None => default_order_by,
    };
    Ok((limit, offset, order_by))
}

pub(crate) fn query_error(rejection: QueryRejection) -> AppError {
    AppError::Validation(rejection.body_text())
}

pub(crate) fn parse_id(id: &str) -> Result<i64, AppError> {
    id.parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", id)))
}

pub(crate) fn empty_list() -> AppError {
    AppError::NotFound("Empty List".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderField, ProductField};

    fn params(limit: Option<u64>, order_by: Option<&str>) -> Result<Query<ListParams>, QueryRejection> {
        Ok(Query(ListParams {
            limit,
            offset: None,
            order_by: order_by.map(str::to_string),
        }))
    }

    #[test]
    fn window_defaults() {
        let (limit, offset, field) = list_window(params(None, None), ProductField::Name).unwrap();
        assert_eq!((limit, offset, field), (50, 0, ProductField::Name));
    }

    #[test]
    fn window_rejects_limit_out_of_range() {
        for limit in [0, 101] {
            let err = list_window(params(Some(limit), None), OrderField::CreatedAt).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "limit {}", limit);
        }
        assert!(list_window(params(Some(100), None), OrderField::CreatedAt).is_ok());
    }

    #[test]
    fn window_rejects_offset_beyond_bigint() {
        let window = |offset| {
            list_window(
                Ok(Query(ListParams {
                    offset: Some(offset),
                    ..ListParams::default()
                })),
                ProductField::Id,
            )
        };
        let err = window(i64::MAX as u64 + 1).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(matches!(window(u64::MAX), Err(AppError::Validation(_))));
        let (_, offset, _) = window(i64::MAX as u64).unwrap();
        assert_eq!(offset, i64::MAX as u64);
    }

    #[test]
    fn window_rejects_unknown_order_by() {
        let err = list_window(params(None, Some("password")), ProductField::Name).unwrap_err();
        match err {
            AppError::BadRequest(message) => assert_eq!(message, "Invalid order_by column"),
            other => panic!("unexpected error: {:?}", other),
        }
        let (_, _, field) = list_window(params(None, Some("status")), OrderField::CreatedAt).unwrap();
        assert_eq!(field, OrderField::Status);
    }

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("abc"), Err(AppError::BadRequest(_))));
    }
}
