//! JSON body extractor that runs `validator` rules before the handler sees the payload.

use crate::error::AppError;
use crate::MAX_BODY_BYTES;
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Deserialized and validated request body.
///
/// A body that parses but breaks a field rule, or whose fields have the wrong
/// shape, is rejected with 422. A body that is not JSON at all is rejected with 400.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection.status() {
        StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(rejection.body_text()),
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge {
            limit: MAX_BODY_BYTES,
        },
        _ => AppError::BadRequest(rejection.body_text()),
    }
}
