//! Record kinds, their typed columns, and request/response schemas.

mod order;
mod product;

pub use order::*;
pub use product::*;

use thiserror::Error;
use validator::ValidationError;

/// A sort or filter field name that the record kind does not have.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown field '{0}'")]
pub struct UnknownField(pub String);

/// Rejects NaN and the infinities, which pass range checks.
fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        let mut error = ValidationError::new("finite");
        error.message = Some("must be a finite number".into());
        Err(error)
    }
}
