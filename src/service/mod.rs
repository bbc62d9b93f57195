//! CrudService: generic CRUD using the safe SQL builder.

mod crud;
mod model;
pub use crud::CrudService;
pub use model::{EagerLoad, HasMany, ListQuery, Model};
