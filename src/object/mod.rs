pub mod handle;
pub mod schema;

pub use handle::{Object, ObjectId};
pub(crate) use handle::{ObjectState, invalidated_error};
pub use schema::{ListProperty, ObjectSchema, schemas_match};
