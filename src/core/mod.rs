pub mod error;
pub mod types;
pub mod value;

pub use error::{DbError, Result};
pub use types::{AddableType, ListElement, MinMaxType, Primitive, SortableType};
pub use value::{ElementType, Value};
