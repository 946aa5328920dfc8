// ============================================================================
// primdb Library
// ============================================================================
//
// An embedded object store whose objects own typed lists of primitive
// values. Lists work the same whether their object is unmanaged (held only
// in memory) or managed by a transactional `Store`.
//
// ============================================================================

//! Typed lists of primitive values, owned by objects that are either held
//! in memory or managed by a transactional [`Store`].
//!
//! Open an in-memory store, add an object and edit one of its lists:
//!
//! ```
//! use primdb::{Object, ObjectSchema, Store, StoreConfig};
//!
//! # fn main() -> primdb::Result<()> {
//! let store = Store::open(StoreConfig::in_memory("docs"))?;
//! let person = Object::new(ObjectSchema::new("Person").list::<String>("nicknames"));
//!
//! store.write(|store| {
//!     store.add(&person)?;
//!     person.list::<String>("nicknames")?.push("Bob".to_string())
//! })?;
//!
//! let nicknames = person.list::<String>("nicknames")?;
//! assert!(nicknames.is_managed());
//! assert_eq!(nicknames.to_vec()?, vec!["Bob".to_string()]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod list;
pub mod object;
pub mod storage;
pub mod transaction;

// Re-export main types for convenience
pub use config::{StoreConfig, StoreKind};
pub use core::{
    AddableType, DbError, ElementType, ListElement, MinMaxType, Primitive, Result, SortableType,
    Value,
};
pub use list::{List, SortedList};
pub use object::{ListProperty, Object, ObjectId, ObjectSchema};
pub use storage::{Migration, Store, StoreSnapshot};

/// The crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
