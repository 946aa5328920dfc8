pub mod migration;
pub mod persistence;
pub mod record;
pub mod store;

pub use migration::Migration;
pub use persistence::{SnapshotManager, StoreSnapshot, FORMAT_VERSION};
pub use record::ObjectRecord;
pub use store::Store;
