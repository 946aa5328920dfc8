// ============================================================================
// Transaction Change Tracking
// ============================================================================
//
// Implements the Command Pattern for reversible store operations.
// Each Change records how to undo one mutation made inside a write
// transaction; cancelling the transaction reverts them newest-first.
//
// ============================================================================

use crate::list::ListUndo;
use crate::object::ObjectId;
use crate::storage::ObjectRecord;

/// Represents a single reversible change in a write transaction
#[derive(Debug, Clone)]
pub enum Change {
    /// An object was added to the store
    AddObject { id: ObjectId },

    /// An object was deleted; `record` is its content at deletion time
    DeleteObject { id: ObjectId, record: ObjectRecord },

    /// An object type was registered by the first `add` of that type
    RegisterSchema { name: String },

    /// One edit of a managed list
    ListEdit {
        id: ObjectId,
        property: String,
        undo: ListUndo,
    },
}
