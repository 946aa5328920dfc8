// ============================================================================
// Transaction Management Module
// ============================================================================
//
// Write transactions for a `Store`: one active transaction at a time, every
// mutation recorded in an undo log so the transaction can be cancelled.
//
// Design Patterns Used:
// - State Pattern: Transaction state management (Active, Committed, Aborted)
// - Command Pattern: Reversible operations for rollback
//
// ============================================================================

pub mod change;
pub mod state;

pub use change::Change;
pub use state::{Transaction, TransactionId, TransactionState};
