// ============================================================================
// List Edits
// ============================================================================
//
// Every list mutation is expressed as a `ListEdit` (Command Pattern). Both the
// unmanaged and the managed backing apply the same edits; the managed backing
// additionally records the returned `ListUndo` in the open write transaction
// so that cancelling the transaction can reverse it.
//
// Edits are validated by `List` before they are applied: indices are always
// in range when `apply` runs.
//
// ============================================================================

use crate::core::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ListEdit {
    Insert { index: usize, value: Value },
    Remove { index: usize },
    Set { index: usize, value: Value },
    Move { from: usize, to: usize },
    Swap { a: usize, b: usize },
    Truncate { len: usize },
}

/// The inverse of an applied [`ListEdit`].
#[derive(Debug, Clone, PartialEq)]
pub enum ListUndo {
    Remove { index: usize },
    Insert { index: usize, value: Value },
    Set { index: usize, value: Value },
    Move { from: usize, to: usize },
    Swap { a: usize, b: usize },
    Extend { values: Vec<Value> },
}

impl ListEdit {
    pub(crate) fn apply(self, values: &mut Vec<Value>) -> ListUndo {
        match self {
            ListEdit::Insert { index, value } => {
                values.insert(index, value);
                ListUndo::Remove { index }
            }
            ListEdit::Remove { index } => {
                let value = values.remove(index);
                ListUndo::Insert { index, value }
            }
            ListEdit::Set { index, value } => {
                let previous = std::mem::replace(&mut values[index], value);
                ListUndo::Set { index, value: previous }
            }
            ListEdit::Move { from, to } => {
                move_value(values, from, to);
                ListUndo::Move { from: to, to: from }
            }
            ListEdit::Swap { a, b } => {
                values.swap(a, b);
                ListUndo::Swap { a, b }
            }
            ListEdit::Truncate { len } => {
                let removed = values.split_off(len);
                ListUndo::Extend { values: removed }
            }
        }
    }
}

impl ListUndo {
    pub(crate) fn revert(self, values: &mut Vec<Value>) {
        match self {
            ListUndo::Remove { index } => {
                values.remove(index);
            }
            ListUndo::Insert { index, value } => values.insert(index, value),
            ListUndo::Set { index, value } => values[index] = value,
            ListUndo::Move { from, to } => move_value(values, from, to),
            ListUndo::Swap { a, b } => values.swap(a, b),
            ListUndo::Extend { values: removed } => values.extend(removed),
        }
    }
}

// Post-removal indexing: the element ends up at `to` of the final sequence.
fn move_value(values: &mut Vec<Value>, from: usize, to: usize) {
    let value = values.remove(from);
    values.insert(to, value);
}
