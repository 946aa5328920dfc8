// ============================================================================
// List
// ============================================================================
//
// `List<T>` is the typed handle to one list property of an `Object`.
// Storage is type-erased (`Vec<Value>`); `T` fixes the element type and
// nullability at the access site.
//
// Unmanaged lists live in the object. Managed lists live in the object's
// store, require an open write transaction to mutate, and fail with
// `Invalidated` once the object is deleted.
//
// Every call checks, in order: invalidation, write transaction (managed
// mutations only), arguments. A failed call changes nothing.
//
// ============================================================================

pub(crate) mod aggregate;
pub(crate) mod edit;
pub mod sorted;

pub(crate) use edit::ListEdit;
pub use edit::ListUndo;
pub use sorted::SortedList;

use crate::core::{
    AddableType, DbError, ListElement, MinMaxType, Primitive, Result, SortableType, Value,
};
use crate::object::{ListProperty, Object};
use crate::storage::Store;
use std::fmt;
use std::marker::PhantomData;

/// The only key path primitive lists understand.
pub const SELF_KEY_PATH: &str = "self";

pub struct List<T: ListElement> {
    object: Object,
    property: ListProperty,
    _element: PhantomData<fn() -> T>,
}

impl<T: ListElement> List<T> {
    pub(crate) fn new(object: Object, property: ListProperty) -> Self {
        Self {
            object,
            property,
            _element: PhantomData,
        }
    }

    /// The object that owns this list.
    pub fn object(&self) -> &Object {
        &self.object
    }

    pub fn property(&self) -> &ListProperty {
        &self.property
    }

    pub fn is_managed(&self) -> bool {
        self.object.is_managed()
    }

    pub fn is_invalidated(&self) -> bool {
        self.object.is_invalidated()
    }

    /// The store holding this list, if it is managed.
    pub fn store(&self) -> Option<Store> {
        self.object.store()
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Number of elements; 0 once invalidated.
    pub fn len(&self) -> usize {
        self.read(|values| Ok(values.len())).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: isize) -> Result<T> {
        self.read(|values| {
            let index = check_index(index, values.len())?;
            T::from_slot(values[index].clone())
        })
    }

    pub fn first(&self) -> Result<Option<T>> {
        self.read(|values| values.first().cloned().map(T::from_slot).transpose())
    }

    pub fn last(&self) -> Result<Option<T>> {
        self.read(|values| values.last().cloned().map(T::from_slot).transpose())
    }

    /// Position of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Result<Option<usize>> {
        let needle = value.clone().into_slot();
        self.read(|values| Ok(values.iter().position(|slot| *slot == needle)))
    }

    pub fn contains(&self, value: &T) -> Result<bool> {
        Ok(self.index_of(value)?.is_some())
    }

    /// Snapshot of the elements in storage order.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.read(|values| values.iter().cloned().map(T::from_slot).collect())
    }

    pub fn iter(&self) -> Result<std::vec::IntoIter<T>> {
        Ok(self.to_vec()?.into_iter())
    }

    /// Key-value lookup on the elements. Only `"self"` is understood and
    /// yields every element in storage order.
    pub fn value_for_key_path(&self, key_path: &str) -> Result<Vec<T>> {
        self.read(|values| {
            if key_path != SELF_KEY_PATH {
                return Err(DbError::UnknownKey(key_path.to_string()));
            }
            values.iter().cloned().map(T::from_slot).collect()
        })
    }

    pub fn value_for_key(&self, key: &str) -> Result<Vec<T>> {
        self.value_for_key_path(key)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Inserts `value` so that it ends up at `index`; `index == len` appends.
    pub fn insert(&self, index: isize, value: T) -> Result<()> {
        let value = value.into_slot();
        self.edit(|values| {
            let index = check_position(index, values.len())?;
            self.property.validate(&value)?;
            Ok((vec![ListEdit::Insert { index, value }], ()))
        })
    }

    pub fn push(&self, value: T) -> Result<()> {
        let value = value.into_slot();
        self.edit(|values| {
            self.property.validate(&value)?;
            let index = values.len();
            Ok((vec![ListEdit::Insert { index, value }], ()))
        })
    }

    /// Appends every value in order. Nothing is appended if any value is
    /// rejected.
    pub fn extend(&self, values: impl IntoIterator<Item = T>) -> Result<()> {
        let slots: Vec<Value> = values.into_iter().map(T::into_slot).collect();
        self.edit(|values| {
            for slot in &slots {
                self.property.validate(slot)?;
            }
            let start = values.len();
            let edits = slots
                .into_iter()
                .enumerate()
                .map(|(offset, value)| ListEdit::Insert {
                    index: start + offset,
                    value,
                })
                .collect();
            Ok((edits, ()))
        })
    }

    /// Removes and returns the element at `index`.
    pub fn remove(&self, index: isize) -> Result<T> {
        self.edit(|values| {
            let index = check_index(index, values.len())?;
            let removed = T::from_slot(values[index].clone())?;
            Ok((vec![ListEdit::Remove { index }], removed))
        })
    }

    /// Removes the last element; does nothing on an empty list.
    pub fn remove_last(&self) -> Result<()> {
        self.remove_last_n(1)
    }

    /// Removes up to `n` trailing elements.
    pub fn remove_last_n(&self, n: usize) -> Result<()> {
        self.edit(|values| {
            let len = values.len().saturating_sub(n);
            if len == values.len() {
                return Ok((Vec::new(), ()));
            }
            Ok((vec![ListEdit::Truncate { len }], ()))
        })
    }

    pub fn remove_all(&self) -> Result<()> {
        self.edit(|values| {
            if values.is_empty() {
                return Ok((Vec::new(), ()));
            }
            Ok((vec![ListEdit::Truncate { len: 0 }], ()))
        })
    }

    /// Replaces the element at `index`, returning the previous one.
    pub fn replace(&self, index: isize, value: T) -> Result<T> {
        let value = value.into_slot();
        self.edit(|values| {
            let index = check_index(index, values.len())?;
            self.property.validate(&value)?;
            let previous = T::from_slot(values[index].clone())?;
            Ok((vec![ListEdit::Set { index, value }], previous))
        })
    }

    /// Moves the element at `from` so that it ends up at `to`.
    pub fn move_item(&self, from: isize, to: isize) -> Result<()> {
        self.edit(|values| {
            let from = check_index(from, values.len())?;
            let to = check_index(to, values.len())?;
            if from == to {
                return Ok((Vec::new(), ()));
            }
            Ok((vec![ListEdit::Move { from, to }], ()))
        })
    }

    pub fn swap(&self, a: isize, b: isize) -> Result<()> {
        self.edit(|values| {
            let a = check_index(a, values.len())?;
            let b = check_index(b, values.len())?;
            if a == b {
                return Ok((Vec::new(), ()));
            }
            Ok((vec![ListEdit::Swap { a, b }], ()))
        })
    }

    // ------------------------------------------------------------------
    // Backing access
    // ------------------------------------------------------------------

    pub(crate) fn read<R>(&self, f: impl FnOnce(&[Value]) -> Result<R>) -> Result<R> {
        self.object.read_list(&self.property.name, f)
    }

    fn edit<R>(&self, f: impl FnOnce(&[Value]) -> Result<(Vec<ListEdit>, R)>) -> Result<R> {
        self.object.edit_list(&self.property, f)
    }
}

impl<T: ListElement> List<T>
where
    T::Inner: SortableType,
{
    /// A lazy view ordered by value. NULL comes first when ascending.
    pub fn sorted(&self, ascending: bool) -> Result<SortedList<T>> {
        self.read(|_| Ok(()))?;
        Ok(SortedList::new(self.clone(), ascending))
    }
}

impl<T: ListElement> List<T>
where
    T::Inner: MinMaxType,
{
    pub fn min(&self) -> Result<Option<T::Inner>> {
        self.read(aggregate::min)?
            .map(<T::Inner as Primitive>::from_value)
            .transpose()
    }

    pub fn max(&self) -> Result<Option<T::Inner>> {
        self.read(aggregate::max)?
            .map(<T::Inner as Primitive>::from_value)
            .transpose()
    }
}

impl<T: ListElement> List<T>
where
    T::Inner: AddableType,
{
    /// Sum of the present elements; zero for an empty list.
    pub fn sum(&self) -> Result<T::Inner> {
        let total = self.read(|values| aggregate::sum(<T::Inner as Primitive>::KIND, values))?;
        <T::Inner as Primitive>::from_value(total)
    }

    pub fn average(&self) -> Result<Option<f64>> {
        self.read(aggregate::average)
    }
}

impl<T: ListElement> Clone for List<T> {
    fn clone(&self) -> Self {
        Self::new(self.object.clone(), self.property.clone())
    }
}

impl<T: ListElement> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("object", &self.object.type_name())
            .field("property", &self.property.name)
            .field("element_type", &self.property.type_description())
            .field("managed", &self.is_managed())
            .field("invalidated", &self.is_invalidated())
            .finish()
    }
}

/// Validates a read / remove / replace / move / swap index against `[0, len)`.
pub(crate) fn check_index(index: isize, len: usize) -> Result<usize> {
    if index < 0 || index as usize >= len {
        return Err(DbError::IndexOutOfBounds { index, bound: len });
    }
    Ok(index as usize)
}

/// Validates an insertion position against `[0, len]`.
pub(crate) fn check_position(index: isize, len: usize) -> Result<usize> {
    if index < 0 || index as usize > len {
        return Err(DbError::IndexOutOfBounds {
            index,
            bound: len + 1,
        });
    }
    Ok(index as usize)
}
