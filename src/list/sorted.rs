use super::{List, aggregate};
use crate::core::{ListElement, Result, SortableType};
use std::fmt;

/// A lazily sorted view of a [`List`].
///
/// Nothing is sorted until the view is read, and every read sorts the list's
/// current contents, so the view can be iterated any number of times. The
/// list's own order is never changed.
pub struct SortedList<T: ListElement>
where
    T::Inner: SortableType,
{
    list: List<T>,
    ascending: bool,
}

impl<T: ListElement> SortedList<T>
where
    T::Inner: SortableType,
{
    pub(crate) fn new(list: List<T>, ascending: bool) -> Self {
        Self { list, ascending }
    }

    pub fn ascending(&self) -> bool {
        self.ascending
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_vec(&self) -> Result<Vec<T>> {
        let mut values = self.list.read(|values| Ok(values.to_vec()))?;
        aggregate::sort(&mut values, self.ascending)?;
        values.into_iter().map(T::from_slot).collect()
    }

    pub fn iter(&self) -> Result<std::vec::IntoIter<T>> {
        Ok(self.to_vec()?.into_iter())
    }

    pub fn get(&self, index: isize) -> Result<T> {
        let values = self.to_vec()?;
        let index = super::check_index(index, values.len())?;
        Ok(values[index].clone())
    }

    pub fn first(&self) -> Result<Option<T>> {
        Ok(self.to_vec()?.into_iter().next())
    }

    pub fn last(&self) -> Result<Option<T>> {
        Ok(self.to_vec()?.pop())
    }
}

impl<T: ListElement> Clone for SortedList<T>
where
    T::Inner: SortableType,
{
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
            ascending: self.ascending,
        }
    }
}

impl<T: ListElement> fmt::Debug for SortedList<T>
where
    T::Inner: SortableType,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedList")
            .field("list", &self.list)
            .field("ascending", &self.ascending)
            .finish()
    }
}
