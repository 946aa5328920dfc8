use super::{ListProperty, ObjectSchema};
use crate::core::{DbError, ListElement, Primitive, Result, Value};
use crate::list::{List, ListEdit};
use crate::storage::Store;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Identity of a managed object inside its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    pub fn new() -> Self {
        ObjectId(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj_{}", self.0.simple())
    }
}

pub(crate) enum ObjectState {
    /// Lists live in the object itself.
    Unmanaged { lists: HashMap<String, Vec<Value>> },

    /// Lists live in `store`; `invalidated` is shared with the store and
    /// set when the object is deleted.
    Managed {
        store: Store,
        id: ObjectId,
        invalidated: Arc<AtomicBool>,
    },
}

/// An instance of an [`ObjectSchema`] owning one list per property.
///
/// Cloning an `Object` yields another handle to the same object. Objects
/// start unmanaged; [`Store::add`] moves their lists into the store.
#[derive(Clone)]
pub struct Object {
    schema: Arc<ObjectSchema>,
    state: Arc<RwLock<ObjectState>>,
}

impl Object {
    /// Creates an unmanaged object with an empty list for every property.
    pub fn new(schema: ObjectSchema) -> Self {
        let lists = schema
            .properties()
            .iter()
            .map(|property| (property.name.clone(), Vec::new()))
            .collect();

        Self {
            schema: Arc::new(schema),
            state: Arc::new(RwLock::new(ObjectState::Unmanaged { lists })),
        }
    }

    pub(crate) fn attached(
        schema: Arc<ObjectSchema>,
        store: Store,
        id: ObjectId,
        invalidated: Arc<AtomicBool>,
    ) -> Self {
        Self {
            schema,
            state: Arc::new(RwLock::new(ObjectState::Managed {
                store,
                id,
                invalidated,
            })),
        }
    }

    pub fn schema(&self) -> &ObjectSchema {
        &self.schema
    }

    pub fn type_name(&self) -> &str {
        self.schema.name()
    }

    pub fn is_managed(&self) -> bool {
        self.state
            .read()
            .map(|state| matches!(*state, ObjectState::Managed { .. }))
            .unwrap_or(false)
    }

    /// True once the object has been deleted from its store. Unmanaged
    /// objects are never invalidated.
    pub fn is_invalidated(&self) -> bool {
        match self.state.read() {
            Ok(state) => match &*state {
                ObjectState::Unmanaged { .. } => false,
                ObjectState::Managed { invalidated, .. } => invalidated.load(Ordering::SeqCst),
            },
            Err(_) => true,
        }
    }

    pub fn id(&self) -> Option<ObjectId> {
        match &*self.state.read().ok()? {
            ObjectState::Managed { id, .. } => Some(*id),
            ObjectState::Unmanaged { .. } => None,
        }
    }

    pub fn store(&self) -> Option<Store> {
        match &*self.state.read().ok()? {
            ObjectState::Managed { store, .. } => Some(store.clone()),
            ObjectState::Unmanaged { .. } => None,
        }
    }

    /// Two handles to the same object.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Typed accessor for the list property `property`.
    pub fn list<T: ListElement>(&self, property: &str) -> Result<List<T>> {
        let list_property = self
            .schema
            .get_property(property)
            .ok_or_else(|| DbError::PropertyNotFound {
                object_type: self.schema.name().to_string(),
                property: property.to_string(),
            })?;

        if !list_property.accepts::<T>() {
            return Err(DbError::TypeMismatch(format!(
                "Property '{}.{}' is a list of {}, requested {}{}",
                self.schema.name(),
                property,
                list_property.type_description(),
                <T::Inner as Primitive>::KIND,
                if T::NULLABLE { "?" } else { "" }
            )));
        }

        Ok(List::new(self.clone(), list_property.clone()))
    }

    pub(crate) fn state(&self) -> &Arc<RwLock<ObjectState>> {
        &self.state
    }

    pub(crate) fn schema_arc(&self) -> &Arc<ObjectSchema> {
        &self.schema
    }

    pub(crate) fn read_list<R>(
        &self,
        property: &str,
        f: impl FnOnce(&[Value]) -> Result<R>,
    ) -> Result<R> {
        let (store, id) = {
            let state = self.state.read()?;
            match &*state {
                ObjectState::Unmanaged { lists } => {
                    let values = lists.get(property).map(Vec::as_slice).unwrap_or(&[]);
                    return f(values);
                }
                ObjectState::Managed {
                    store,
                    id,
                    invalidated,
                } => {
                    if invalidated.load(Ordering::SeqCst) {
                        return Err(invalidated_error());
                    }
                    (store.clone(), *id)
                }
            }
        };

        store.read_list(id, property, f)
    }

    pub(crate) fn edit_list<R>(
        &self,
        property: &ListProperty,
        f: impl FnOnce(&[Value]) -> Result<(Vec<ListEdit>, R)>,
    ) -> Result<R> {
        let (store, id) = {
            let mut state = self.state.write()?;
            match &mut *state {
                ObjectState::Unmanaged { lists } => {
                    let values = lists.entry(property.name.clone()).or_default();
                    let (edits, output) = f(values.as_slice())?;
                    for edit in edits {
                        edit.apply(values);
                    }
                    return Ok(output);
                }
                ObjectState::Managed {
                    store,
                    id,
                    invalidated,
                } => {
                    if invalidated.load(Ordering::SeqCst) {
                        return Err(invalidated_error());
                    }
                    (store.clone(), *id)
                }
            }
        };

        store.edit_list(id, property, f)
    }
}

pub(crate) fn invalidated_error() -> DbError {
    DbError::Invalidated(
        "Object has been deleted or invalidated; its lists can no longer be accessed".to_string(),
    )
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type", &self.schema.name())
            .field("id", &self.id())
            .field("managed", &self.is_managed())
            .field("invalidated", &self.is_invalidated())
            .finish()
    }
}
