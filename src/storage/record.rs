use crate::core::{DbError, Result, Value};
use crate::object::ObjectSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stored content of one managed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub type_name: String,

    /// Insertion sequence within the store; orders `Store::objects`.
    pub seq: u64,

    pub lists: BTreeMap<String, Vec<Value>>,
}

impl ObjectRecord {
    pub fn new(type_name: impl Into<String>, seq: u64) -> Self {
        Self {
            type_name: type_name.into(),
            seq,
            lists: BTreeMap::new(),
        }
    }

    pub fn list(&self, property: &str) -> &[Value] {
        self.lists.get(property).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of list slots across all properties.
    pub fn value_count(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    /// Brings the record in line with `schema`: unknown properties are
    /// dropped, missing ones start empty, and every value is revalidated.
    pub fn conform(&mut self, schema: &ObjectSchema) -> Result<()> {
        self.lists
            .retain(|name, _| schema.get_property(name).is_some());

        for property in schema.properties() {
            let values = self.lists.entry(property.name.clone()).or_default();
            for value in values.iter() {
                property.validate(value).map_err(|e| match e {
                    DbError::TypeMismatch(msg) | DbError::ConstraintViolation(msg) => {
                        DbError::ConstraintViolation(format!(
                            "{}.{}: {}",
                            self.type_name, property.name, msg
                        ))
                    }
                    other => other,
                })?;
            }
        }

        Ok(())
    }
}
