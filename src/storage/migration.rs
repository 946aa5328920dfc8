use super::ObjectRecord;
use crate::object::{ObjectId, ObjectSchema};
use crate::core::Value;
use std::collections::HashMap;

/// Context handed to a migration callback while a store is opened with a
/// newer schema version than the one on disk.
///
/// Records still carry their old shape; after the callback returns they are
/// conformed to the new schema and revalidated.
pub struct Migration<'a> {
    records: &'a mut HashMap<ObjectId, ObjectRecord>,
    old_schema: &'a [ObjectSchema],
    new_schema: &'a [ObjectSchema],
    old_version: u64,
    new_version: u64,
}

impl<'a> Migration<'a> {
    pub(crate) fn new(
        records: &'a mut HashMap<ObjectId, ObjectRecord>,
        old_schema: &'a [ObjectSchema],
        new_schema: &'a [ObjectSchema],
        old_version: u64,
        new_version: u64,
    ) -> Self {
        Self {
            records,
            old_schema,
            new_schema,
            old_version,
            new_version,
        }
    }

    pub fn old_schema_version(&self) -> u64 {
        self.old_version
    }

    pub fn new_schema_version(&self) -> u64 {
        self.new_version
    }

    pub fn old_schema(&self) -> &[ObjectSchema] {
        self.old_schema
    }

    pub fn new_schema(&self) -> &[ObjectSchema] {
        self.new_schema
    }

    /// Ids of all objects of `type_name`, in insertion order.
    pub fn object_ids(&self, type_name: &str) -> Vec<ObjectId> {
        let mut ids: Vec<(u64, ObjectId)> = self
            .records
            .iter()
            .filter(|(_, record)| record.type_name == type_name)
            .map(|(id, record)| (record.seq, *id))
            .collect();
        ids.sort();
        ids.into_iter().map(|(_, id)| id).collect()
    }

    pub fn list_values(&self, id: ObjectId, property: &str) -> Option<&[Value]> {
        self.records
            .get(&id)
            .and_then(|record| record.lists.get(property))
            .map(Vec::as_slice)
    }

    /// Mutable access to a list, creating it empty when the old record has
    /// no such property.
    pub fn list_values_mut(&mut self, id: ObjectId, property: &str) -> Option<&mut Vec<Value>> {
        self.records
            .get_mut(&id)
            .map(|record| record.lists.entry(property.to_string()).or_default())
    }

    /// Renames a list property on every object of `type_name`. Returns the
    /// number of objects touched.
    pub fn rename_property(&mut self, type_name: &str, old_name: &str, new_name: &str) -> usize {
        let mut renamed = 0;
        for record in self.records.values_mut() {
            if record.type_name != type_name {
                continue;
            }
            if let Some(values) = record.lists.remove(old_name) {
                record.lists.insert(new_name.to_string(), values);
                renamed += 1;
            }
        }
        renamed
    }

    pub fn delete_object(&mut self, id: ObjectId) -> bool {
        self.records.remove(&id).is_some()
    }

    /// Removes every object of `type_name`. Returns how many were removed.
    pub fn delete_all(&mut self, type_name: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| record.type_name != type_name);
        before - self.records.len()
    }
}
