use crate::core::{DbError, ElementType, ListElement, Primitive, Result, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named list property: element type plus nullability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListProperty {
    pub name: String,
    pub element_type: ElementType,
    pub nullable: bool,
}

impl ListProperty {
    pub fn new(name: impl Into<String>, element_type: ElementType) -> Self {
        Self {
            name: name.into(),
            element_type,
            nullable: false,
        }
    }

    /// Property whose element type and nullability are taken from `T`.
    pub fn of<T: ListElement>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element_type: <T::Inner as Primitive>::KIND,
            nullable: T::NULLABLE,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// True when `T` is the typed view of this property.
    pub fn accepts<T: ListElement>(&self) -> bool {
        self.element_type == <T::Inner as Primitive>::KIND && self.nullable == T::NULLABLE
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            if !self.nullable {
                return Err(DbError::ConstraintViolation(format!(
                    "List property '{}' cannot hold NULL",
                    self.name
                )));
            }
            return Ok(());
        }

        if !self.element_type.is_compatible(value) {
            return Err(DbError::TypeMismatch(format!(
                "List property '{}' expects type {}, got {}",
                self.name,
                self.element_type,
                value.type_name()
            )));
        }

        Ok(())
    }

    pub fn type_description(&self) -> String {
        if self.nullable {
            format!("{}?", self.element_type)
        } else {
            self.element_type.to_string()
        }
    }
}

/// The shape of an object type: a name and its list properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSchema {
    name: String,
    properties: Vec<ListProperty>,
}

impl ObjectSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Adds a list property typed by `T`.
    pub fn list<T: ListElement>(self, name: impl Into<String>) -> Self {
        self.property(ListProperty::of::<T>(name))
    }

    /// Adds a property, replacing any previous one with the same name.
    pub fn property(mut self, property: ListProperty) -> Self {
        self.properties.retain(|existing| existing.name != property.name);
        self.properties.push(property);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[ListProperty] {
        &self.properties
    }

    pub fn get_property(&self, name: &str) -> Option<&ListProperty> {
        self.properties.iter().find(|property| property.name == name)
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Schema equality ignoring property order.
    pub fn same_shape(&self, other: &ObjectSchema) -> bool {
        self.name == other.name && self.shape() == other.shape()
    }

    fn shape(&self) -> BTreeMap<&str, (ElementType, bool)> {
        self.properties
            .iter()
            .map(|p| (p.name.as_str(), (p.element_type, p.nullable)))
            .collect()
    }
}

/// Order-insensitive comparison of two sets of object types.
pub fn schemas_match(a: &[ObjectSchema], b: &[ObjectSchema]) -> bool {
    a.len() == b.len()
        && a.iter().all(|schema| {
            b.iter()
                .find(|other| other.name() == schema.name())
                .is_some_and(|other| other.same_shape(schema))
        })
}
