use crate::core::{DbError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single list slot as it is kept in storage.
///
/// Storage is type-erased: every list holds `Value`s and the element type is
/// recorded once on the owning property. Typed access goes through
/// [`ListElement`](crate::core::ListElement).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    Data(Vec<u8>),
    Date(DateTime<Utc>),
}

impl Value {
    /// Compares two values of the same element type.
    ///
    /// NULL sorts before every present value. Comparing values of two
    /// different element types is an error.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Ok(Ordering::Equal),
            (Value::Null, _) => Ok(Ordering::Less),
            (_, Value::Null) => Ok(Ordering::Greater),

            (Value::Int8(a), Value::Int8(b)) => Ok(a.cmp(b)),
            (Value::Int16(a), Value::Int16(b)) => Ok(a.cmp(b)),
            (Value::Int32(a), Value::Int32(b)) => Ok(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Ok(compare_floats(*a as f64, *b as f64)),
            (Value::Double(a), Value::Double(b)) => Ok(compare_floats(*a, *b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::Data(a), Value::Data(b)) => Ok(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Ok(a.cmp(b)),

            _ => Err(DbError::TypeMismatch(format!(
                "Cannot compare incompatible types: {} and {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// The element type of a present value, `None` for NULL.
    pub fn element_type(&self) -> Option<ElementType> {
        match self {
            Self::Null => None,
            Self::Int8(_) => Some(ElementType::Int8),
            Self::Int16(_) => Some(ElementType::Int16),
            Self::Int32(_) => Some(ElementType::Int32),
            Self::Int64(_) => Some(ElementType::Int64),
            Self::Float(_) => Some(ElementType::Float),
            Self::Double(_) => Some(ElementType::Double),
            Self::Bool(_) => Some(ElementType::Bool),
            Self::String(_) => Some(ElementType::String),
            Self::Data(_) => Some(ElementType::Data),
            Self::Date(_) => Some(ElementType::Date),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.element_type().map_or("NULL", |kind| kind.name())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int8(i) => Some(*i as i64),
            Self::Int16(i) => Some(*i as i64),
            Self::Int32(i) => Some(*i as i64),
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f as f64),
            Self::Double(f) => Some(*f),
            other => other.as_i64().map(|i| i as f64),
        }
    }
}

// NaN is equal to NaN and greater than every other float.
fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int8(i) => write!(f, "{}", i),
            Self::Int16(i) => write!(f, "{}", i),
            Self::Int32(i) => write!(f, "{}", i),
            Self::Int64(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Double(fl) => write!(f, "{}", fl),
            Self::Bool(b) => write!(f, "{}", b),
            Self::String(s) => write!(f, "{}", s),
            Self::Data(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Self::Date(d) => write!(f, "{}", d.to_rfc3339()),
        }
    }
}

/// The fixed set of primitive kinds a list property can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Bool,
    String,
    Data,
    Date,
}

impl ElementType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int8 => "INT8",
            Self::Int16 => "INT16",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Bool => "BOOL",
            Self::String => "STRING",
            Self::Data => "DATA",
            Self::Date => "DATE",
        }
    }

    pub fn is_compatible(&self, value: &Value) -> bool {
        match value.element_type() {
            None => true,
            Some(kind) => kind == *self,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
