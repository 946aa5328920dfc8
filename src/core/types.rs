use super::{DbError, ElementType, Result, Value};
use chrono::{DateTime, Utc};
use std::fmt;

/// A Rust type that maps onto exactly one [`ElementType`].
pub trait Primitive: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    const KIND: ElementType;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Result<Self>;
}

/// The typed view of one list slot.
///
/// Implemented for every [`Primitive`] (non-nullable lists) and for
/// `Option<P>` of every primitive (nullable lists). `Inner` is the primitive
/// in both cases, so aggregates can be expressed once for both variants.
pub trait ListElement: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    type Inner: Primitive;

    const NULLABLE: bool;

    fn into_slot(self) -> Value;

    fn from_slot(value: Value) -> Result<Self>;

    /// The present value, `None` for a null slot.
    fn into_inner(self) -> Option<Self::Inner>;
}

/// Primitives with a natural order usable by `min` / `max`.
pub trait MinMaxType: Primitive {}

/// Primitives a list can be sorted by.
pub trait SortableType: Primitive {}

/// Numeric primitives usable by `sum` / `average`.
pub trait AddableType: Primitive {
    fn as_f64(&self) -> f64;
}

macro_rules! primitive_element {
    ($ty:ty, $variant:ident) => {
        impl Primitive for $ty {
            const KIND: ElementType = ElementType::$variant;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(DbError::TypeMismatch(format!(
                        "expected {}, got {}",
                        ElementType::$variant,
                        other.type_name()
                    ))),
                }
            }
        }

        impl ListElement for $ty {
            type Inner = $ty;
            const NULLABLE: bool = false;

            fn into_slot(self) -> Value {
                self.into_value()
            }

            fn from_slot(value: Value) -> Result<Self> {
                <$ty as Primitive>::from_value(value)
            }

            fn into_inner(self) -> Option<$ty> {
                Some(self)
            }
        }

        impl ListElement for Option<$ty> {
            type Inner = $ty;
            const NULLABLE: bool = true;

            fn into_slot(self) -> Value {
                self.map_or(Value::Null, Primitive::into_value)
            }

            fn from_slot(value: Value) -> Result<Self> {
                match value {
                    Value::Null => Ok(None),
                    other => <$ty as Primitive>::from_value(other).map(Some),
                }
            }

            fn into_inner(self) -> Option<$ty> {
                self
            }
        }
    };
}

primitive_element!(i8, Int8);
primitive_element!(i16, Int16);
primitive_element!(i32, Int32);
primitive_element!(i64, Int64);
primitive_element!(f32, Float);
primitive_element!(f64, Double);
primitive_element!(bool, Bool);
primitive_element!(String, String);
primitive_element!(Vec<u8>, Data);
primitive_element!(DateTime<Utc>, Date);

macro_rules! addable {
    ($($ty:ty),*) => {
        $(
            impl AddableType for $ty {
                fn as_f64(&self) -> f64 {
                    *self as f64
                }
            }
        )*
    };
}

addable!(i8, i16, i32, i64, f32, f64);

impl MinMaxType for i8 {}
impl MinMaxType for i16 {}
impl MinMaxType for i32 {}
impl MinMaxType for i64 {}
impl MinMaxType for f32 {}
impl MinMaxType for f64 {}
impl MinMaxType for DateTime<Utc> {}

impl SortableType for i8 {}
impl SortableType for i16 {}
impl SortableType for i32 {}
impl SortableType for i64 {}
impl SortableType for f32 {}
impl SortableType for f64 {}
impl SortableType for bool {}
impl SortableType for String {}
impl SortableType for DateTime<Utc> {}
