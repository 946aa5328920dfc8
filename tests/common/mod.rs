#![allow(dead_code)]

use chrono::{DateTime, Utc};
use primdb::{List, ListElement, Object, ObjectSchema, Store, StoreConfig};
use uuid::Uuid;

pub const LIST_OBJECT: &str = "ListObject";

/// One list property per element type, plus its nullable twin.
pub fn list_object_schema() -> ObjectSchema {
    ObjectSchema::new(LIST_OBJECT)
        .list::<i64>("int")
        .list::<i8>("int8")
        .list::<i16>("int16")
        .list::<i32>("int32")
        .list::<i64>("int64")
        .list::<f32>("float")
        .list::<f64>("double")
        .list::<bool>("bool")
        .list::<String>("string")
        .list::<Vec<u8>>("data")
        .list::<DateTime<Utc>>("date")
        .list::<Option<i64>>("int_opt")
        .list::<Option<i8>>("int8_opt")
        .list::<Option<i16>>("int16_opt")
        .list::<Option<i32>>("int32_opt")
        .list::<Option<i64>>("int64_opt")
        .list::<Option<f32>>("float_opt")
        .list::<Option<f64>>("double_opt")
        .list::<Option<bool>>("bool_opt")
        .list::<Option<String>>("string_opt")
        .list::<Option<Vec<u8>>>("data_opt")
        .list::<Option<DateTime<Utc>>>("date_opt")
}

/// A fresh in-memory store that only this test can see.
pub fn unique_store() -> Store {
    let identifier = format!("test-{}", Uuid::new_v4());
    Store::open(StoreConfig::in_memory(&identifier).object_types(vec![list_object_schema()]))
        .unwrap()
}

pub fn date(offset_secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_500_000_000 + offset_secs, 0).unwrap()
}

/// Element type under test: which property to use and three sample values,
/// in ascending order where the type is ordered.
pub trait ValueFactory {
    type T: ListElement;
    const PROPERTY: &'static str;
    fn values() -> Vec<Self::T>;
}

macro_rules! value_factory {
    ($name:ident, $ty:ty, $property:literal, $values:expr) => {
        pub struct $name;

        impl ValueFactory for $name {
            type T = $ty;
            const PROPERTY: &'static str = $property;

            fn values() -> Vec<$ty> {
                $values
            }
        }
    };
}

value_factory!(IntFactory, i64, "int", vec![1, 2, 3]);
value_factory!(Int8Factory, i8, "int8", vec![1, 2, 3]);
value_factory!(Int16Factory, i16, "int16", vec![1, 2, 3]);
value_factory!(Int32Factory, i32, "int32", vec![1, 2, 3]);
value_factory!(Int64Factory, i64, "int64", vec![1, 2, 3]);
value_factory!(FloatFactory, f32, "float", vec![1.1, 2.2, 3.3]);
value_factory!(DoubleFactory, f64, "double", vec![1.1, 2.2, 3.3]);
value_factory!(BoolFactory, bool, "bool", vec![false, true, true]);
value_factory!(
    StringFactory,
    String,
    "string",
    vec!["a".to_string(), "b".to_string(), "c".to_string()]
);
value_factory!(
    DataFactory,
    Vec<u8>,
    "data",
    vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
);
value_factory!(DateFactory, DateTime<Utc>, "date", vec![date(0), date(10), date(20)]);

value_factory!(OptionalIntFactory, Option<i64>, "int_opt", vec![Some(1), None, Some(3)]);
value_factory!(OptionalInt8Factory, Option<i8>, "int8_opt", vec![Some(1), None, Some(3)]);
value_factory!(OptionalInt16Factory, Option<i16>, "int16_opt", vec![Some(1), None, Some(3)]);
value_factory!(OptionalInt32Factory, Option<i32>, "int32_opt", vec![Some(1), None, Some(3)]);
value_factory!(OptionalInt64Factory, Option<i64>, "int64_opt", vec![Some(1), None, Some(3)]);
value_factory!(OptionalFloatFactory, Option<f32>, "float_opt", vec![Some(1.1), None, Some(3.3)]);
value_factory!(OptionalDoubleFactory, Option<f64>, "double_opt", vec![Some(1.1), None, Some(3.3)]);
value_factory!(OptionalBoolFactory, Option<bool>, "bool_opt", vec![Some(false), None, Some(true)]);
value_factory!(
    OptionalStringFactory,
    Option<String>,
    "string_opt",
    vec![Some("a".to_string()), None, Some("c".to_string())]
);
value_factory!(
    OptionalDataFactory,
    Option<Vec<u8>>,
    "data_opt",
    vec![Some(b"a".to_vec()), None, Some(b"c".to_vec())]
);
value_factory!(
    OptionalDateFactory,
    Option<DateTime<Utc>>,
    "date_opt",
    vec![Some(date(0)), None, Some(date(20))]
);

/// A list under test. Managed fixtures keep a write transaction open for the
/// whole test and cancel it on drop.
pub struct Fixture<V: ValueFactory> {
    pub store: Option<Store>,
    pub object: Object,
    pub list: List<V::T>,
    pub values: Vec<V::T>,
}

impl<V: ValueFactory> Fixture<V> {
    pub fn new(managed: bool) -> Self {
        let object = Object::new(list_object_schema());
        let store = if managed {
            let store = unique_store();
            store.begin_write().unwrap();
            store.add(&object).unwrap();
            Some(store)
        } else {
            None
        };

        let list = object.list::<V::T>(V::PROPERTY).unwrap();
        Self {
            store,
            object,
            list,
            values: V::values(),
        }
    }
}

impl<V: ValueFactory> Drop for Fixture<V> {
    fn drop(&mut self) {
        if let Some(store) = &self.store {
            if store.is_in_write_transaction() {
                let _ = store.cancel_write();
            }
        }
    }
}
