/// List behavior tests
///
/// Concrete list scenarios, nullable lists and the interaction between
/// managed lists and write transactions.
/// Run with: cargo test --test list_behavior_tests

mod common;

use common::*;
use primdb::{DbError, Object, ObjectSchema, Store, StoreConfig};

fn unmanaged_ints() -> primdb::List<i64> {
    Object::new(list_object_schema()).list("int").unwrap()
}

#[test]
fn test_insert_scenario() {
    let list = unmanaged_ints();

    list.insert(0, 10).unwrap();
    assert_eq!(list.to_vec().unwrap(), vec![10]);
    list.insert(0, 20).unwrap();
    assert_eq!(list.to_vec().unwrap(), vec![20, 10]);
    list.insert(2, 30).unwrap();
    assert_eq!(list.to_vec().unwrap(), vec![20, 10, 30]);

    assert!(matches!(
        list.insert(4, 40),
        Err(DbError::IndexOutOfBounds { index: 4, .. })
    ));
    assert!(matches!(
        list.insert(-1, 40),
        Err(DbError::IndexOutOfBounds { index: -1, .. })
    ));
    assert_eq!(list.to_vec().unwrap(), vec![20, 10, 30]);
}

#[test]
fn test_insert_shifts_following_elements() {
    let list = unmanaged_ints();
    list.extend([1, 2, 3, 4]).unwrap();

    list.insert(1, 9).unwrap();
    assert_eq!(list.get(1).unwrap(), 9);
    assert_eq!(list.to_vec().unwrap(), vec![1, 9, 2, 3, 4]);

    assert_eq!(list.remove(1).unwrap(), 9);
    assert_eq!(list.to_vec().unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn test_move_and_swap_scenarios() {
    let list = unmanaged_ints();
    list.extend([1, 2, 3]).unwrap();
    list.move_item(2, 0).unwrap();
    assert_eq!(list.to_vec().unwrap(), vec![3, 1, 2]);

    let list = unmanaged_ints();
    list.extend([1, 2, 3]).unwrap();
    list.swap(0, 2).unwrap();
    assert_eq!(list.to_vec().unwrap(), vec![3, 2, 1]);
}

#[test]
fn test_move_uses_post_removal_index() {
    let list = unmanaged_ints();
    list.extend([1, 2, 3, 4]).unwrap();

    list.move_item(0, 2).unwrap();
    assert_eq!(list.to_vec().unwrap(), vec![2, 3, 1, 4]);

    list.move_item(1, 1).unwrap();
    assert_eq!(list.to_vec().unwrap(), vec![2, 3, 1, 4]);

    list.move_item(3, 2).unwrap();
    assert_eq!(list.to_vec().unwrap(), vec![2, 3, 4, 1]);
}

#[test]
fn test_remove_last_differs_from_remove_on_empty() {
    let list = unmanaged_ints();
    assert!(list.remove_last().is_ok());
    assert!(matches!(
        list.remove(0),
        Err(DbError::IndexOutOfBounds { index: 0, bound: 0 })
    ));
}

#[test]
fn test_remove_last_n_clamps() {
    let list = unmanaged_ints();
    list.extend([1, 2, 3]).unwrap();
    list.remove_last_n(2).unwrap();
    assert_eq!(list.to_vec().unwrap(), vec![1]);
    list.remove_last_n(5).unwrap();
    assert!(list.is_empty());
}

#[test]
fn test_value_for_key_path_on_strings() {
    let list = Object::new(list_object_schema())
        .list::<String>("string")
        .unwrap();
    list.extend(["a".to_string(), "b".to_string()]).unwrap();

    assert_eq!(
        list.value_for_key_path("self").unwrap(),
        vec!["a".to_string(), "b".to_string()]
    );
    assert!(matches!(
        list.value_for_key_path("not self"),
        Err(DbError::UnknownKey(_))
    ));
}

#[test]
fn test_nullable_list_aggregates_skip_null() {
    let list = Object::new(list_object_schema())
        .list::<Option<i32>>("int32_opt")
        .unwrap();

    list.extend([None, None]).unwrap();
    assert_eq!(list.min().unwrap(), None);
    assert_eq!(list.max().unwrap(), None);
    assert_eq!(list.sum().unwrap(), 0);
    assert_eq!(list.average().unwrap(), None);

    list.extend([Some(4), None, Some(-2)]).unwrap();
    assert_eq!(list.min().unwrap(), Some(-2));
    assert_eq!(list.max().unwrap(), Some(4));
    assert_eq!(list.sum().unwrap(), 2);
    assert_eq!(list.average().unwrap(), Some(1.0));

    assert_eq!(list.index_of(&None).unwrap(), Some(0));
    assert_eq!(list.index_of(&Some(-2)).unwrap(), Some(4));
}

#[test]
fn test_nullable_sort_puts_null_first() {
    let list = Object::new(list_object_schema())
        .list::<Option<i64>>("int_opt")
        .unwrap();
    list.extend([Some(3), None, Some(1)]).unwrap();

    let ascending = list.sorted(true).unwrap();
    assert!(ascending.ascending());
    assert_eq!(ascending.to_vec().unwrap(), vec![None, Some(1), Some(3)]);

    let mut reversed = ascending.to_vec().unwrap();
    reversed.reverse();
    assert_eq!(list.sorted(false).unwrap().to_vec().unwrap(), reversed);
}

#[test]
fn test_sorted_view_is_lazy_and_restartable() {
    let list = unmanaged_ints();
    list.extend([5, 1]).unwrap();

    let view = list.sorted(true).unwrap();
    assert_eq!(view.iter().unwrap().collect::<Vec<_>>(), vec![1, 5]);
    assert_eq!(view.iter().unwrap().collect::<Vec<_>>(), vec![1, 5]);

    list.push(3).unwrap();
    assert_eq!(view.to_vec().unwrap(), vec![1, 3, 5]);
    assert_eq!(view.first().unwrap(), Some(1));
    assert_eq!(view.last().unwrap(), Some(5));
    assert_eq!(view.get(1).unwrap(), 3);
    assert_eq!(view.len(), 3);
}

#[test]
fn test_sum_wraps_at_element_width() {
    let list = Object::new(list_object_schema())
        .list::<i8>("int8")
        .unwrap();
    list.extend([100, 100]).unwrap();
    assert_eq!(list.sum().unwrap(), 100i8.wrapping_add(100));
    assert_eq!(list.average().unwrap(), Some(100.0));
}

#[test]
fn test_wrong_list_type_is_rejected() {
    let object = Object::new(list_object_schema());
    assert!(matches!(object.list::<i32>("int"), Err(DbError::TypeMismatch(_))));
    assert!(matches!(
        object.list::<Option<i64>>("int"),
        Err(DbError::TypeMismatch(_))
    ));
    assert!(matches!(
        object.list::<i64>("nope"),
        Err(DbError::PropertyNotFound { .. })
    ));
}

// ============================================================================
// Managed lists and transactions
// ============================================================================

#[test]
fn test_managed_mutation_requires_write_transaction() {
    let store = unique_store();
    let object = Object::new(list_object_schema());
    store.write(|store| store.add(&object)).unwrap();

    let list = object.list::<i64>("int").unwrap();
    assert!(list.is_managed());
    assert!(matches!(list.push(1), Err(DbError::NotInTransaction(_))));
    assert!(matches!(list.remove_all(), Err(DbError::NotInTransaction(_))));

    // Reads need no transaction.
    assert_eq!(list.len(), 0);
    assert_eq!(list.first().unwrap(), None);

    store.write(|_| list.push(1)).unwrap();
    assert_eq!(list.to_vec().unwrap(), vec![1]);
}

#[test]
fn test_transaction_check_precedes_bounds_check() {
    let store = unique_store();
    let object = Object::new(list_object_schema());
    store.write(|store| store.add(&object)).unwrap();

    let list = object.list::<i64>("int").unwrap();
    assert!(matches!(list.remove(5), Err(DbError::NotInTransaction(_))));
}

#[test]
fn test_unmanaged_mutation_needs_no_transaction() {
    let list = unmanaged_ints();
    assert!(!list.is_managed());
    assert!(list.store().is_none());
    list.push(1).unwrap();
    assert_eq!(list.len(), 1);
}

#[test]
fn test_add_moves_unmanaged_values_into_store() {
    let store = unique_store();
    let object = Object::new(list_object_schema());
    let list = object.list::<String>("string").unwrap();
    list.extend(["x".to_string(), "y".to_string()]).unwrap();

    store.write(|store| store.add(&object)).unwrap();

    assert!(list.is_managed());
    assert!(list.store().unwrap().ptr_eq(&store));
    assert_eq!(list.to_vec().unwrap(), vec!["x".to_string(), "y".to_string()]);

    let found = store.objects(LIST_OBJECT).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), object.id());
    assert_eq!(
        found[0].list::<String>("string").unwrap().to_vec().unwrap(),
        vec!["x".to_string(), "y".to_string()]
    );
}

#[test]
fn test_cancel_write_reverts_list_edits() {
    let store = unique_store();
    let object = Object::new(list_object_schema());
    let list = object.list::<i64>("int").unwrap();
    store
        .write(|store| {
            store.add(&object)?;
            list.extend([1, 2, 3])
        })
        .unwrap();

    store.begin_write().unwrap();
    list.move_item(2, 0).unwrap();
    list.replace(1, 10).unwrap();
    list.remove_last().unwrap();
    list.insert(0, 7).unwrap();
    list.swap(0, 1).unwrap();
    assert_eq!(list.to_vec().unwrap(), vec![3, 7, 10]);
    store.cancel_write().unwrap();

    assert_eq!(list.to_vec().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_write_closure_cancels_on_error() {
    let store = unique_store();
    let object = Object::new(list_object_schema());
    let list = object.list::<i64>("int").unwrap();
    store.write(|store| store.add(&object)).unwrap();

    let result = store.write(|_| {
        list.push(1)?;
        list.remove(5).map(|_| ())
    });
    assert!(matches!(result, Err(DbError::IndexOutOfBounds { .. })));
    assert!(!store.is_in_write_transaction());
    assert!(list.is_empty());
}

#[test]
fn test_deleted_object_invalidates_every_handle() {
    let store = unique_store();
    let object = Object::new(list_object_schema());
    store.write(|store| store.add(&object)).unwrap();

    let list = object.list::<f64>("double").unwrap();
    let other = store.objects(LIST_OBJECT).unwrap().remove(0);
    let other_list = other.list::<f64>("double").unwrap();

    store.write(|store| store.delete(&object)).unwrap();

    assert!(list.is_invalidated());
    assert!(other.is_invalidated());
    assert!(other_list.is_invalidated());
    assert_eq!(list.len(), 0);
    assert!(matches!(list.first(), Err(DbError::Invalidated(_))));
    assert!(matches!(other_list.sum(), Err(DbError::Invalidated(_))));
    assert!(matches!(list.sorted(true), Err(DbError::Invalidated(_))));
    assert!(matches!(
        list.value_for_key_path("not self"),
        Err(DbError::Invalidated(_))
    ));

    // Invalidation wins over the missing write transaction.
    assert!(matches!(list.push(1.0), Err(DbError::Invalidated(_))));
    assert_eq!(store.object_count().unwrap(), 0);
}

#[test]
fn test_invalidation_survives_cancelled_delete() {
    let store = unique_store();
    let object = Object::new(list_object_schema());
    store.write(|store| store.add(&object)).unwrap();
    let list = object.list::<i64>("int").unwrap();

    store.begin_write().unwrap();
    store.delete(&object).unwrap();
    store.cancel_write().unwrap();

    assert!(list.is_invalidated());
    let restored = store.objects(LIST_OBJECT).unwrap();
    assert_eq!(restored.len(), 1);
    assert!(!restored[0].is_invalidated());
    assert!(restored[0].list::<i64>("int").unwrap().is_empty());
}

#[test]
fn test_cancelling_add_invalidates_list() {
    let store = unique_store();
    let object = Object::new(list_object_schema());
    let list = object.list::<bool>("bool").unwrap();

    store.begin_write().unwrap();
    store.add(&object).unwrap();
    list.push(true).unwrap();
    store.cancel_write().unwrap();

    assert!(list.is_invalidated());
    assert_eq!(store.object_count().unwrap(), 0);
}

#[test]
fn test_add_is_idempotent_and_rejects_foreign_objects() {
    let store = unique_store();
    let other_store = unique_store();
    let object = Object::new(list_object_schema());

    store
        .write(|store| {
            store.add(&object)?;
            store.add(&object)
        })
        .unwrap();
    assert_eq!(store.object_count().unwrap(), 1);

    other_store.begin_write().unwrap();
    assert!(matches!(
        other_store.add(&object),
        Err(DbError::ForeignObject)
    ));
    other_store.cancel_write().unwrap();
}

#[test]
fn test_add_checks_object_types() {
    let store = unique_store();
    let stray = Object::new(ObjectSchema::new("Stray").list::<i64>("ints"));

    store.begin_write().unwrap();
    assert!(matches!(
        store.add(&stray),
        Err(DbError::ObjectTypeNotInSchema(name)) if name == "Stray"
    ));
    store.cancel_write().unwrap();
    assert!(!stray.is_managed());
}

#[test]
fn test_cancelled_add_unregisters_dynamic_type() {
    let identifier = format!("dynamic-{}", uuid::Uuid::new_v4());
    let store = Store::open(StoreConfig::in_memory(&identifier)).unwrap();
    let ints = Object::new(ObjectSchema::new("Person").list::<i64>("x"));

    store.begin_write().unwrap();
    store.add(&ints).unwrap();
    assert_eq!(store.schema().unwrap().len(), 1);
    store.cancel_write().unwrap();

    assert_eq!(store.object_count().unwrap(), 0);
    assert!(store.schema().unwrap().is_empty());

    let strings = Object::new(ObjectSchema::new("Person").list::<String>("x"));
    store
        .write(|store| {
            store.add(&strings)?;
            strings.list::<String>("x")?.push("a".to_string())
        })
        .unwrap();
    assert_eq!(store.objects("Person").unwrap().len(), 1);

    store.begin_write().unwrap();
    assert!(matches!(
        store.add(&Object::new(ObjectSchema::new("Person").list::<i64>("x"))),
        Err(DbError::TypeMismatch(_))
    ));
    store.cancel_write().unwrap();
}

#[test]
fn test_same_identifier_shares_state() {
    let identifier = format!("shared-{}", uuid::Uuid::new_v4());
    let config = StoreConfig::in_memory(&identifier).object_types(vec![list_object_schema()]);
    let first = Store::open(config.clone()).unwrap();
    let second = Store::open(config).unwrap();
    assert!(first.ptr_eq(&second));

    let object = Object::new(list_object_schema());
    first
        .write(|store| {
            store.add(&object)?;
            object.list::<i64>("int")?.push(42)
        })
        .unwrap();

    let seen = second.objects(LIST_OBJECT).unwrap();
    assert_eq!(seen[0].list::<i64>("int").unwrap().to_vec().unwrap(), vec![42]);
}

#[test]
fn test_transaction_errors() {
    let store = unique_store();
    assert!(matches!(store.commit_write(), Err(DbError::NotInTransaction(_))));
    assert!(matches!(store.cancel_write(), Err(DbError::NotInTransaction(_))));

    store.begin_write().unwrap();
    assert!(matches!(store.begin_write(), Err(DbError::AlreadyInTransaction)));
    store.commit_write().unwrap();

    let object = Object::new(list_object_schema());
    assert!(matches!(store.add(&object), Err(DbError::NotInTransaction(_))));
}
