// ============================================================================
// Store
// ============================================================================
//
// The persistence backend behind managed lists. A `Store` is a cheap,
// cloneable handle; every handle opened with the same `StoreKind` in this
// process shares one `StoreInner`.
//
// Write discipline: at most one write transaction, all mutations applied in
// place and recorded as `Change`s. Commit writes a snapshot (file stores);
// cancel replays the undo log newest-first.
//
// ============================================================================

use super::persistence::{SnapshotManager, StoreSnapshot};
use super::{Migration, ObjectRecord};
use crate::config::{StoreConfig, StoreKind};
use crate::core::{DbError, Result, Value};
use crate::list::ListEdit;
use crate::object::{
    ListProperty, Object, ObjectId, ObjectSchema, ObjectState, invalidated_error, schemas_match,
};
use crate::transaction::{Change, Transaction, TransactionId};
use lazy_static::lazy_static;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

lazy_static! {
    /// Open stores by location, so that every `Store::open` of the same
    /// file or in-memory identifier observes the same state.
    static ref OPEN_STORES: Mutex<HashMap<StoreKind, Weak<RwLock<StoreInner>>>> =
        Mutex::new(HashMap::new());
}

pub(crate) struct StoreInner {
    config: StoreConfig,
    schema_version: u64,
    schema: Vec<Arc<ObjectSchema>>,
    objects: HashMap<ObjectId, ObjectRecord>,
    /// Invalidation flags shared with live `Object` handles.
    flags: HashMap<ObjectId, Arc<AtomicBool>>,
    next_seq: u64,
    write: Option<Transaction>,
    persistence: Option<SnapshotManager>,
}

#[derive(Clone)]
pub struct Store {
    inner: Arc<RwLock<StoreInner>>,
}

impl Store {
    /// Opens (or joins) the store described by `config`.
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let key = registry_key(&config.kind);
        if let Some(store) = Self::registered(&key, &config)? {
            return Ok(store);
        }

        // Loading may run the migration callback, which is free to open
        // other stores, so the registry is not held here.
        let inner = Arc::new(RwLock::new(StoreInner::load(config.clone())?));

        let mut registry = OPEN_STORES.lock()?;
        if let Some(existing) = registry.get(&key).and_then(Weak::upgrade) {
            drop(registry);
            let store = Store { inner: existing };
            store.check_compatible(&config)?;
            return Ok(store);
        }
        registry.insert(key, Arc::downgrade(&inner));
        Ok(Store { inner })
    }

    fn registered(key: &StoreKind, config: &StoreConfig) -> Result<Option<Self>> {
        let existing = {
            let mut registry = OPEN_STORES.lock()?;
            registry.retain(|_, weak| weak.strong_count() > 0);
            registry.get(key).and_then(Weak::upgrade)
        };
        match existing {
            Some(inner) => {
                let store = Store { inner };
                store.check_compatible(config)?;
                Ok(Some(store))
            }
            None => Ok(None),
        }
    }

    /// Opens the store described by [`StoreConfig::default_configuration`].
    pub fn open_default() -> Result<Self> {
        Self::open(StoreConfig::default_configuration())
    }

    fn check_compatible(&self, config: &StoreConfig) -> Result<()> {
        let inner = self.inner.read()?;
        if inner.config.read_only != config.read_only
            || inner.config.schema_version != config.schema_version
            || inner.config.encryption_key != config.encryption_key
        {
            return Err(DbError::InvalidConfiguration(format!(
                "{:?} is already open with a different configuration",
                config.kind
            )));
        }
        if let Some(types) = &config.object_types {
            let current: Vec<ObjectSchema> =
                inner.schema.iter().map(|schema| (**schema).clone()).collect();
            if !schemas_match(types, &current) {
                return Err(DbError::InvalidConfiguration(format!(
                    "{:?} is already open with a different schema",
                    config.kind
                )));
            }
        }
        Ok(())
    }

    /// The configuration this store was opened with.
    pub fn configuration(&self) -> Result<StoreConfig> {
        Ok(self.inner.read()?.config.clone())
    }

    pub fn schema_version(&self) -> Result<u64> {
        Ok(self.inner.read()?.schema_version)
    }

    pub fn schema(&self) -> Result<Vec<ObjectSchema>> {
        Ok(self.inner.read()?.schema.iter().map(|s| (**s).clone()).collect())
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.read().map(|inner| inner.config.read_only).unwrap_or(true)
    }

    /// Two handles to the same underlying store.
    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Write transactions
    // ------------------------------------------------------------------

    pub fn is_in_write_transaction(&self) -> bool {
        self.inner
            .read()
            .map(|inner| inner.write.is_some())
            .unwrap_or(false)
    }

    pub fn begin_write(&self) -> Result<()> {
        let mut inner = self.inner.write()?;
        if inner.config.read_only {
            return Err(DbError::ReadOnly("cannot begin a write transaction".to_string()));
        }
        if inner.write.is_some() {
            return Err(DbError::AlreadyInTransaction);
        }

        let txn = Transaction::new(TransactionId::new());
        debug!("begin write transaction {}", txn.id());
        inner.write = Some(txn);
        Ok(())
    }

    /// Commits the open write transaction. File stores persist a snapshot
    /// first; if that fails the transaction is rolled back.
    pub fn commit_write(&self) -> Result<()> {
        let mut inner = self.inner.write()?;
        let mut txn = inner
            .write
            .take()
            .ok_or_else(|| DbError::NotInTransaction("commit".to_string()))?;

        let saved = match &inner.persistence {
            Some(persistence) => persistence.save(&inner.snapshot()),
            None => Ok(()),
        };
        if let Err(err) = saved {
            warn!("commit of {} failed, rolling back: {}", txn.id(), err);
            let changes = txn.rollback()?;
            inner.revert(changes);
            return Err(err);
        }

        let changes = txn.change_count();
        let elapsed = txn.duration();
        txn.commit()?;
        debug!("committed {} ({} changes in {:?})", txn.id(), changes, elapsed);
        Ok(())
    }

    /// Cancels the open write transaction, reverting every change it made.
    pub fn cancel_write(&self) -> Result<()> {
        let mut inner = self.inner.write()?;
        let mut txn = inner
            .write
            .take()
            .ok_or_else(|| DbError::NotInTransaction("cancel a write".to_string()))?;

        let changes = txn.rollback()?;
        debug!("cancel {} ({} changes reverted)", txn.id(), changes.len());
        inner.revert(changes);
        Ok(())
    }

    /// Runs `f` inside a write transaction: commits on `Ok`, cancels on `Err`.
    pub fn write<R>(&self, f: impl FnOnce(&Store) -> Result<R>) -> Result<R> {
        self.begin_write()?;
        match f(self) {
            Ok(value) => {
                self.commit_write()?;
                Ok(value)
            }
            Err(err) => {
                if self.is_in_write_transaction() {
                    self.cancel_write()?;
                }
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    /// Moves an unmanaged object (and its lists) into this store.
    ///
    /// Adding an object already managed by this store is a no-op.
    pub fn add(&self, object: &Object) -> Result<()> {
        let mut state = object.state().write()?;

        let lists = match &*state {
            ObjectState::Managed {
                store, invalidated, ..
            } => {
                if !store.ptr_eq(self) {
                    return Err(DbError::ForeignObject);
                }
                if invalidated.load(Ordering::SeqCst) {
                    return Err(invalidated_error());
                }
                return Ok(());
            }
            ObjectState::Unmanaged { lists } => lists,
        };

        let mut inner = self.inner.write()?;
        inner.require_write("add an object")?;
        let schema = inner.resolve_schema(object.schema_arc())?;

        let seq = inner.next_seq;
        let mut record = ObjectRecord::new(schema.name(), seq);
        for property in schema.properties() {
            let values = lists.get(&property.name).cloned().unwrap_or_default();
            for value in &values {
                property.validate(value)?;
            }
            record.lists.insert(property.name.clone(), values);
        }

        let id = ObjectId::new();
        let flag = Arc::new(AtomicBool::new(false));
        inner.record(Change::AddObject { id })?;
        inner.next_seq += 1;
        inner.objects.insert(id, record);
        inner.flags.insert(id, flag.clone());
        drop(inner);

        *state = ObjectState::Managed {
            store: self.clone(),
            id,
            invalidated: flag,
        };
        debug!("added {} object {}", schema.name(), id);
        Ok(())
    }

    /// Deletes a managed object. Every handle to it, and every list obtained
    /// from it, is invalidated.
    pub fn delete(&self, object: &Object) -> Result<()> {
        let state = object.state().read()?;
        let (id, handle_flag) = match &*state {
            ObjectState::Unmanaged { .. } => return Err(DbError::ForeignObject),
            ObjectState::Managed {
                store,
                id,
                invalidated,
            } => {
                if !store.ptr_eq(self) {
                    return Err(DbError::ForeignObject);
                }
                if invalidated.load(Ordering::SeqCst) {
                    return Err(invalidated_error());
                }
                (*id, invalidated.clone())
            }
        };

        let mut inner = self.inner.write()?;
        inner.require_write("delete an object")?;
        let record = inner.objects.remove(&id).ok_or_else(invalidated_error)?;
        inner.record(Change::DeleteObject { id, record })?;

        if let Some(flag) = inner.flags.remove(&id) {
            flag.store(true, Ordering::SeqCst);
        }
        handle_flag.store(true, Ordering::SeqCst);
        debug!("deleted object {}", id);
        Ok(())
    }

    /// Handles to every object of `type_name`, in insertion order.
    pub fn objects(&self, type_name: &str) -> Result<Vec<Object>> {
        let mut inner = self.inner.write()?;
        let schema = inner
            .schema
            .iter()
            .find(|schema| schema.name() == type_name)
            .cloned()
            .ok_or_else(|| DbError::ObjectTypeNotInSchema(type_name.to_string()))?;

        let mut ids: Vec<(u64, ObjectId)> = inner
            .objects
            .iter()
            .filter(|(_, record)| record.type_name == type_name)
            .map(|(id, record)| (record.seq, *id))
            .collect();
        ids.sort();

        let objects = ids
            .into_iter()
            .map(|(_, id)| {
                let flag = inner
                    .flags
                    .entry(id)
                    .or_insert_with(|| Arc::new(AtomicBool::new(false)))
                    .clone();
                Object::attached(schema.clone(), self.clone(), id, flag)
            })
            .collect();
        Ok(objects)
    }

    pub fn object_count(&self) -> Result<usize> {
        Ok(self.inner.read()?.objects.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.object_count()? == 0)
    }

    /// Serializable copy of the committed and uncommitted state.
    pub fn export(&self) -> Result<StoreSnapshot> {
        Ok(self.inner.read()?.snapshot())
    }

    // ------------------------------------------------------------------
    // List access for managed objects
    // ------------------------------------------------------------------

    pub(crate) fn read_list<R>(
        &self,
        id: ObjectId,
        property: &str,
        f: impl FnOnce(&[Value]) -> Result<R>,
    ) -> Result<R> {
        let inner = self.inner.read()?;
        let record = inner.objects.get(&id).ok_or_else(invalidated_error)?;
        f(record.list(property))
    }

    pub(crate) fn edit_list<R>(
        &self,
        id: ObjectId,
        property: &ListProperty,
        f: impl FnOnce(&[Value]) -> Result<(Vec<ListEdit>, R)>,
    ) -> Result<R> {
        let mut guard = self.inner.write()?;
        let StoreInner { objects, write, .. } = &mut *guard;

        let txn = write
            .as_mut()
            .ok_or_else(|| DbError::NotInTransaction("modify a managed list".to_string()))?;
        let record = objects.get_mut(&id).ok_or_else(invalidated_error)?;
        let values = record.lists.entry(property.name.clone()).or_default();

        let (edits, output) = f(values.as_slice())?;
        for edit in edits {
            let undo = edit.apply(values);
            txn.record_change(Change::ListEdit {
                id,
                property: property.name.clone(),
                undo,
            })?;
        }
        Ok(output)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.read() {
            Ok(inner) => f
                .debug_struct("Store")
                .field("kind", &inner.config.kind)
                .field("schema_version", &inner.schema_version)
                .field("objects", &inner.objects.len())
                .field("in_write_transaction", &inner.write.is_some())
                .finish(),
            Err(_) => f.write_str("Store(<poisoned>)"),
        }
    }
}

fn registry_key(kind: &StoreKind) -> StoreKind {
    match kind {
        StoreKind::File(path) => {
            StoreKind::File(std::path::absolute(path).unwrap_or_else(|_| path.clone()))
        }
        StoreKind::InMemory(identifier) => StoreKind::InMemory(identifier.clone()),
    }
}

impl StoreInner {
    fn load(config: StoreConfig) -> Result<Self> {
        let persistence = match &config.kind {
            StoreKind::File(path) => Some(SnapshotManager::new(path)),
            StoreKind::InMemory(_) => None,
        };

        let stored = match &persistence {
            Some(manager) => manager.load()?,
            None => None,
        };

        if stored.is_none() && config.read_only {
            if let StoreKind::File(path) = &config.kind {
                return Err(DbError::IoError(format!(
                    "Cannot open missing store file '{}' read-only",
                    path.display()
                )));
            }
        }

        let schema = config
            .object_types
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(Arc::new)
            .collect();

        let mut inner = StoreInner {
            schema_version: config.schema_version,
            config,
            schema,
            objects: HashMap::new(),
            flags: HashMap::new(),
            next_seq: 1,
            write: None,
            persistence,
        };

        match stored {
            Some(snapshot) => inner.restore(snapshot)?,
            None => {
                if let Some(manager) = &inner.persistence {
                    manager.save(&inner.snapshot())?;
                }
            }
        }

        debug!(
            "opened store {:?} (schema version {}, {} objects)",
            inner.config.kind,
            inner.schema_version,
            inner.objects.len()
        );
        Ok(inner)
    }

    fn restore(&mut self, snapshot: StoreSnapshot) -> Result<()> {
        let stored_version = snapshot.schema_version;
        let configured_version = self.config.schema_version;

        if stored_version > configured_version {
            return Err(DbError::SchemaVersionMismatch(format!(
                "Provided schema version {} is less than last set version {}",
                configured_version, stored_version
            )));
        }

        let target_schema: Vec<ObjectSchema> = match &self.config.object_types {
            Some(types) => types.clone(),
            None => snapshot.schema.clone(),
        };
        let schema_changed = !schemas_match(&snapshot.schema, &target_schema);
        let version_bumped = configured_version > stored_version;

        let mut records: HashMap<ObjectId, ObjectRecord> = snapshot.objects.into_iter().collect();

        if schema_changed && self.config.delete_if_migration_needed {
            warn!(
                "schema of {:?} changed; discarding {} stored objects",
                self.config.kind,
                records.len()
            );
            records.clear();
        } else if schema_changed || version_bumped {
            if self.config.read_only {
                return Err(DbError::MigrationRequired(
                    "a read-only store cannot be migrated".to_string(),
                ));
            }
            if !version_bumped {
                return Err(DbError::MigrationRequired(format!(
                    "the schema changed but the schema version is still {}",
                    stored_version
                )));
            }

            info!(
                "migrating {:?} from schema version {} to {}",
                self.config.kind, stored_version, configured_version
            );
            if let Some(migrate) = self.config.migration.clone() {
                let mut migration = Migration::new(
                    &mut records,
                    &snapshot.schema,
                    &target_schema,
                    stored_version,
                    configured_version,
                );
                migrate(&mut migration, stored_version);
            }

            records.retain(|_, record| {
                target_schema
                    .iter()
                    .any(|schema| schema.name() == record.type_name)
            });
            for record in records.values_mut() {
                if let Some(schema) = target_schema
                    .iter()
                    .find(|schema| schema.name() == record.type_name)
                {
                    record.conform(schema)?;
                }
            }
        }

        self.next_seq = records.values().map(|r| r.seq).max().unwrap_or(0) + 1;
        self.objects = records;
        self.schema = target_schema.into_iter().map(Arc::new).collect();

        if (schema_changed || version_bumped) && !self.config.read_only {
            if let Some(manager) = &self.persistence {
                manager.save(&self.snapshot())?;
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot::new(
            self.schema_version,
            self.schema.iter().map(|schema| (**schema).clone()).collect(),
            self.objects
                .iter()
                .map(|(id, record)| (*id, record.clone()))
                .collect(),
        )
    }

    fn require_write(&self, action: &str) -> Result<()> {
        if self.write.is_none() {
            return Err(DbError::NotInTransaction(action.to_string()));
        }
        Ok(())
    }

    fn record(&mut self, change: Change) -> Result<()> {
        match self.write.as_mut() {
            Some(txn) => txn.record_change(change),
            None => Err(DbError::NotInTransaction("record a change".to_string())),
        }
    }

    /// Finds the stored schema for an object's type, registering it when the
    /// store has no explicit type list.
    fn resolve_schema(&mut self, schema: &Arc<ObjectSchema>) -> Result<Arc<ObjectSchema>> {
        if let Some(existing) = self.schema.iter().find(|s| s.name() == schema.name()) {
            if !existing.same_shape(schema) {
                return Err(DbError::TypeMismatch(format!(
                    "Object type '{}' does not match the schema stored in this store",
                    schema.name()
                )));
            }
            return Ok(existing.clone());
        }

        if self.config.object_types.is_some() {
            return Err(DbError::ObjectTypeNotInSchema(schema.name().to_string()));
        }

        self.record(Change::RegisterSchema {
            name: schema.name().to_string(),
        })?;
        self.schema.push(schema.clone());
        debug!("registered object type {}", schema.name());
        Ok(schema.clone())
    }

    fn revert(&mut self, changes: Vec<Change>) {
        for change in changes {
            match change {
                Change::AddObject { id } => {
                    self.objects.remove(&id);
                    if let Some(flag) = self.flags.remove(&id) {
                        flag.store(true, Ordering::SeqCst);
                    }
                }
                Change::DeleteObject { id, record } => {
                    // Handles that saw the deletion stay invalidated; new
                    // handles get a fresh flag.
                    self.objects.insert(id, record);
                    self.flags.remove(&id);
                }
                Change::RegisterSchema { name } => {
                    self.schema.retain(|schema| schema.name() != name);
                }
                Change::ListEdit { id, property, undo } => {
                    if let Some(record) = self.objects.get_mut(&id) {
                        undo.revert(record.lists.entry(property).or_default());
                    }
                }
            }
        }
    }
}
