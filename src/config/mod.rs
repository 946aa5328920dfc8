// ============================================================================
// Store Configuration
// ============================================================================
//
// Builder-style configuration for opening a `Store`, plus the process-wide
// default configuration used by `Store::open_default`.
//
// ============================================================================

use crate::core::{DbError, Result};
use crate::object::ObjectSchema;
use crate::storage::Migration;
use lazy_static::lazy_static;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Required length of an encryption key, in bytes.
pub const ENCRYPTION_KEY_LEN: usize = 64;

/// File name used by the default configuration.
pub const DEFAULT_FILE_NAME: &str = "default.primdb";

/// Callback run while opening a store whose stored schema version is older
/// than the configured one. Receives the migration context and the old
/// schema version.
pub type MigrationFn = Arc<dyn Fn(&mut Migration<'_>, u64) + Send + Sync>;

/// Where a store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// A single snapshot file on disk.
    File(PathBuf),

    /// A process-local region shared by every store opened with the same
    /// identifier, discarded once the last handle is dropped.
    InMemory(String),
}

#[derive(Clone)]
pub struct StoreConfig {
    pub kind: StoreKind,

    /// Must be exactly [`ENCRYPTION_KEY_LEN`] bytes when set.
    pub encryption_key: Option<Vec<u8>>,

    pub read_only: bool,

    pub schema_version: u64,

    pub migration: Option<MigrationFn>,

    /// Discard the stored data instead of failing when the schema changed.
    pub delete_if_migration_needed: bool,

    /// Explicit object types. `None` accepts any type added at runtime.
    pub object_types: Option<Vec<ObjectSchema>>,
}

lazy_static! {
    static ref DEFAULT_CONFIGURATION: RwLock<StoreConfig> =
        RwLock::new(StoreConfig::file(DEFAULT_FILE_NAME));
}

impl StoreConfig {
    /// Configuration for a file-backed store.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::with_kind(StoreKind::File(path.as_ref().to_path_buf()))
    }

    /// Configuration for an in-memory store identified by `identifier`.
    pub fn in_memory(identifier: &str) -> Self {
        Self::with_kind(StoreKind::InMemory(identifier.to_string()))
    }

    pub fn with_kind(kind: StoreKind) -> Self {
        Self {
            kind,
            encryption_key: None,
            read_only: false,
            schema_version: 0,
            migration: None,
            delete_if_migration_needed: false,
            object_types: None,
        }
    }

    /// Returns a copy of the process-wide default configuration.
    pub fn default_configuration() -> Self {
        match DEFAULT_CONFIGURATION.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replaces the process-wide default configuration.
    pub fn set_default_configuration(config: StoreConfig) {
        match DEFAULT_CONFIGURATION.write() {
            Ok(mut current) => *current = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    pub fn kind(mut self, kind: StoreKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn encryption_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.encryption_key = Some(key.into());
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn schema_version(mut self, version: u64) -> Self {
        self.schema_version = version;
        self
    }

    pub fn migration<F>(mut self, migration: F) -> Self
    where
        F: Fn(&mut Migration<'_>, u64) + Send + Sync + 'static,
    {
        self.migration = Some(Arc::new(migration));
        self
    }

    pub fn delete_if_migration_needed(mut self, delete: bool) -> Self {
        self.delete_if_migration_needed = delete;
        self
    }

    pub fn object_types(mut self, types: Vec<ObjectSchema>) -> Self {
        self.object_types = Some(types);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.read_only && self.delete_if_migration_needed {
            return Err(DbError::MutuallyExclusiveConfiguration(
                "Cannot set `delete_if_migration_needed` when `read_only` is set.".to_string(),
            ));
        }

        if let Some(key) = &self.encryption_key {
            if key.len() != ENCRYPTION_KEY_LEN {
                return Err(DbError::InvalidConfiguration(format!(
                    "Encryption key must be exactly {} bytes, got {}",
                    ENCRYPTION_KEY_LEN,
                    key.len()
                )));
            }
        }

        match &self.kind {
            StoreKind::InMemory(identifier) if identifier.is_empty() => {
                return Err(DbError::InvalidConfiguration(
                    "In-memory identifier cannot be empty".to_string(),
                ));
            }
            StoreKind::File(path) if path.as_os_str().is_empty() => {
                return Err(DbError::InvalidConfiguration("File path cannot be empty".to_string()));
            }
            _ => {}
        }

        if let Some(types) = &self.object_types {
            for (i, schema) in types.iter().enumerate() {
                if types[..i].iter().any(|other| other.name() == schema.name()) {
                    return Err(DbError::InvalidConfiguration(format!(
                        "Object type '{}' is listed more than once",
                        schema.name()
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::default_configuration()
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("kind", &self.kind)
            // Never print key material
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "***"))
            .field("read_only", &self.read_only)
            .field("schema_version", &self.schema_version)
            .field("migration", &self.migration.is_some())
            .field("delete_if_migration_needed", &self.delete_if_migration_needed)
            .field("object_types", &self.object_types)
            .finish()
    }
}
