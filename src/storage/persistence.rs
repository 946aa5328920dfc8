//! Snapshot persistence for file-backed stores

use crate::core::{DbError, Result};
use crate::object::{ObjectId, ObjectSchema};
use crate::storage::ObjectRecord;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Version of the on-disk layout written by [`SnapshotManager`].
pub const FORMAT_VERSION: u32 = 1;

// ============================================================================
// Store Snapshot
// ============================================================================

/// Full content of a store: schema, schema version and every object record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub format_version: u32,
    pub schema_version: u64,
    pub schema: Vec<ObjectSchema>,
    pub objects: Vec<(ObjectId, ObjectRecord)>,
}

impl StoreSnapshot {
    pub fn new(
        schema_version: u64,
        schema: Vec<ObjectSchema>,
        mut objects: Vec<(ObjectId, ObjectRecord)>,
    ) -> Self {
        objects.sort_by_key(|(_, record)| record.seq);
        Self {
            format_version: FORMAT_VERSION,
            schema_version,
            schema,
            objects,
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of objects of `type_name`.
    pub fn count_of(&self, type_name: &str) -> usize {
        self.objects
            .iter()
            .filter(|(_, record)| record.type_name == type_name)
            .count()
    }
}

// ============================================================================
// Snapshot Manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    /// Writes the snapshot atomically: temp file in the same directory,
    /// fsync, then rename over the target.
    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let parent = match self.snapshot_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(io_error("create store directory"))?;

        let serialized = rmp_serde::to_vec(snapshot).map_err(|e| {
            DbError::SerializationError(format!("Failed to serialize snapshot: {}", e))
        })?;
        let mut temp = NamedTempFile::new_in(&parent).map_err(io_error("create temp file"))?;
        temp.write_all(&serialized).map_err(io_error("write snapshot"))?;
        temp.flush().map_err(io_error("flush snapshot"))?;
        temp.as_file().sync_all().map_err(io_error("sync snapshot"))?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| io_error("rename snapshot")(e.error))?;

        tracing::debug!(
            path = %self.snapshot_path.display(),
            bytes = serialized.len(),
            objects = snapshot.object_count(),
            "store snapshot written"
        );
        Ok(())
    }

    pub fn load(&self) -> Result<Option<StoreSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let mut file = File::open(&self.snapshot_path).map_err(io_error("open snapshot"))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(io_error("read snapshot"))?;
        let snapshot: StoreSnapshot = rmp_serde::from_slice(&data).map_err(|e| {
            DbError::SerializationError(format!("Failed to deserialize snapshot: {}", e))
        })?;

        if snapshot.format_version > FORMAT_VERSION {
            return Err(DbError::SerializationError(format!(
                "Unsupported store format version {} (newest known is {})",
                snapshot.format_version, FORMAT_VERSION
            )));
        }

        tracing::debug!(
            path = %self.snapshot_path.display(),
            objects = snapshot.object_count(),
            schema_version = snapshot.schema_version,
            "store snapshot loaded"
        );
        Ok(Some(snapshot))
    }
}

fn io_error(action: &'static str) -> impl Fn(std::io::Error) -> DbError {
    move |e| DbError::IoError(format!("Failed to {}: {}", action, e))
}
