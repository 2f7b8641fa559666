//! JSON file storage implementation
//!
//! Every entity lives in one in-memory map keyed by `Type.id`. `save` writes
//! the whole map as a single JSON document; `reload` replaces the map with the
//! document's contents.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::Storage;
use crate::entity::{Entity, EntityKind};
use crate::key::EntityKey;
use crate::relation::Relation;
use crate::{Error, Result};

/// Default snapshot location
pub const DEFAULT_FILE_PATH: &str = "file.json";

/// File-backed store holding every entity in memory
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    objects: BTreeMap<String, Entity>,
}

impl FileStorage {
    /// Create an empty store snapshotting to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            objects: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point subsequent `save`/`reload` calls at another file
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }

    /// Forget every tracked entity (the file is left alone)
    pub fn reset(&mut self) {
        self.objects.clear();
    }

    /// Serialize the tracked entities as one JSON document
    fn render(&self) -> Result<String> {
        let mut records: BTreeMap<&str, Map<String, Value>> = BTreeMap::new();
        for (key, entity) in &self.objects {
            records.insert(key.as_str(), entity.to_record()?);
        }
        Ok(serde_json::to_string(&records)?)
    }

    /// Parse a snapshot document into a fresh map.
    ///
    /// Every entry must carry a registered `__class__` and sit under its own key.
    fn parse(contents: &str) -> Result<BTreeMap<String, Entity>> {
        let records: BTreeMap<String, Map<String, Value>> = serde_json::from_str(contents)?;

        let mut objects = BTreeMap::new();
        for (key, record) in records {
            let entity = Entity::from_record(record)?;
            let expected = entity.key().to_string();
            if key != expected {
                return Err(Error::InvalidKey(format!("{} holds a record for {}", key, expected)));
            }
            objects.insert(key, entity);
        }
        Ok(objects)
    }

    /// File the snapshot is written to: the configured path, or what it links to.
    ///
    /// An existing read-only target is refused rather than replaced.
    fn save_target(&self) -> io::Result<PathBuf> {
        let target = match fs::symlink_metadata(&self.path) {
            Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(&self.path)?,
            _ => self.path.clone(),
        };

        match fs::metadata(&target) {
            Ok(meta) if meta.permissions().readonly() => Err(io::Error::new(
                ErrorKind::PermissionDenied,
                format!("{} is read-only", target.display()),
            )),
            _ => Ok(target),
        }
    }

    fn temp_path(target: &Path) -> PathBuf {
        let mut name = OsString::from(target.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_PATH)
    }
}

impl Storage for FileStorage {
    fn all(&self, kind: Option<EntityKind>) -> Result<BTreeMap<String, Entity>> {
        let Some(kind) = kind else {
            return Ok(self.objects.clone());
        };

        Ok(self
            .objects
            .iter()
            .filter(|(key, _)| EntityKey::type_segment(key) == kind.as_str())
            .map(|(key, entity)| (key.clone(), entity.clone()))
            .collect())
    }

    fn insert(&mut self, entity: Entity) -> Result<()> {
        let key = entity.key().to_string();
        tracing::debug!("tracking {}", key);
        self.objects.insert(key, entity);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let document = self.render()?;
        let target = self.save_target()?;

        // Write beside the target, then swap it in
        let temp = Self::temp_path(&target);
        if let Err(e) = fs::write(&temp, document.as_bytes()).and_then(|_| fs::rename(&temp, &target)) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        tracing::info!("saved {} entities to {}", self.objects.len(), self.path.display());
        Ok(())
    }

    fn delete(&mut self, key: Option<&EntityKey>) -> Result<()> {
        if let Some(key) = key {
            if self.objects.remove(&key.to_string()).is_some() {
                tracing::debug!("deleted {}", key);
            }
        }
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("no snapshot at {}, keeping current state", self.path.display());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        self.objects = Self::parse(&contents)?;
        tracing::info!("loaded {} entities from {}", self.objects.len(), self.path.display());
        Ok(())
    }

    fn related(&self, owner: &EntityKey, target: EntityKind) -> Result<Vec<Entity>> {
        let relation = Relation::between(owner.kind, target)?;
        let owner_entity = self.objects.get(&owner.to_string());
        Ok(relation.filter(&owner.id, owner_entity, self.objects.values()))
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
