//! Storage Layer - one store interface, two backends
//!
//! - `FileStorage`: every entity in memory, snapshotted to one JSON document
//! - `DbStorage`: SQLite tables per entity kind plus `place_amenity`
//!
//! Both address entities by the composite key `Type.id`. The application
//! builds exactly one store at startup through `open_storage` and passes it
//! around by reference.

pub mod file;
pub mod schema;
pub mod sqlite;

pub use file::FileStorage;
pub use sqlite::DbStorage;

use crate::config::{Config, StorageMode};
use crate::entity::{Entity, EntityKind};
use crate::key::EntityKey;
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Store interface shared by every backend
pub trait Storage {
    /// All tracked entities keyed by `Type.id`, optionally restricted to one kind.
    ///
    /// A kind with no entities yields an empty map.
    fn all(&self, kind: Option<EntityKind>) -> Result<BTreeMap<String, Entity>>;

    /// Stage a new or updated entity. Nothing is durable until `save`.
    fn insert(&mut self, entity: Entity) -> Result<()>;

    /// Make every staged change durable
    fn save(&mut self) -> Result<()>;

    /// Remove an entity from the active view. Absent keys and `None` are no-ops.
    fn delete(&mut self, key: Option<&EntityKey>) -> Result<()>;

    /// (Re)populate the active view from durable storage
    fn reload(&mut self) -> Result<()>;

    /// Entities of `target` kind derived from the entity at `owner`
    fn related(&self, owner: &EntityKey, target: EntityKind) -> Result<Vec<Entity>>;

    /// Short backend name for logs and output
    fn backend(&self) -> &'static str;

    /// Look up one entity by key
    fn get(&self, key: &EntityKey) -> Result<Option<Entity>> {
        Ok(self.all(Some(key.kind))?.remove(&key.to_string()))
    }

    /// Number of tracked entities, optionally of one kind
    fn count(&self, kind: Option<EntityKind>) -> Result<usize> {
        Ok(self.all(kind)?.len())
    }

    /// Remove the given entity from the active view
    fn delete_entity(&mut self, entity: &Entity) -> Result<()> {
        self.delete(Some(&entity.key()))
    }
}

/// Build the single active store described by `config` and load it.
///
/// Connection or schema failures here are fatal to the caller: there is no
/// store to fall back on.
pub fn open_storage(config: &Config) -> Result<Box<dyn Storage>> {
    let mut store: Box<dyn Storage> = match config.storage {
        StorageMode::File => Box::new(FileStorage::new(&config.file_path)),
        StorageMode::Database => {
            let database = config
                .database
                .as_ref()
                .ok_or_else(|| Error::Config("database storage selected without connection parameters".to_string()))?;
            Box::new(DbStorage::connect(database, config.is_test_env())?)
        }
    };

    store.reload()?;
    tracing::info!(backend = store.backend(), "storage ready");
    Ok(store)
}
