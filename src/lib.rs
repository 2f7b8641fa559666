//! # HBnB - object storage for the HBnB clone
//!
//! A fixed set of entity types persisted through one store interface.
//!
//! HBnB provides:
//! - A closed entity registry (`BaseModel`, `User`, `State`, `City`, `Place`, `Review`, `Amenity`)
//! - Composite `Type.id` keys addressing exactly one entity per store
//! - A JSON file store and a SQLite-backed relational store behind the `Storage` trait
//! - Derived relations (cities of a state, reviews of a place, ...) resolved per backend
//! - A storage selector that builds the single active store from configuration

pub mod entity;
pub mod key;
pub mod relation;
pub mod storage;
pub mod config;
pub mod commands;
pub mod ui;

// Re-exports for convenient access
pub use entity::{Amenity, BaseFields, BaseModel, City, Entity, EntityKind, Place, Review, State, User};
pub use key::EntityKey;
pub use relation::Relation;
pub use storage::{open_storage, DbStorage, FileStorage, Storage};
pub use config::{Config, StorageMode};

/// Result type alias for HBnB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for HBnB operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown entity type: {0}")]
    UnknownType(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} has no table in the database store")]
    Unmapped(EntityKind),

    #[error("No relation from {owner} to {target}")]
    NoRelation { owner: EntityKind, target: EntityKind },

    #[error("No active session (reload the store first)")]
    NoSession,
}
