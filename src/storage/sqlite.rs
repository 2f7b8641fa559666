//! SQLite storage implementation
//!
//! One table per mapped entity kind plus `place_amenity`. The connection
//! always has one open session (a transaction begun by `reload`): `insert`
//! and `delete` write into it, queries see its staged work, and `save`
//! commits it and begins the next one.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::{Map, Value};

use super::{schema, Storage};
use crate::config::{DatabaseConfig, DatabaseLocator};
use crate::entity::{Entity, EntityKind};
use crate::key::EntityKey;
use crate::relation::Relation;
use crate::{Error, Result};

/// SQLite-backed store
pub struct DbStorage {
    conn: Connection,
    target: String,
    in_session: bool,
}

impl DbStorage {
    /// Connect using validated connection parameters.
    ///
    /// With `reset`, every table is dropped before anything else happens.
    pub fn connect(config: &DatabaseConfig, reset: bool) -> Result<Self> {
        tracing::info!("connecting to {}", config.redacted_url());
        match config.locator() {
            DatabaseLocator::Memory => Self::open_in_memory(reset),
            DatabaseLocator::File(path) => Self::open(&path, reset),
        }
    }

    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path, reset: bool) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, path.display().to_string(), reset)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory(reset: bool) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, ":memory:".to_string(), reset)
    }

    fn from_connection(conn: Connection, target: String, reset: bool) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        // Readers keep their session snapshot without blocking the writer
        let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!("{} journal mode: {}", target, mode);

        let store = Self { conn, target, in_session: false };
        if reset {
            store.drop_all()?;
        }
        Ok(store)
    }

    /// Drop every table, children first
    fn drop_all(&self) -> Result<()> {
        for stmt in schema::drop_statements() {
            self.conn.execute(&stmt, [])?;
        }
        tracing::warn!("dropped all tables in {}", self.target);
        Ok(())
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    fn ensure_session(&self) -> Result<()> {
        if self.in_session { Ok(()) } else { Err(Error::NoSession) }
    }

    fn begin(&mut self) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        self.in_session = true;
        Ok(())
    }

    /// Discard the open session, if any
    fn rollback(&mut self) {
        if !self.in_session {
            return;
        }
        self.in_session = false;
        if let Err(e) = self.conn.execute("ROLLBACK", []) {
            // A failed COMMIT may already have ended the transaction
            tracing::debug!("rollback on {}: {}", self.target, e);
        }
    }

    // ========== Row Mapping ==========

    /// Select entities of `kind` from its table aliased as `t`.
    ///
    /// `tail` follows the `FROM` clause and may bind one `?1` parameter.
    fn query_kind(&self, kind: EntityKind, tail: &str, param: Option<&str>) -> Result<Vec<Entity>> {
        let table = kind.table().ok_or(Error::Unmapped(kind))?;
        let columns = schema::columns(kind);
        let select = columns.iter().map(|c| format!("t.{}", c)).collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT {} FROM {} t {}", select, table, tail);

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(param), |row| {
                let mut record = Map::new();
                for (i, column) in columns.iter().enumerate() {
                    record.insert(column.to_string(), sql_to_json(row.get_ref(i)?));
                }
                Ok(record)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut entities = Vec::with_capacity(records.len());
        for record in records {
            let mut entity = Entity::from_kind_record(kind, record)?;
            if let Entity::Place(place) = &mut entity {
                place.amenity_ids = self.amenity_ids_of(&place.base.id)?;
            }
            entities.push(entity);
        }
        Ok(entities)
    }

    fn amenity_ids_of(&self, place_id: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT amenity_id FROM place_amenity WHERE place_id = ?1 ORDER BY amenity_id")?;
        let ids = stmt
            .query_map([place_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    fn exists(&self, key: &EntityKey) -> Result<bool> {
        let Some(table) = key.kind.table() else {
            return Ok(false);
        };
        let found = self
            .conn
            .query_row(&format!("SELECT 1 FROM {} WHERE id = ?1", table), [&key.id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert or update the row for `entity` (and its amenity links)
    fn upsert(&self, entity: &Entity) -> Result<()> {
        let kind = entity.kind();
        let table = kind.table().ok_or(Error::Unmapped(kind))?;
        let columns = schema::columns(kind);
        let record = entity.to_record()?;

        let placeholders = (1..=columns.len()).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ");
        let updates = columns
            .iter()
            .filter(|c| **c != "id")
            .map(|c| format!("{c} = excluded.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT(id) DO UPDATE SET {}",
            table,
            columns.join(", "),
            placeholders,
            updates
        );

        let values = columns
            .iter()
            .map(|c| json_to_sql(record.get(*c).unwrap_or(&Value::Null)));
        self.conn.execute(&sql, params_from_iter(values))?;

        if let Entity::Place(place) = entity {
            self.conn
                .execute("DELETE FROM place_amenity WHERE place_id = ?1", [&place.base.id])?;
            for amenity_id in &place.amenity_ids {
                self.conn.execute(
                    "INSERT OR IGNORE INTO place_amenity (place_id, amenity_id) VALUES (?1, ?2)",
                    params![place.base.id, amenity_id],
                )?;
            }
        }
        Ok(())
    }
}

impl Storage for DbStorage {
    fn all(&self, kind: Option<EntityKind>) -> Result<BTreeMap<String, Entity>> {
        self.ensure_session()?;
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => EntityKind::all().to_vec(),
        };

        let mut data = BTreeMap::new();
        for kind in kinds.into_iter().filter(|k| k.table().is_some()) {
            for entity in self.query_kind(kind, "ORDER BY t.id", None)? {
                data.insert(entity.key().to_string(), entity);
            }
        }
        Ok(data)
    }

    fn insert(&mut self, entity: Entity) -> Result<()> {
        self.ensure_session()?;
        self.upsert(&entity)?;
        tracing::debug!("staged {}", entity.key());
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        self.ensure_session()?;
        match self.conn.execute("COMMIT", []) {
            Ok(_) => {
                self.in_session = false;
                tracing::info!("committed session on {}", self.target);
                self.begin()
            }
            Err(e) => {
                tracing::warn!("commit failed on {}, rolling back: {}", self.target, e);
                self.rollback();
                self.begin()?;
                Err(e.into())
            }
        }
    }

    fn delete(&mut self, key: Option<&EntityKey>) -> Result<()> {
        self.ensure_session()?;
        let Some(key) = key else {
            return Ok(());
        };
        let Some(table) = key.kind.table() else {
            return Ok(());
        };

        if self.exists(key)? {
            self.conn.execute(&format!("DELETE FROM {} WHERE id = ?1", table), [&key.id])?;
            tracing::debug!("staged delete of {}", key);
        }
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        self.rollback();
        self.initialize_schema()?;
        self.begin()?;
        tracing::info!("schema ready, session open on {}", self.target);
        Ok(())
    }

    fn related(&self, owner: &EntityKey, target: EntityKind) -> Result<Vec<Entity>> {
        self.ensure_session()?;
        let owner_id = Some(owner.id.as_str());

        match Relation::between(owner.kind, target)? {
            Relation::ForeignKey { target, field } => {
                self.query_kind(target, &format!("WHERE t.{} = ?1 ORDER BY t.id", field), owner_id)
            }
            Relation::PlaceAmenities => self.query_kind(
                EntityKind::Amenity,
                "JOIN place_amenity pa ON pa.amenity_id = t.id WHERE pa.place_id = ?1 ORDER BY t.id",
                owner_id,
            ),
            Relation::AmenityPlaces => self.query_kind(
                EntityKind::Place,
                "JOIN place_amenity pa ON pa.place_id = t.id WHERE pa.amenity_id = ?1 ORDER BY t.id",
                owner_id,
            ),
        }
    }

    fn backend(&self) -> &'static str {
        "db"
    }
}

fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
    }
}
