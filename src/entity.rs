//! Entity types - the fixed set of records HBnB persists
//!
//! Every entity carries the same base fields (`id`, `created_at`, `updated_at`)
//! plus its own typed fields. Entities cross the store boundary as JSON records
//! tagged with `__class__`, and the registry below is the only place a tag is
//! turned back into a concrete type.

use crate::key::EntityKey;
use crate::{Error, Result};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Record field holding the entity type tag
pub const CLASS_FIELD: &str = "__class__";

/// Fields owned by the store; attribute updates may not touch them.
const PROTECTED_FIELDS: &[&str] = &["id", "created_at", "updated_at", CLASS_FIELD];

/// The closed registry of entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Generic record with free-form attributes
    BaseModel,
    User,
    State,
    City,
    Amenity,
    Place,
    Review,
}

impl EntityKind {
    /// Type name as it appears in composite keys and `__class__` tags
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::BaseModel => "BaseModel",
            EntityKind::User => "User",
            EntityKind::State => "State",
            EntityKind::City => "City",
            EntityKind::Amenity => "Amenity",
            EntityKind::Place => "Place",
            EntityKind::Review => "Review",
        }
    }

    /// Get all entity kinds
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::BaseModel,
            EntityKind::User,
            EntityKind::State,
            EntityKind::City,
            EntityKind::Amenity,
            EntityKind::Place,
            EntityKind::Review,
        ]
    }

    /// Table backing this kind in the database store.
    ///
    /// `BaseModel` is never mapped to a table.
    pub fn table(&self) -> Option<&'static str> {
        match self {
            EntityKind::BaseModel => None,
            EntityKind::User => Some("users"),
            EntityKind::State => Some("states"),
            EntityKind::City => Some("cities"),
            EntityKind::Amenity => Some("amenities"),
            EntityKind::Place => Some("places"),
            EntityKind::Review => Some("reviews"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EntityKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownType(s.to_string()))
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity and timestamps shared by every entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseFields {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl BaseFields {
    /// Fresh identity: a v4 UUID and "now" for both timestamps
    pub fn new() -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for BaseFields {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseModel {
    #[serde(flatten)]
    pub base: BaseFields,
    /// Free-form attributes
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BaseModel {
    pub fn new() -> Self {
        Self { base: BaseFields::new(), extra: Map::new() }
    }
}

impl Default for BaseModel {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub base: BaseFields,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base: BaseFields::new(),
            email: email.into(),
            password: password.into(),
            first_name: None,
            last_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(flatten)]
    pub base: BaseFields,
    #[serde(default)]
    pub name: String,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self { base: BaseFields::new(), name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(flatten)]
    pub base: BaseFields,
    #[serde(default)]
    pub state_id: String,
    #[serde(default)]
    pub name: String,
}

impl City {
    pub fn new(state_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base: BaseFields::new(),
            state_id: state_id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub base: BaseFields,
    #[serde(default)]
    pub name: String,
}

impl Amenity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { base: BaseFields::new(), name: name.into() }
    }
}

/// A place to stay.
///
/// `amenity_ids` is the file store's side of the place/amenity association;
/// the database store keeps it in sync with the `place_amenity` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(flatten)]
    pub base: BaseFields,
    #[serde(default)]
    pub city_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub number_rooms: i64,
    #[serde(default)]
    pub number_bathrooms: i64,
    #[serde(default)]
    pub max_guest: i64,
    #[serde(default)]
    pub price_by_night: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub amenity_ids: Vec<String>,
}

impl Place {
    pub fn new(city_id: impl Into<String>, user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base: BaseFields::new(),
            city_id: city_id.into(),
            user_id: user_id.into(),
            name: name.into(),
            description: None,
            number_rooms: 0,
            number_bathrooms: 0,
            max_guest: 0,
            price_by_night: 0,
            latitude: None,
            longitude: None,
            amenity_ids: Vec::new(),
        }
    }

    /// Link an amenity to this place. Linking twice is a no-op.
    pub fn add_amenity(&mut self, amenity: &Amenity) {
        if !self.amenity_ids.contains(&amenity.base.id) {
            self.amenity_ids.push(amenity.base.id.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub base: BaseFields,
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub text: String,
}

impl Review {
    pub fn new(place_id: impl Into<String>, user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            base: BaseFields::new(),
            place_id: place_id.into(),
            user_id: user_id.into(),
            text: text.into(),
        }
    }
}

/// Any persisted record, one variant per registered kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    BaseModel(BaseModel),
    User(User),
    State(State),
    City(City),
    Amenity(Amenity),
    Place(Place),
    Review(Review),
}

macro_rules! impl_from_variant {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Entity {
                fn from(value: $variant) -> Self {
                    Entity::$variant(value)
                }
            }
        )*
    };
}

impl_from_variant!(BaseModel, User, State, City, Amenity, Place, Review);

impl Entity {
    /// Fresh entity of the given kind with default field values
    pub fn blank(kind: EntityKind) -> Self {
        match kind {
            EntityKind::BaseModel => BaseModel::new().into(),
            EntityKind::User => User::new("", "").into(),
            EntityKind::State => State::new("").into(),
            EntityKind::City => City::new("", "").into(),
            EntityKind::Amenity => Amenity::new("").into(),
            EntityKind::Place => Place::new("", "", "").into(),
            EntityKind::Review => Review::new("", "", "").into(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::BaseModel(_) => EntityKind::BaseModel,
            Entity::User(_) => EntityKind::User,
            Entity::State(_) => EntityKind::State,
            Entity::City(_) => EntityKind::City,
            Entity::Amenity(_) => EntityKind::Amenity,
            Entity::Place(_) => EntityKind::Place,
            Entity::Review(_) => EntityKind::Review,
        }
    }

    pub fn base(&self) -> &BaseFields {
        match self {
            Entity::BaseModel(e) => &e.base,
            Entity::User(e) => &e.base,
            Entity::State(e) => &e.base,
            Entity::City(e) => &e.base,
            Entity::Amenity(e) => &e.base,
            Entity::Place(e) => &e.base,
            Entity::Review(e) => &e.base,
        }
    }

    fn base_mut(&mut self) -> &mut BaseFields {
        match self {
            Entity::BaseModel(e) => &mut e.base,
            Entity::User(e) => &mut e.base,
            Entity::State(e) => &mut e.base,
            Entity::City(e) => &mut e.base,
            Entity::Amenity(e) => &mut e.base,
            Entity::Place(e) => &mut e.base,
            Entity::Review(e) => &mut e.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    /// Composite key addressing this entity in a store
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.kind(), self.id())
    }

    /// Refresh `updated_at`
    pub fn touch(&mut self) {
        self.base_mut().updated_at = Utc::now().naive_utc();
    }

    /// Value of a "belongs to" foreign-key field, if this entity has it
    pub fn reference(&self, field: &str) -> Option<&str> {
        match (self, field) {
            (Entity::City(c), "state_id") => Some(&c.state_id),
            (Entity::Place(p), "city_id") => Some(&p.city_id),
            (Entity::Place(p), "user_id") => Some(&p.user_id),
            (Entity::Review(r), "place_id") => Some(&r.place_id),
            (Entity::Review(r), "user_id") => Some(&r.user_id),
            _ => None,
        }
    }

    /// Amenity ids linked to a place; empty for every other kind
    pub fn amenity_ids(&self) -> &[String] {
        match self {
            Entity::Place(p) => &p.amenity_ids,
            _ => &[],
        }
    }

    /// Short human label (the `name` field where the kind has one)
    pub fn label(&self) -> Option<&str> {
        match self {
            Entity::State(e) => Some(&e.name),
            Entity::City(e) => Some(&e.name),
            Entity::Amenity(e) => Some(&e.name),
            Entity::Place(e) => Some(&e.name),
            Entity::User(e) => Some(&e.email),
            Entity::Review(e) => Some(&e.text),
            Entity::BaseModel(e) => e.extra.get("name").and_then(Value::as_str),
        }
    }

    /// Field map of this entity, tagged with `__class__`
    pub fn to_record(&self) -> Result<Map<String, Value>> {
        let value = match self {
            Entity::BaseModel(e) => serde_json::to_value(e)?,
            Entity::User(e) => serde_json::to_value(e)?,
            Entity::State(e) => serde_json::to_value(e)?,
            Entity::City(e) => serde_json::to_value(e)?,
            Entity::Amenity(e) => serde_json::to_value(e)?,
            Entity::Place(e) => serde_json::to_value(e)?,
            Entity::Review(e) => serde_json::to_value(e)?,
        };

        let Value::Object(mut record) = value else {
            return Err(Error::InvalidAttribute(format!("{} did not serialize to a map", self.kind())));
        };
        record.insert(CLASS_FIELD.to_string(), Value::String(self.kind().as_str().to_string()));
        Ok(record)
    }

    /// Rebuild an entity from a tagged record.
    ///
    /// The `__class__` tag picks the type; an unregistered tag is
    /// `Error::UnknownType`.
    pub fn from_record(record: Map<String, Value>) -> Result<Self> {
        let tag = record
            .get(CLASS_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidAttribute(format!("record has no {} tag", CLASS_FIELD)))?;
        let kind = EntityKind::from_str(tag)?;
        Self::from_kind_record(kind, record)
    }

    /// Rebuild an entity of a known kind from its field map
    pub fn from_kind_record(kind: EntityKind, mut record: Map<String, Value>) -> Result<Self> {
        record.remove(CLASS_FIELD);
        let value = Value::Object(record);

        let entity = match kind {
            EntityKind::BaseModel => Entity::BaseModel(serde_json::from_value(value)?),
            EntityKind::User => Entity::User(serde_json::from_value(value)?),
            EntityKind::State => Entity::State(serde_json::from_value(value)?),
            EntityKind::City => Entity::City(serde_json::from_value(value)?),
            EntityKind::Amenity => Entity::Amenity(serde_json::from_value(value)?),
            EntityKind::Place => Entity::Place(serde_json::from_value(value)?),
            EntityKind::Review => Entity::Review(serde_json::from_value(value)?),
        };
        Ok(entity)
    }

    /// Copy of this entity with the given attributes applied and
    /// `updated_at` refreshed.
    ///
    /// Typed kinds only accept their own fields; `BaseModel` accepts anything.
    pub fn with_attributes(&self, attributes: Map<String, Value>) -> Result<Self> {
        let mut record = self.to_record()?;

        for (name, value) in attributes {
            if PROTECTED_FIELDS.contains(&name.as_str()) {
                return Err(Error::InvalidAttribute(format!("{} cannot be changed", name)));
            }
            if self.kind() != EntityKind::BaseModel && !record.contains_key(&name) {
                return Err(Error::InvalidAttribute(format!("{} has no attribute {}", self.kind(), name)));
            }
            record.insert(name, value);
        }

        let mut updated = Self::from_kind_record(self.kind(), record)?;
        updated.touch();
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_kind_roundtrip() {
        for kind in EntityKind::all() {
            let parsed: EntityKind = kind.as_str().parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn test_unknown_kind() {
        let err = EntityKind::from_str("Spaceship").unwrap_err();
        assert!(matches!(err, Error::UnknownType(name) if name == "Spaceship"));
    }

    #[test]
    fn test_base_model_is_unmapped() {
        assert_eq!(EntityKind::BaseModel.table(), None);
        assert_eq!(EntityKind::Place.table(), Some("places"));
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = State::new("California");
        let b = State::new("California");
        assert_ne!(a.base.id, b.base.id);
        assert_eq!(a.base.created_at, a.base.updated_at);
    }

    #[test]
    fn test_record_carries_class_tag() {
        let state: Entity = State::new("NewYork").into();
        let record = state.to_record().unwrap();

        assert_eq!(record[CLASS_FIELD], json!("State"));
        assert_eq!(record["name"], json!("NewYork"));
        assert_eq!(record["id"], json!(state.id()));
        assert!(record.contains_key("created_at"));
        assert!(record.contains_key("updated_at"));
    }

    #[test]
    fn test_record_roundtrip_preserves_fields() {
        let mut place = Place::new("city-1", "user-1", "Loft");
        place.latitude = Some(37.77);
        place.number_rooms = 3;
        place.description = Some("Cozy".to_string());
        let entity: Entity = place.into();

        let rebuilt = Entity::from_record(entity.to_record().unwrap()).unwrap();
        assert_eq!(rebuilt, entity);
    }

    #[test]
    fn test_base_model_keeps_free_attributes() {
        let mut model = BaseModel::new();
        model.extra.insert("sprint".to_string(), json!(3));
        let entity: Entity = model.into();

        let record = entity.to_record().unwrap();
        assert_eq!(record["sprint"], json!(3));

        let rebuilt = Entity::from_record(record).unwrap();
        let Entity::BaseModel(rebuilt) = rebuilt else { panic!("wrong variant") };
        assert_eq!(rebuilt.extra.len(), 1);
        assert_eq!(rebuilt.extra["sprint"], json!(3));
    }

    #[test]
    fn test_from_record_rejects_unknown_tag() {
        let mut record = Entity::from(State::new("Lagos")).to_record().unwrap();
        record.insert(CLASS_FIELD.to_string(), json!("Dragon"));

        assert!(matches!(Entity::from_record(record), Err(Error::UnknownType(_))));
    }

    #[test]
    fn test_from_record_requires_tag() {
        let mut record = Entity::from(State::new("Lagos")).to_record().unwrap();
        record.remove(CLASS_FIELD);

        assert!(Entity::from_record(record).is_err());
    }

    #[test]
    fn test_add_amenity_is_per_instance() {
        let wifi = Amenity::new("Wifi");
        let mut first = Place::new("c", "u", "First");
        let second = Place::new("c", "u", "Second");

        first.add_amenity(&wifi);
        first.add_amenity(&wifi);

        assert_eq!(first.amenity_ids, vec![wifi.base.id.clone()]);
        assert!(second.amenity_ids.is_empty());
    }

    #[test]
    fn test_reference_fields() {
        let city: Entity = City::new("state-9", "Lagos").into();
        assert_eq!(city.reference("state_id"), Some("state-9"));
        assert_eq!(city.reference("place_id"), None);
    }

    #[test]
    fn test_with_attributes_updates_typed_fields() {
        let state: Entity = State::new("Edo").into();
        let mut attrs = Map::new();
        attrs.insert("name".to_string(), json!("Edo State"));

        let updated = state.with_attributes(attrs).unwrap();
        let Entity::State(updated) = &updated else { panic!("wrong variant") };
        assert_eq!(updated.name, "Edo State");
        assert_eq!(updated.base.id, state.id());
        assert!(updated.base.updated_at >= state.base().updated_at);
    }

    #[test]
    fn test_with_attributes_rejects_unknown_and_protected() {
        let user: Entity = User::new("a@b.c", "pwd").into();

        let mut unknown = Map::new();
        unknown.insert("sprint".to_string(), json!(3));
        assert!(matches!(user.with_attributes(unknown), Err(Error::InvalidAttribute(_))));

        let mut protected = Map::new();
        protected.insert("id".to_string(), json!("other"));
        assert!(matches!(user.with_attributes(protected), Err(Error::InvalidAttribute(_))));
    }

    #[test]
    fn test_with_attributes_type_mismatch() {
        let place: Entity = Place::new("c", "u", "Loft").into();
        let mut attrs = Map::new();
        attrs.insert("number_rooms".to_string(), json!("many"));

        assert!(matches!(place.with_attributes(attrs), Err(Error::Json(_))));
    }
}
