//! Database schema definitions

use crate::entity::EntityKind;

/// SQL to create the users table
pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id VARCHAR(60) PRIMARY KEY NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    email VARCHAR(128) NOT NULL,
    password VARCHAR(128) NOT NULL,
    first_name VARCHAR(128),
    last_name VARCHAR(128)
)
"#;

/// SQL to create the states table
pub const CREATE_STATES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS states (
    id VARCHAR(60) PRIMARY KEY NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    name VARCHAR(128) NOT NULL
)
"#;

/// SQL to create the cities table
pub const CREATE_CITIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS cities (
    id VARCHAR(60) PRIMARY KEY NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    state_id VARCHAR(60) NOT NULL REFERENCES states(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
    name VARCHAR(128) NOT NULL
)
"#;

/// SQL to create the amenities table
pub const CREATE_AMENITIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS amenities (
    id VARCHAR(60) PRIMARY KEY NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    name VARCHAR(128) NOT NULL
)
"#;

/// SQL to create the places table
pub const CREATE_PLACES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS places (
    id VARCHAR(60) PRIMARY KEY NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    city_id VARCHAR(60) NOT NULL REFERENCES cities(id) DEFERRABLE INITIALLY DEFERRED,
    user_id VARCHAR(60) NOT NULL REFERENCES users(id) DEFERRABLE INITIALLY DEFERRED,
    name VARCHAR(128) NOT NULL,
    description VARCHAR(1024),
    number_rooms INTEGER NOT NULL DEFAULT 0,
    number_bathrooms INTEGER NOT NULL DEFAULT 0,
    max_guest INTEGER NOT NULL DEFAULT 0,
    price_by_night INTEGER NOT NULL DEFAULT 0,
    latitude REAL,
    longitude REAL
)
"#;

/// SQL to create the reviews table
pub const CREATE_REVIEWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reviews (
    id VARCHAR(60) PRIMARY KEY NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    place_id VARCHAR(60) NOT NULL REFERENCES places(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
    user_id VARCHAR(60) NOT NULL REFERENCES users(id) DEFERRABLE INITIALLY DEFERRED,
    text VARCHAR(1024) NOT NULL
)
"#;

/// SQL to create the place/amenity association table
pub const CREATE_PLACE_AMENITY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS place_amenity (
    place_id VARCHAR(60) NOT NULL REFERENCES places(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
    amenity_id VARCHAR(60) NOT NULL REFERENCES amenities(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
    PRIMARY KEY (place_id, amenity_id)
)
"#;

/// Tables in drop order: children before parents
pub const DROP_ORDER: &[&str] = &[
    "place_amenity",
    "reviews",
    "places",
    "cities",
    "states",
    "amenities",
    "users",
];

/// Columns of a mapped kind, in select/insert order.
///
/// Every table starts with `id, created_at, updated_at`. `BaseModel` has none.
pub fn columns(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::BaseModel => &[],
        EntityKind::User => &["id", "created_at", "updated_at", "email", "password", "first_name", "last_name"],
        EntityKind::State => &["id", "created_at", "updated_at", "name"],
        EntityKind::City => &["id", "created_at", "updated_at", "state_id", "name"],
        EntityKind::Amenity => &["id", "created_at", "updated_at", "name"],
        EntityKind::Place => &[
            "id",
            "created_at",
            "updated_at",
            "city_id",
            "user_id",
            "name",
            "description",
            "number_rooms",
            "number_bathrooms",
            "max_guest",
            "price_by_night",
            "latitude",
            "longitude",
        ],
        EntityKind::Review => &["id", "created_at", "updated_at", "place_id", "user_id", "text"],
    }
}

/// All schema creation statements, parents first
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_USERS_TABLE,
        CREATE_STATES_TABLE,
        CREATE_CITIES_TABLE,
        CREATE_AMENITIES_TABLE,
        CREATE_PLACES_TABLE,
        CREATE_REVIEWS_TABLE,
        CREATE_PLACE_AMENITY_TABLE,
    ]
}

/// Statements dropping every table
pub fn drop_statements() -> Vec<String> {
    DROP_ORDER
        .iter()
        .map(|table| format!("DROP TABLE IF EXISTS {}", table))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mapped_kind_has_columns() {
        for kind in EntityKind::all() {
            let cols = columns(*kind);
            match kind.table() {
                Some(_) => assert_eq!(&cols[..3], &["id", "created_at", "updated_at"]),
                None => assert!(cols.is_empty()),
            }
        }
    }

    #[test]
    fn test_drop_order_covers_every_table() {
        for kind in EntityKind::all() {
            if let Some(table) = kind.table() {
                assert!(DROP_ORDER.contains(&table));
            }
        }
        assert!(DROP_ORDER.contains(&"place_amenity"));
    }
}
