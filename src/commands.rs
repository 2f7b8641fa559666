//! Store operations behind the `hbnb` subcommands
//!
//! Each function works on any `Storage` and leaves printing to the caller.
//! Mutating commands save before returning.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::entity::{Entity, EntityKind};
use crate::key::EntityKey;
use crate::storage::Storage;
use crate::{Error, Result};

fn param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<key>[A-Za-z_][A-Za-z0-9_]*)=(?P<value>.+)$").expect("valid regex"))
}

fn int_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+$").expect("valid regex"))
}

fn float_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+\.\d+$").expect("valid regex"))
}

/// Decode one parameter value.
///
/// `"quoted"` strings turn `_` into spaces and `\"` into `"`. Bare integers
/// and floats become numbers. Anything else is `None`.
pub fn parse_value(raw: &str) -> Option<Value> {
    if let Some(inner) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        if inner.replace("\\\"", "").contains('"') {
            return None;
        }
        return Some(Value::String(inner.replace('_', " ").replace("\\\"", "\"")));
    }
    if int_regex().is_match(raw) {
        return raw.parse::<i64>().ok().map(Value::from);
    }
    if float_regex().is_match(raw) {
        return raw.parse::<f64>().ok().map(Value::from);
    }
    None
}

/// Collect `key=value` parameters, skipping malformed ones
pub fn parse_params<S: AsRef<str>>(args: &[S]) -> Map<String, Value> {
    let mut params = Map::new();
    for arg in args {
        let arg = arg.as_ref();
        let parsed = param_regex()
            .captures(arg)
            .and_then(|caps| Some((caps["key"].to_string(), parse_value(&caps["value"])?)));
        match parsed {
            Some((key, value)) => {
                params.insert(key, value);
            }
            None => tracing::debug!("skipping parameter {:?}", arg),
        }
    }
    params
}

/// Create and save an entity of `kind` from `key=value` parameters
pub fn create<S: AsRef<str>>(store: &mut dyn Storage, kind: EntityKind, args: &[S]) -> Result<Entity> {
    let entity = Entity::blank(kind).with_attributes(parse_params(args))?;
    store.insert(entity.clone())?;
    store.save()?;
    Ok(entity)
}

pub fn show(store: &dyn Storage, key: &EntityKey) -> Result<Entity> {
    store
        .get(key)?
        .ok_or_else(|| Error::InvalidKey(format!("no instance found for {}", key)))
}

pub fn destroy(store: &mut dyn Storage, key: &EntityKey) -> Result<()> {
    show(store, key)?;
    store.delete(Some(key))?;
    store.save()
}

/// Set one attribute on a stored entity.
///
/// String fields take the raw value as-is; others accept the same value
/// forms as `create`, falling back to a plain string.
pub fn update(store: &mut dyn Storage, key: &EntityKey, attribute: &str, raw: &str) -> Result<Entity> {
    let current = show(store, key)?;
    let existing = current.to_record()?.remove(attribute);

    let value = match existing {
        Some(Value::String(_)) => Value::String(raw.trim_matches('"').to_string()),
        _ => parse_value(raw).unwrap_or_else(|| Value::String(raw.to_string())),
    };

    let mut attributes = Map::new();
    attributes.insert(attribute.to_string(), value);
    let updated = current.with_attributes(attributes)?;
    store.insert(updated.clone())?;
    store.save()?;
    Ok(updated)
}

/// Entity counts per kind, skipping kinds with none unless `kind` is given
pub fn counts(store: &dyn Storage, kind: Option<EntityKind>) -> Result<Vec<(EntityKind, usize)>> {
    match kind {
        Some(kind) => Ok(vec![(kind, store.count(Some(kind))?)]),
        None => {
            let mut rows = Vec::new();
            for kind in EntityKind::all() {
                let n = store.count(Some(*kind))?;
                if n > 0 {
                    rows.push((*kind, n));
                }
            }
            Ok(rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::State;
    use crate::storage::FileStorage;
    use tempfile::TempDir;

    #[test]
    fn test_parse_value_forms() {
        assert_eq!(parse_value("\"San_Francisco\""), Some(Value::from("San Francisco")));
        assert_eq!(parse_value(r#""My_\"little\"_house""#), Some(Value::from("My \"little\" house")));
        assert_eq!(parse_value("4"), Some(Value::from(4)));
        assert_eq!(parse_value("-122.431297"), Some(Value::from(-122.431297)));
        assert_eq!(parse_value("bare"), None);
        assert_eq!(parse_value("\"unbalanced"), None);
        assert_eq!(parse_value(r#""a"b""#), None);
    }

    #[test]
    fn test_parse_params_skips_malformed() {
        let params = parse_params(&["name=\"California\"", "junk", "rooms=3", "=\"x\"", "flag=yes"]);
        assert_eq!(params.len(), 2);
        assert_eq!(params["name"], Value::from("California"));
        assert_eq!(params["rooms"], Value::from(3));
    }

    #[test]
    fn test_create_show_update_destroy() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStorage::new(dir.path().join("file.json"));

        let created = create(&mut store, EntityKind::State, &["name=\"New_York\""]).unwrap();
        let key = created.key();
        let Entity::State(state) = show(&store, &key).unwrap() else {
            panic!("expected a state");
        };
        assert_eq!(state.name, "New York");
        assert!(store.path().exists());

        let updated = update(&mut store, &key, "name", "\"Albany\"").unwrap();
        assert_eq!(updated.label(), Some("Albany"));
        assert!(updated.base().updated_at >= created.base().updated_at);

        destroy(&mut store, &key).unwrap();
        assert!(matches!(show(&store, &key), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_create_rejects_unknown_attribute() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStorage::new(dir.path().join("file.json"));

        let err = create(&mut store, EntityKind::State, &["population=3"]).unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute(_)));
        assert_eq!(store.count(None).unwrap(), 0);
    }

    #[test]
    fn test_update_numeric_field() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStorage::new(dir.path().join("file.json"));
        let place = create(&mut store, EntityKind::Place, &["name=\"Loft\""]).unwrap();

        let Entity::Place(updated) = update(&mut store, &place.key(), "number_rooms", "4").unwrap() else {
            panic!("expected a place");
        };
        assert_eq!(updated.number_rooms, 4);
    }

    #[test]
    fn test_counts() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStorage::new(dir.path().join("file.json"));
        store.insert(State::new("Lagos").into()).unwrap();
        store.insert(State::new("Imo").into()).unwrap();

        assert_eq!(counts(&store, None).unwrap(), vec![(EntityKind::State, 2)]);
        assert_eq!(counts(&store, Some(EntityKind::City)).unwrap(), vec![(EntityKind::City, 0)]);
    }
}
