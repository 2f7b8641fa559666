//! Derived relations between entity kinds
//!
//! Collections such as "cities of a state" are never stored. Each backend
//! resolves a `Relation` its own way: the file store scans and filters, the
//! database store queries on the foreign key or joins through `place_amenity`.

use crate::entity::{Entity, EntityKind};
use crate::{Error, Result};

/// How entities of a target kind hang off an owner entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Targets whose `field` holds the owner's id
    ForeignKey { target: EntityKind, field: &'static str },
    /// Amenities listed on a place
    PlaceAmenities,
    /// Places listing an amenity
    AmenityPlaces,
}

impl Relation {
    /// Resolve the relation from `owner` to `target`
    pub fn between(owner: EntityKind, target: EntityKind) -> Result<Self> {
        use EntityKind::*;

        let relation = match (owner, target) {
            (State, City) => Relation::ForeignKey { target, field: "state_id" },
            (City, Place) => Relation::ForeignKey { target, field: "city_id" },
            (User, Place) => Relation::ForeignKey { target, field: "user_id" },
            (User, Review) => Relation::ForeignKey { target, field: "user_id" },
            (Place, Review) => Relation::ForeignKey { target, field: "place_id" },
            (Place, Amenity) => Relation::PlaceAmenities,
            (Amenity, Place) => Relation::AmenityPlaces,
            _ => return Err(Error::NoRelation { owner, target }),
        };
        Ok(relation)
    }

    /// Scan-and-filter resolution over a full entity set.
    ///
    /// `owner` is needed for `PlaceAmenities`, whose links live on the place.
    pub fn filter<'a, I>(&self, owner_id: &str, owner: Option<&Entity>, candidates: I) -> Vec<Entity>
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        match *self {
            Relation::ForeignKey { target, field } => candidates
                .into_iter()
                .filter(|e| e.kind() == target && e.reference(field) == Some(owner_id))
                .cloned()
                .collect(),
            Relation::PlaceAmenities => {
                let linked = owner.map(Entity::amenity_ids).unwrap_or_default();
                candidates
                    .into_iter()
                    .filter(|e| e.kind() == EntityKind::Amenity && linked.iter().any(|id| id == e.id()))
                    .cloned()
                    .collect()
            }
            Relation::AmenityPlaces => candidates
                .into_iter()
                .filter(|e| e.kind() == EntityKind::Place && e.amenity_ids().iter().any(|id| id == owner_id))
                .cloned()
                .collect(),
        }
    }
}
