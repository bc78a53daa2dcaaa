//! Store trait the search engine is written against. [`SqliteStore`] is the
//! durable implementation; tests wrap it to observe or disturb the calls the
//! engine makes. Every method is a synchronous request/response and store
//! failures are returned to the caller untouched.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::{
    DegreesError,
    graph::{EntityKind, EntityRecord, PersonResult, SqliteStore},
    pyramid::Pyramid,
};

pub trait GraphStore {
    /// Ids of the groups `person` belongs to, ascending and distinct.
    fn neighbors_of_person(&self, person: i64) -> Result<Vec<i64>, DegreesError>;
    /// Ids of the people in `group`, ascending and distinct.
    fn neighbors_of_group(&self, group: i64) -> Result<Vec<i64>, DegreesError>;
    /// Case-insensitive exact lookup; the lowest id wins on duplicates.
    fn resolve_by_name(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<EntityRecord>, DegreesError>;
    fn root_person(&self) -> Result<Option<i64>, DegreesError>;
    fn load_pyramid(&self) -> Result<Option<Pyramid>, DegreesError>;
    fn save_pyramid(&self, pyramid: &Pyramid) -> Result<(), DegreesError>;
    /// Writes one batch of results in a single transaction.
    fn upsert_results(&self, results: &[PersonResult]) -> Result<(), DegreesError>;
    fn entity_names(
        &self,
        kind: EntityKind,
        ids: &[i64],
    ) -> Result<AHashMap<i64, String>, DegreesError>;
    /// Members without a cached degree, keyed by group name, root excluded.
    fn unreachable_people(&self) -> Result<BTreeMap<String, Vec<String>>, DegreesError>;
}

impl GraphStore for SqliteStore {
    fn neighbors_of_person(&self, person: i64) -> Result<Vec<i64>, DegreesError> {
        self.fetch_groups_of(person)
    }

    fn neighbors_of_group(&self, group: i64) -> Result<Vec<i64>, DegreesError> {
        self.fetch_members_of(group)
    }

    fn resolve_by_name(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<EntityRecord>, DegreesError> {
        self.find_by_name(kind, name)
    }

    fn root_person(&self) -> Result<Option<i64>, DegreesError> {
        self.root_id()
    }

    fn load_pyramid(&self) -> Result<Option<Pyramid>, DegreesError> {
        self.read_pyramid()
    }

    fn save_pyramid(&self, pyramid: &Pyramid) -> Result<(), DegreesError> {
        self.write_pyramid(pyramid)
    }

    fn upsert_results(&self, results: &[PersonResult]) -> Result<(), DegreesError> {
        self.write_results(results)
    }

    fn entity_names(
        &self,
        kind: EntityKind,
        ids: &[i64],
    ) -> Result<AHashMap<i64, String>, DegreesError> {
        self.names_for(kind, ids)
    }

    fn unreachable_people(&self) -> Result<BTreeMap<String, Vec<String>>, DegreesError> {
        SqliteStore::unreachable_people(self)
    }
}

impl<'a, S> GraphStore for &'a S
where
    S: GraphStore + ?Sized,
{
    fn neighbors_of_person(&self, person: i64) -> Result<Vec<i64>, DegreesError> {
        (*self).neighbors_of_person(person)
    }

    fn neighbors_of_group(&self, group: i64) -> Result<Vec<i64>, DegreesError> {
        (*self).neighbors_of_group(group)
    }

    fn resolve_by_name(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<EntityRecord>, DegreesError> {
        (*self).resolve_by_name(kind, name)
    }

    fn root_person(&self) -> Result<Option<i64>, DegreesError> {
        (*self).root_person()
    }

    fn load_pyramid(&self) -> Result<Option<Pyramid>, DegreesError> {
        (*self).load_pyramid()
    }

    fn save_pyramid(&self, pyramid: &Pyramid) -> Result<(), DegreesError> {
        (*self).save_pyramid(pyramid)
    }

    fn upsert_results(&self, results: &[PersonResult]) -> Result<(), DegreesError> {
        (*self).upsert_results(results)
    }

    fn entity_names(
        &self,
        kind: EntityKind,
        ids: &[i64],
    ) -> Result<AHashMap<i64, String>, DegreesError> {
        (*self).entity_names(kind, ids)
    }

    fn unreachable_people(&self) -> Result<BTreeMap<String, Vec<String>>, DegreesError> {
        (*self).unreachable_people()
    }
}
