use std::{collections::BTreeMap, path::Path};

use ahash::AHashMap;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use tracing::{debug, warn};

use crate::{
    cache::{CacheStats, NeighborCache},
    config::StoreConfig,
    errors::DegreesError,
    pyramid::Pyramid,
    schema::{SEARCH_STATE_ROW, ensure_schema},
};

use super::types::{
    EntityKind, EntityRecord, PersonResult, encode_path, row_to_group, row_to_person,
    validate_name,
};

/// Bound parameters per `IN (...)` lookup, below SQLite's variable limit.
const NAME_LOOKUP_CHUNK: usize = 500;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub people: i64,
    pub groups: i64,
    pub memberships: i64,
    pub cached_results: i64,
}

pub struct SqliteStore {
    conn: Connection,
    groups_of_person: NeighborCache,
    members_of_group: NeighborCache,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DegreesError> {
        Self::open_with(path, &StoreConfig::default())
    }

    pub fn open_in_memory() -> Result<Self, DegreesError> {
        Self::open_in_memory_with(&StoreConfig::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, cfg: &StoreConfig) -> Result<Self, DegreesError> {
        let conn = Connection::open(path).map_err(|e| DegreesError::connection(e.to_string()))?;
        Self::from_connection(conn, cfg)
    }

    pub fn open_in_memory_with(cfg: &StoreConfig) -> Result<Self, DegreesError> {
        let conn =
            Connection::open_in_memory().map_err(|e| DegreesError::connection(e.to_string()))?;
        Self::from_connection(conn, cfg)
    }

    pub fn insert_person(&self, name: &str) -> Result<i64, DegreesError> {
        validate_name(EntityKind::Person, name)?;
        self.conn
            .execute("INSERT INTO people(name) VALUES(?1)", params![name])
            .map_err(|e| DegreesError::query(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_group(&self, name: &str) -> Result<i64, DegreesError> {
        validate_name(EntityKind::Group, name)?;
        self.conn
            .execute("INSERT INTO groups(name) VALUES(?1)", params![name])
            .map_err(|e| DegreesError::query(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Links `person` to `group`. Returns false when the pair already exists.
    pub fn insert_membership(&self, group: i64, person: i64) -> Result<bool, DegreesError> {
        if !self.entity_exists(EntityKind::Group, group)?
            || !self.entity_exists(EntityKind::Person, person)?
        {
            return Err(DegreesError::invalid_input(
                "membership endpoints must reference existing entities",
            ));
        }
        let affected = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO memberships(group_id, person_id) VALUES(?1, ?2)",
                params![group, person],
            )
            .map_err(|e| DegreesError::query(e.to_string()))?;
        self.invalidate_caches();
        Ok(affected > 0)
    }

    /// Case-sensitive exact lookup used while ingesting.
    pub fn id_by_exact_name(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<i64>, DegreesError> {
        let sql = format!(
            "SELECT id FROM {} WHERE name = ?1 ORDER BY id LIMIT 1",
            kind.table()
        );
        self.conn
            .prepare_cached(&sql)
            .and_then(|mut stmt| stmt.query_row(params![name], |row| row.get(0)).optional())
            .map_err(|e| DegreesError::query(e.to_string()))
    }

    pub fn get_entity(&self, kind: EntityKind, id: i64) -> Result<EntityRecord, DegreesError> {
        let result = match kind {
            EntityKind::Person => self.conn.query_row(
                "SELECT id, name, path, degrees FROM people WHERE id=?1",
                params![id],
                row_to_person,
            ),
            EntityKind::Group => self.conn.query_row(
                "SELECT id, name FROM groups WHERE id=?1",
                params![id],
                row_to_group,
            ),
        };
        result.map_err(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => {
                DegreesError::not_found(format!("{kind} {id}"))
            }
            other => DegreesError::query(other.to_string()),
        })
    }

    /// Binds the root person. Rebinding to a different person drops the search
    /// state and every cached result, which were measured from the old root.
    pub fn set_root(&self, person: i64) -> Result<(), DegreesError> {
        if !self.entity_exists(EntityKind::Person, person)? {
            return Err(DegreesError::not_found(format!("person {person}")));
        }
        if self.root_id()? == Some(person) {
            return Ok(());
        }
        self.in_transaction(|conn| {
            conn.execute(
                "UPDATE people SET path = NULL, degrees = NULL
                 WHERE path IS NOT NULL OR degrees IS NOT NULL",
                [],
            )
            .map_err(|e| DegreesError::query(e.to_string()))?;
            conn.execute(
                "INSERT INTO search_state(id, root_id, pyramid) VALUES(?1, ?2, NULL)
                 ON CONFLICT(id) DO UPDATE SET root_id = excluded.root_id, pyramid = NULL",
                params![SEARCH_STATE_ROW, person],
            )
            .map_err(|e| DegreesError::query(e.to_string()))?;
            Ok(())
        })?;
        debug!(root = person, "bound root person");
        Ok(())
    }

    pub fn root_name(&self) -> Result<Option<String>, DegreesError> {
        match self.root_id()? {
            Some(id) => Ok(Some(self.get_entity(EntityKind::Person, id)?.name)),
            None => Ok(None),
        }
    }

    /// Forgets the persisted pyramid and every cached person result.
    pub fn clear_search_state(&self) -> Result<(), DegreesError> {
        self.conn
            .execute_batch(
                "UPDATE search_state SET pyramid = NULL;
                 UPDATE people SET path = NULL, degrees = NULL
                     WHERE path IS NOT NULL OR degrees IS NOT NULL;",
            )
            .map_err(|e| DegreesError::query(e.to_string()))?;
        debug!("cleared cached results and search state");
        Ok(())
    }

    /// People without a cached degree, listed under every group they belong to.
    pub fn unreachable_people(&self) -> Result<BTreeMap<String, Vec<String>>, DegreesError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT g.name, p.name FROM memberships m
                 JOIN groups g ON g.id = m.group_id
                 JOIN people p ON p.id = m.person_id
                 WHERE p.degrees IS NULL
                   AND p.id IS NOT (SELECT root_id FROM search_state WHERE id = 1)
                 ORDER BY g.name, g.id, p.name, p.id",
            )
            .map_err(|e| DegreesError::query(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| DegreesError::query(e.to_string()))?;
        let mut unreachable: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in rows {
            let (group, person) = row.map_err(|e| DegreesError::query(e.to_string()))?;
            unreachable.entry(group).or_default().push(person);
        }
        Ok(unreachable)
    }

    pub fn counts(&self) -> Result<StoreCounts, DegreesError> {
        Ok(StoreCounts {
            people: self.query_single("SELECT COUNT(*) FROM people")?,
            groups: self.query_single("SELECT COUNT(*) FROM groups")?,
            memberships: self.query_single("SELECT COUNT(*) FROM memberships")?,
            cached_results: self
                .query_single("SELECT COUNT(*) FROM people WHERE degrees IS NOT NULL")?,
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.groups_of_person
            .stats()
            .combine(self.members_of_group.stats())
    }
}

impl SqliteStore {
    /// Runs `work` inside `BEGIN IMMEDIATE`, committing on success and rolling
    /// back on any error.
    pub(crate) fn in_transaction<T>(
        &self,
        work: impl FnOnce(&Connection) -> Result<T, DegreesError>,
    ) -> Result<T, DegreesError> {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| DegreesError::query(e.to_string()))?;
        match work(&self.conn) {
            Ok(value) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|e| DegreesError::query(e.to_string()))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }

    pub(crate) fn fetch_groups_of(&self, person: i64) -> Result<Vec<i64>, DegreesError> {
        if let Some(cached) = self.groups_of_person.get(person) {
            return Ok(cached);
        }
        let result = self.collect_adjacency(
            "SELECT DISTINCT group_id FROM memberships WHERE person_id=?1 ORDER BY group_id",
            person,
        )?;
        self.groups_of_person.insert(person, result.clone());
        Ok(result)
    }

    pub(crate) fn fetch_members_of(&self, group: i64) -> Result<Vec<i64>, DegreesError> {
        if let Some(cached) = self.members_of_group.get(group) {
            return Ok(cached);
        }
        let result = self.collect_adjacency(
            "SELECT DISTINCT person_id FROM memberships WHERE group_id=?1 ORDER BY person_id",
            group,
        )?;
        self.members_of_group.insert(group, result.clone());
        Ok(result)
    }

    pub(crate) fn find_by_name(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<EntityRecord>, DegreesError> {
        let result = match kind {
            EntityKind::Person => self
                .conn
                .prepare_cached(
                    "SELECT id, name, path, degrees FROM people
                     WHERE name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1",
                )
                .and_then(|mut stmt| stmt.query_row(params![name], row_to_person).optional()),
            EntityKind::Group => self
                .conn
                .prepare_cached(
                    "SELECT id, name FROM groups
                     WHERE name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1",
                )
                .and_then(|mut stmt| stmt.query_row(params![name], row_to_group).optional()),
        };
        result.map_err(|e| DegreesError::query(e.to_string()))
    }

    pub(crate) fn root_id(&self) -> Result<Option<i64>, DegreesError> {
        let root: Option<Option<i64>> = self
            .conn
            .query_row(
                "SELECT root_id FROM search_state WHERE id=?1",
                params![SEARCH_STATE_ROW],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DegreesError::query(e.to_string()))?;
        Ok(root.flatten())
    }

    pub(crate) fn read_pyramid(&self) -> Result<Option<Pyramid>, DegreesError> {
        let raw: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT pyramid FROM search_state WHERE id=?1",
                params![SEARCH_STATE_ROW],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DegreesError::query(e.to_string()))?;
        match raw.flatten() {
            Some(raw) => Pyramid::from_json(&raw).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn write_pyramid(&self, pyramid: &Pyramid) -> Result<(), DegreesError> {
        let raw = pyramid.to_json()?;
        self.conn
            .execute(
                "INSERT INTO search_state(id, root_id, pyramid) VALUES(?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET pyramid = excluded.pyramid",
                params![SEARCH_STATE_ROW, pyramid.root, raw],
            )
            .map_err(|e| DegreesError::query(e.to_string()))?;
        debug!(
            tiers = pyramid.tier_count(),
            nodes = pyramid.node_count(),
            bytes = raw.len(),
            "saved search state"
        );
        Ok(())
    }

    pub(crate) fn write_results(&self, results: &[PersonResult]) -> Result<(), DegreesError> {
        if results.is_empty() {
            return Ok(());
        }
        self.in_transaction(|conn| {
            let mut stmt = conn
                .prepare_cached("UPDATE people SET path=?1, degrees=?2 WHERE id=?3")
                .map_err(|e| DegreesError::query(e.to_string()))?;
            for result in results {
                let path = encode_path(&result.path)?;
                stmt.execute(params![path, result.degrees, result.person_id])
                    .map_err(|e| DegreesError::query(e.to_string()))?;
            }
            Ok(())
        })?;
        debug!(count = results.len(), "cached person results");
        Ok(())
    }

    pub(crate) fn names_for(
        &self,
        kind: EntityKind,
        ids: &[i64],
    ) -> Result<AHashMap<i64, String>, DegreesError> {
        let mut names = AHashMap::with_capacity(ids.len());
        for chunk in ids.chunks(NAME_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT id, name FROM {} WHERE id IN ({placeholders})",
                kind.table()
            );
            let mut stmt = self
                .conn
                .prepare(&sql)
                .map_err(|e| DegreesError::query(e.to_string()))?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|e| DegreesError::query(e.to_string()))?;
            for row in rows {
                let (id, name) = row.map_err(|e| DegreesError::query(e.to_string()))?;
                names.insert(id, name);
            }
        }
        Ok(names)
    }

    pub(crate) fn invalidate_caches(&self) {
        self.groups_of_person.clear();
        self.members_of_group.clear();
    }

    fn collect_adjacency(&self, sql: &str, id: i64) -> Result<Vec<i64>, DegreesError> {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|e| DegreesError::query(e.to_string()))?;
        let rows = stmt
            .query_map(params![id], |row| row.get(0))
            .map_err(|e| DegreesError::query(e.to_string()))?;
        let mut result = Vec::new();
        for item in rows {
            result.push(item.map_err(|e| DegreesError::query(e.to_string()))?);
        }
        Ok(result)
    }

    fn entity_exists(&self, kind: EntityKind, id: i64) -> Result<bool, DegreesError> {
        let sql = format!("SELECT 1 FROM {} WHERE id=?1", kind.table());
        let exists: Option<i64> = self
            .conn
            .query_row(&sql, params![id], |row| row.get(0))
            .optional()
            .map_err(|e| DegreesError::query(e.to_string()))?;
        Ok(exists.is_some())
    }

    fn query_single(&self, sql: &str) -> Result<i64, DegreesError> {
        self.conn
            .query_row(sql, [], |row| row.get(0))
            .optional()
            .map(|opt| opt.unwrap_or(0))
            .map_err(|e| DegreesError::query(e.to_string()))
    }

    fn from_connection(conn: Connection, cfg: &StoreConfig) -> Result<Self, DegreesError> {
        ensure_schema(&conn)?;
        for (name, value) in &cfg.pragma_settings {
            conn.execute_batch(&format!("PRAGMA {name} = {value}"))
                .map_err(|e| DegreesError::connection(e.to_string()))?;
        }
        conn.set_prepared_statement_cache_capacity(cfg.statement_cache_capacity);
        let cache = || match cfg.adjacency_cache_capacity {
            Some(capacity) => NeighborCache::with_capacity(capacity),
            None => NeighborCache::new(),
        };
        Ok(Self {
            conn,
            groups_of_person: cache(),
            members_of_group: cache(),
        })
    }
}
