//! Loads group documents into the store.
//!
//! Each document describes one group and its members:
//!
//! ```json
//! { "group": { "name": "Footloose" }, "members": [ { "name": "Kevin Bacon" } ] }
//! ```
//!
//! A whole ingestion run is one transaction. Groups whose exact name is
//! already stored are skipped; people are matched by exact, case-sensitive
//! name. New memberships invalidate every cached result and the persisted
//! search state. [`replace_documents`] empties the store first, in the same
//! transaction.

use std::{fs, io::Read, path::Path};

use ahash::AHashMap;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    DegreesError,
    graph::{EntityKind, SqliteStore},
    schema::clear_tables,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDocument {
    pub group: NamedEntry,
    pub members: Vec<NamedEntry>,
}

impl GroupDocument {
    pub fn new(group: &str, members: &[&str]) -> Self {
        Self {
            group: NamedEntry {
                name: group.to_string(),
            },
            members: members
                .iter()
                .map(|name| NamedEntry {
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    fn validate(&self, origin: &str) -> Result<(), DegreesError> {
        if self.group.name.trim().is_empty() {
            return Err(DegreesError::malformed(format!("{origin}: group name is empty")));
        }
        if let Some(position) = self.members.iter().position(|m| m.name.trim().is_empty()) {
            return Err(DegreesError::malformed(format!(
                "{origin}: member {position} has an empty name"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub documents: usize,
    pub groups_added: usize,
    pub groups_skipped: usize,
    pub people_added: usize,
    pub memberships_added: usize,
    pub root: Option<i64>,
}

pub fn parse_document(raw: &str, origin: &str) -> Result<GroupDocument, DegreesError> {
    let document: GroupDocument = serde_json::from_str(raw)
        .map_err(|e| DegreesError::malformed(format!("{origin}: {e}")))?;
    document.validate(origin)?;
    Ok(document)
}

/// Ingests the single document read from `reader`.
pub fn ingest_reader<R: Read>(
    store: &SqliteStore,
    mut reader: R,
    origin: &str,
    root_name: &str,
) -> Result<IngestStats, DegreesError> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    let document = parse_document(&raw, origin)?;
    ingest_documents(store, std::slice::from_ref(&document), root_name)
}

/// Reads one `.json` document, or every `.json` file of a directory in file
/// name order.
pub fn read_documents<P: AsRef<Path>>(path: P) -> Result<Vec<GroupDocument>, DegreesError> {
    let path = path.as_ref();
    let files = if path.is_dir() {
        let mut files = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry_path = entry?.path();
            if entry_path.is_file() && is_json(&entry_path) {
                files.push(entry_path);
            }
        }
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };
    files.iter().map(|file| read_file(file)).collect()
}

pub fn ingest_path<P: AsRef<Path>>(
    store: &SqliteStore,
    path: P,
    root_name: &str,
) -> Result<IngestStats, DegreesError> {
    let documents = read_documents(path)?;
    ingest_documents(store, &documents, root_name)
}

pub fn ingest_documents(
    store: &SqliteStore,
    documents: &[GroupDocument],
    root_name: &str,
) -> Result<IngestStats, DegreesError> {
    load(store, documents, root_name, false)
}

/// Empties the store and loads `documents` in its place. The previous
/// contents survive when any document is malformed.
pub fn replace_documents(
    store: &SqliteStore,
    documents: &[GroupDocument],
    root_name: &str,
) -> Result<IngestStats, DegreesError> {
    load(store, documents, root_name, true)
}

fn load(
    store: &SqliteStore,
    documents: &[GroupDocument],
    root_name: &str,
    replace: bool,
) -> Result<IngestStats, DegreesError> {
    let mut stats = store.in_transaction(|conn| {
        if replace {
            clear_tables(conn)?;
            debug!("cleared store before loading");
        }
        let mut stats = IngestStats::default();
        let mut people: AHashMap<String, i64> = AHashMap::new();
        for (index, document) in documents.iter().enumerate() {
            document.validate(&format!("document {index}"))?;
            stats.documents += 1;
            if existing_id(conn, EntityKind::Group, &document.group.name)?.is_some() {
                debug!(group = %document.group.name, "skipping known group");
                stats.groups_skipped += 1;
                continue;
            }
            let group = insert_named(conn, EntityKind::Group, &document.group.name)?;
            stats.groups_added += 1;
            for member in &document.members {
                let person = match people.get(&member.name) {
                    Some(id) => *id,
                    None => {
                        let id = match existing_id(conn, EntityKind::Person, &member.name)? {
                            Some(id) => id,
                            None => {
                                stats.people_added += 1;
                                insert_named(conn, EntityKind::Person, &member.name)?
                            }
                        };
                        people.insert(member.name.clone(), id);
                        id
                    }
                };
                stats.memberships_added += conn
                    .execute(
                        "INSERT OR IGNORE INTO memberships(group_id, person_id) VALUES(?1, ?2)",
                        params![group, person],
                    )
                    .map_err(|e| DegreesError::query(e.to_string()))?;
            }
        }
        if !replace && (stats.memberships_added > 0 || stats.groups_added > 0) {
            store.clear_search_state()?;
        }
        Ok(stats)
    })?;
    store.invalidate_caches();
    stats.root = bind_root(store, root_name)?;
    info!(
        documents = stats.documents,
        groups_added = stats.groups_added,
        groups_skipped = stats.groups_skipped,
        people_added = stats.people_added,
        memberships_added = stats.memberships_added,
        replace,
        "ingestion finished"
    );
    Ok(stats)
}

/// Points the search at the person called `root_name`, if present.
pub fn bind_root(store: &SqliteStore, root_name: &str) -> Result<Option<i64>, DegreesError> {
    match store.find_by_name(EntityKind::Person, root_name)? {
        Some(record) => {
            store.set_root(record.id)?;
            Ok(Some(record.id))
        }
        None => {
            warn!(root = root_name, "root person not present in the store");
            Ok(None)
        }
    }
}

fn read_file(path: &Path) -> Result<GroupDocument, DegreesError> {
    let raw = fs::read_to_string(path)?;
    parse_document(&raw, &path.display().to_string())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn existing_id(
    conn: &Connection,
    kind: EntityKind,
    name: &str,
) -> Result<Option<i64>, DegreesError> {
    let sql = format!("SELECT id FROM {} WHERE name = ?1 ORDER BY id LIMIT 1", kind.table());
    let mut stmt = conn
        .prepare_cached(&sql)
        .map_err(|e| DegreesError::query(e.to_string()))?;
    stmt.query_row(params![name], |row| row.get(0))
        .optional()
        .map_err(|e| DegreesError::query(e.to_string()))
}

fn insert_named(conn: &Connection, kind: EntityKind, name: &str) -> Result<i64, DegreesError> {
    let sql = format!("INSERT INTO {}(name) VALUES(?1)", kind.table());
    conn.prepare_cached(&sql)
        .and_then(|mut stmt| stmt.execute(params![name]))
        .map_err(|e| DegreesError::query(e.to_string()))?;
    Ok(conn.last_insert_rowid())
}
