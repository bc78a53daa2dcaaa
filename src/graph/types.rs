use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{errors::DegreesError, path::degrees_for};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Person,
    Group,
}

impl EntityKind {
    pub(crate) fn table(self) -> &'static str {
        match self {
            EntityKind::Person => "people",
            EntityKind::Group => "groups",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Person => write!(f, "person"),
            EntityKind::Group => write!(f, "group"),
        }
    }
}

/// A shortest path from the root to one person, as cached in the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonResult {
    pub person_id: i64,
    pub path: Vec<i64>,
    pub degrees: u32,
}

impl PersonResult {
    pub fn new(person_id: i64, path: Vec<i64>) -> Self {
        let degrees = degrees_for(&path);
        Self {
            person_id,
            path,
            degrees,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedResult {
    pub path: Vec<i64>,
    pub degrees: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRecord {
    pub id: i64,
    pub kind: EntityKind,
    pub name: String,
    pub cached: Option<CachedResult>,
}

pub fn validate_name(kind: EntityKind, name: &str) -> Result<(), DegreesError> {
    if name.trim().is_empty() {
        return Err(DegreesError::invalid_input(format!("{kind} name must be set")));
    }
    Ok(())
}

pub(crate) fn encode_path(path: &[i64]) -> Result<String, DegreesError> {
    serde_json::to_string(path).map_err(|e| DegreesError::invalid_input(e.to_string()))
}

pub(crate) fn row_to_person(row: &rusqlite::Row<'_>) -> Result<EntityRecord, rusqlite::Error> {
    let path: Option<String> = row.get(2)?;
    let degrees: Option<u32> = row.get(3)?;
    let cached = match (path, degrees) {
        (Some(raw), Some(degrees)) => {
            let path: Vec<i64> = serde_json::from_str(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Some(CachedResult { path, degrees })
        }
        _ => None,
    };
    Ok(EntityRecord {
        id: row.get(0)?,
        kind: EntityKind::Person,
        name: row.get(1)?,
        cached,
    })
}

pub(crate) fn row_to_group(row: &rusqlite::Row<'_>) -> Result<EntityRecord, rusqlite::Error> {
    Ok(EntityRecord {
        id: row.get(0)?,
        kind: EntityKind::Group,
        name: row.get(1)?,
        cached: None,
    })
}
