use rusqlite::Connection;

use crate::errors::DegreesError;

/// Row id of the singleton search-state record.
pub const SEARCH_STATE_ROW: i64 = 1;

pub fn ensure_schema(conn: &Connection) -> Result<(), DegreesError> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS people (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            name    TEXT NOT NULL,
            path    TEXT,
            degrees INTEGER
        );
        CREATE TABLE IF NOT EXISTS groups (
            id   INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS memberships (
            group_id  INTEGER NOT NULL REFERENCES groups(id),
            person_id INTEGER NOT NULL REFERENCES people(id),
            UNIQUE(group_id, person_id)
        );
        CREATE TABLE IF NOT EXISTS search_state (
            id      INTEGER PRIMARY KEY CHECK (id = 1),
            root_id INTEGER,
            pyramid TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_people_name ON people(name);
        CREATE INDEX IF NOT EXISTS idx_people_name_nocase ON people(name COLLATE NOCASE);
        CREATE INDEX IF NOT EXISTS idx_groups_name ON groups(name);
        CREATE INDEX IF NOT EXISTS idx_groups_name_nocase ON groups(name COLLATE NOCASE);
        CREATE INDEX IF NOT EXISTS idx_memberships_person ON memberships(person_id);
        "#,
    )
    .map_err(|e| DegreesError::schema(e.to_string()))?;
    Ok(())
}

/// Deletes every person, group, membership and the search state.
pub fn clear_tables(conn: &Connection) -> Result<(), DegreesError> {
    conn.execute_batch(
        "DELETE FROM memberships;
         DELETE FROM search_state;
         DELETE FROM people;
         DELETE FROM groups;",
    )
    .map_err(|e| DegreesError::query(e.to_string()))?;
    Ok(())
}
