//! SQLite-backed storage for people, groups, their memberships and the
//! persisted search state.

mod sqlite_store;
mod types;

pub use sqlite_store::{SqliteStore, StoreCounts};
pub use types::{CachedResult, EntityKind, EntityRecord, PersonResult, validate_name};
