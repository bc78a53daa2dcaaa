//! Resumable degrees-of-separation search over a people/group graph stored in
//! SQLite.
//! Run Criterion benchmarks with `cargo bench` to inspect reports under `target/criterion`.

pub mod bench_utils;
pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod ingest;
pub mod interrupt;
pub mod path;
pub mod pyramid;
pub mod results;
pub mod schema;
pub mod store;

pub use crate::client::{PathNames, QueryOutcome, Separation, SeparationClient};
pub use crate::config::{DegreesConfig, SearchOptions, StoreConfig};
pub use crate::engine::{FindOutcome, PyramidEngine, SearchSummary};
pub use crate::errors::DegreesError;
pub use crate::graph::{EntityKind, EntityRecord, PersonResult, SqliteStore, StoreCounts};
pub use crate::ingest::{GroupDocument, IngestStats};
pub use crate::interrupt::Interrupt;
pub use crate::pyramid::{Node, Pyramid, Tier, TierKind};
pub use crate::store::GraphStore;
