//! Name-level queries on top of the engine.
//!
//! [`SeparationClient`] resolves a person by name, answers from the cached
//! result when one exists and otherwise drives a [`PyramidEngine`] search.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::{
    DegreesError,
    config::DegreesConfig,
    engine::{FindOutcome, PyramidEngine, SearchSummary},
    graph::{EntityKind, PersonResult},
    interrupt::Interrupt,
    store::GraphStore,
};

/// A resolved shortest path from the root to one person.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Separation {
    pub person_id: i64,
    pub name: String,
    /// Alternating group and person ids, root and target excluded.
    pub path: Vec<i64>,
    pub degrees: u32,
    pub from_cache: bool,
}

impl Separation {
    fn from_result(name: String, result: PersonResult, from_cache: bool) -> Self {
        Self {
            person_id: result.person_id,
            name,
            path: result.path,
            degrees: result.degrees,
            from_cache,
        }
    }

    pub fn group_ids(&self) -> Vec<i64> {
        self.path.iter().step_by(2).copied().collect()
    }

    pub fn person_ids(&self) -> Vec<i64> {
        self.path.iter().skip(1).step_by(2).copied().collect()
    }

    /// One sentence per group on the path, e.g. `"R was in F1 with A."`.
    pub fn describe(&self, names: &PathNames) -> Vec<String> {
        let mut previous = names.root.clone();
        let mut lines = Vec::with_capacity(self.path.len().div_ceil(2));
        for pair in self.path.chunks(2) {
            let group = names.group(pair[0]);
            let next = match pair.get(1) {
                Some(person) => names.person(*person),
                None => self.name.clone(),
            };
            lines.push(format!("{previous} was in {group} with {next}."));
            previous = next;
        }
        lines
    }
}

/// Display names for the ids a [`Separation`] refers to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathNames {
    pub root: String,
    pub people: AHashMap<i64, String>,
    pub groups: AHashMap<i64, String>,
}

impl PathNames {
    fn person(&self, id: i64) -> String {
        self.people
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("person #{id}"))
    }

    fn group(&self, id: i64) -> String {
        self.groups
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("group #{id}"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryOutcome {
    AlreadyRoot,
    Found(Separation),
    NotFound,
    NotConnected,
}

impl QueryOutcome {
    pub fn headline(&self, query: &str) -> String {
        match self {
            QueryOutcome::AlreadyRoot => format!("{query} is the root person."),
            QueryOutcome::Found(separation) => {
                let unit = if separation.degrees == 1 {
                    "degree"
                } else {
                    "degrees"
                };
                format!(
                    "{} is {} {unit} of separation away.",
                    separation.name, separation.degrees
                )
            }
            QueryOutcome::NotFound => format!("No person named {query}."),
            QueryOutcome::NotConnected => format!("{query} is not connected to the root."),
        }
    }
}

pub struct SeparationClient<S> {
    store: S,
    config: DegreesConfig,
    interrupt: Interrupt,
}

impl<S> SeparationClient<S> {
    pub fn new(store: S, config: DegreesConfig) -> Self {
        Self {
            store,
            config,
            interrupt: Interrupt::new(),
        }
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &DegreesConfig {
        &self.config
    }
}

impl<S> SeparationClient<S>
where
    S: GraphStore,
{
    /// Degrees of separation between the root and the person called `name`.
    pub fn find(&self, name: &str, caching: bool) -> Result<QueryOutcome, DegreesError> {
        let Some(record) = self.store.resolve_by_name(EntityKind::Person, name)? else {
            return Ok(QueryOutcome::NotFound);
        };
        let root = self.store.root_person()?.ok_or(DegreesError::RootNotSet)?;
        if record.id == root {
            return Ok(QueryOutcome::AlreadyRoot);
        }
        if let Some(cached) = record.cached {
            return Ok(QueryOutcome::Found(Separation {
                person_id: record.id,
                name: record.name,
                path: cached.path,
                degrees: cached.degrees,
                from_cache: true,
            }));
        }
        match self.engine().find(record.id, caching)? {
            FindOutcome::Found(result) => Ok(QueryOutcome::Found(Separation::from_result(
                record.name,
                result,
                false,
            ))),
            FindOutcome::NotConnected => Ok(QueryOutcome::NotConnected),
            FindOutcome::AlreadyRoot => Ok(QueryOutcome::AlreadyRoot),
        }
    }

    pub fn find_all(&self, caching: bool) -> Result<SearchSummary, DegreesError> {
        self.engine().find_all(caching)
    }

    /// People with no cached degree under every group they belong to. Only
    /// meaningful after a cached `find_all`.
    pub fn list_unreachable(&self) -> Result<BTreeMap<String, Vec<String>>, DegreesError> {
        self.store.unreachable_people()
    }

    pub fn path_names(&self, separation: &Separation) -> Result<PathNames, DegreesError> {
        let root = self.store.root_person()?.ok_or(DegreesError::RootNotSet)?;
        let mut people_ids = separation.person_ids();
        people_ids.push(root);
        let mut people = self.store.entity_names(EntityKind::Person, &people_ids)?;
        let groups = self
            .store
            .entity_names(EntityKind::Group, &separation.group_ids())?;
        let root = people
            .remove(&root)
            .unwrap_or_else(|| self.config.root_name.clone());
        Ok(PathNames {
            root,
            people,
            groups,
        })
    }

    pub fn describe(&self, separation: &Separation) -> Result<Vec<String>, DegreesError> {
        Ok(separation.describe(&self.path_names(separation)?))
    }

    fn engine(&self) -> PyramidEngine<&S> {
        PyramidEngine::new(&self.store, self.config.search.clone())
            .with_interrupt(self.interrupt.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> PathNames {
        let mut names = PathNames {
            root: "Root".to_string(),
            ..PathNames::default()
        };
        names.groups.insert(10, "First".to_string());
        names.groups.insert(11, "Second".to_string());
        names.people.insert(2, "Middle".to_string());
        names
    }

    #[test]
    fn describe_walks_each_group_on_the_path() {
        let separation = Separation {
            person_id: 3,
            name: "Target".to_string(),
            path: vec![10, 2, 11],
            degrees: 2,
            from_cache: false,
        };
        assert_eq!(
            separation.describe(&names()),
            vec![
                "Root was in First with Middle.".to_string(),
                "Middle was in Second with Target.".to_string(),
            ]
        );
    }

    #[test]
    fn describe_falls_back_to_ids_for_unknown_names() {
        let separation = Separation {
            person_id: 3,
            name: "Target".to_string(),
            path: vec![99],
            degrees: 1,
            from_cache: true,
        };
        assert_eq!(
            separation.describe(&names()),
            vec!["Root was in group #99 with Target.".to_string()]
        );
    }

    #[test]
    fn headline_pluralizes_degrees() {
        let mut separation = Separation {
            person_id: 3,
            name: "Target".to_string(),
            path: vec![10],
            degrees: 1,
            from_cache: false,
        };
        assert_eq!(
            QueryOutcome::Found(separation.clone()).headline("target"),
            "Target is 1 degree of separation away."
        );
        separation.degrees = 3;
        assert_eq!(
            QueryOutcome::Found(separation).headline("target"),
            "Target is 3 degrees of separation away."
        );
        assert_eq!(QueryOutcome::NotFound.headline("Nobody"), "No person named Nobody.");
    }
}
