use std::collections::{BTreeMap, VecDeque};

use ahash::{AHashMap, AHashSet};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::index::sample};

use crate::ingest::GroupDocument;

#[derive(Clone, Debug)]
pub struct CastDataset {
    pub people: Vec<String>,
    pub documents: Vec<GroupDocument>,
}

impl CastDataset {
    /// Name of the first generated person, connected in every shape.
    pub fn root(&self) -> &str {
        &self.people[0]
    }

    pub fn groups(&self) -> usize {
        self.documents.len()
    }

    pub fn memberships(&self) -> usize {
        self.documents.iter().map(|doc| doc.members.len()).sum()
    }

    /// Degrees of separation from `root` computed by a plain person-to-person
    /// BFS. People that cannot be reached are absent.
    pub fn reference_degrees(&self, root: &str) -> BTreeMap<String, u32> {
        let mut adjacency: AHashMap<&str, AHashSet<&str>> = AHashMap::new();
        for doc in &self.documents {
            for a in &doc.members {
                for b in &doc.members {
                    if a.name != b.name {
                        adjacency.entry(&a.name).or_default().insert(&b.name);
                    }
                }
            }
        }
        let mut degrees = BTreeMap::new();
        let mut queue = VecDeque::new();
        degrees.insert(root.to_string(), 0u32);
        queue.push_back((root, 0u32));
        while let Some((person, distance)) = queue.pop_front() {
            let Some(neighbors) = adjacency.get(person) else {
                continue;
            };
            let mut sorted: Vec<&str> = neighbors.iter().copied().collect();
            sorted.sort_unstable();
            for next in sorted {
                if !degrees.contains_key(next) {
                    degrees.insert(next.to_string(), distance + 1);
                    queue.push_back((next, distance + 1));
                }
            }
        }
        degrees
    }
}

#[derive(Clone, Debug)]
pub enum CastShape {
    /// Group `i` holds people `i` and `i + 1`.
    Chain,
    /// Every group pairs person 0 with one other person.
    Star,
    /// `groups` groups of `cast_size` people drawn uniformly.
    Random { groups: usize, cast_size: usize },
    /// Disjoint random components; only the first contains person 0.
    Islands {
        islands: usize,
        groups_per_island: usize,
        cast_size: usize,
    },
}

pub fn generate_cast(shape: CastShape, people: usize, seed: u64) -> CastDataset {
    assert!(people > 1, "people must exceed 1");
    let names: Vec<String> = (0..people).map(|idx| format!("Person{idx}")).collect();
    let mut casts: Vec<Vec<usize>> = match shape {
        CastShape::Chain => (0..people - 1).map(|idx| vec![idx, idx + 1]).collect(),
        CastShape::Star => (1..people).map(|leaf| vec![0, leaf]).collect(),
        CastShape::Random { groups, cast_size } => {
            let mut rng = StdRng::seed_from_u64(seed);
            random_casts(&mut rng, 0..people, groups, cast_size)
        }
        CastShape::Islands {
            islands,
            groups_per_island,
            cast_size,
        } => {
            assert!(islands > 0, "islands must be positive");
            let mut rng = StdRng::seed_from_u64(seed);
            let span = people / islands;
            assert!(span >= cast_size, "islands too small for the cast size");
            let mut casts = Vec::new();
            for island in 0..islands {
                let start = island * span;
                let end = if island + 1 == islands {
                    people
                } else {
                    start + span
                };
                casts.extend(random_casts(&mut rng, start..end, groups_per_island, cast_size));
            }
            casts
        }
    };
    if let Some(first) = casts.first_mut().filter(|cast| !cast.contains(&0)) {
        first.insert(0, 0);
    }
    let documents = casts
        .into_iter()
        .enumerate()
        .map(|(idx, cast)| {
            let members: Vec<&str> = cast.iter().map(|person| names[*person].as_str()).collect();
            GroupDocument::new(&format!("Group{idx}"), &members)
        })
        .collect();
    CastDataset {
        people: names,
        documents,
    }
}

fn random_casts(
    rng: &mut StdRng,
    range: std::ops::Range<usize>,
    groups: usize,
    cast_size: usize,
) -> Vec<Vec<usize>> {
    let span = range.end - range.start;
    assert!(cast_size > 0 && cast_size <= span, "cast_size out of range");
    (0..groups)
        .map(|_| {
            let size = rng.gen_range(1..=cast_size);
            let mut cast: Vec<usize> = sample(&mut *rng, span, size)
                .into_iter()
                .map(|offset| range.start + offset)
                .collect();
            cast.sort_unstable();
            cast
        })
        .collect()
}
