//! The persisted, resumable state of the layered search.
//!
//! A [`Pyramid`] is a stack of [`Tier`]s that alternate between people and
//! groups, starting with a person tier holding only the root. Each tier is an
//! append-only list of [`Node`]s plus a cursor marking the next node still to
//! be expanded. Because every entity id is admitted to at most one tier (the
//! visited sets dedup globally), the tier index of a person is its distance
//! from the root in edges.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::errors::DegreesError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    People,
    Groups,
}

impl TierKind {
    pub fn for_index(index: usize) -> TierKind {
        if index % 2 == 0 {
            TierKind::People
        } else {
            TierKind::Groups
        }
    }
}

/// One discovered entity. `parent` indexes the node in the previous tier that
/// discovered it and is `None` only for the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i64, Option<usize>)", into = "(i64, Option<usize>)")]
pub struct Node {
    pub entity_id: i64,
    pub parent: Option<usize>,
}

impl Node {
    pub fn root(entity_id: i64) -> Self {
        Self {
            entity_id,
            parent: None,
        }
    }

    pub fn child(entity_id: i64, parent: usize) -> Self {
        Self {
            entity_id,
            parent: Some(parent),
        }
    }
}

impl From<(i64, Option<usize>)> for Node {
    fn from((entity_id, parent): (i64, Option<usize>)) -> Self {
        Self { entity_id, parent }
    }
}

impl From<Node> for (i64, Option<usize>) {
    fn from(node: Node) -> Self {
        (node.entity_id, node.parent)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub kind: TierKind,
    pub nodes: Vec<Node>,
    pub cursor: usize,
}

impl Tier {
    pub fn new(kind: TierKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when every node currently in the tier has been expanded. The tier
    /// may still grow afterwards if its upstream tier is not complete.
    pub fn is_drained(&self) -> bool {
        self.cursor >= self.nodes.len()
    }

    /// The node under the cursor together with its index.
    pub fn current(&self) -> Option<(usize, Node)> {
        self.nodes.get(self.cursor).map(|node| (self.cursor, *node))
    }

    pub fn advance(&mut self) {
        if self.cursor < self.nodes.len() {
            self.cursor += 1;
        }
    }

    pub fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pyramid {
    pub root: i64,
    pub tiers: Vec<Tier>,
    pub visited_people: AHashSet<i64>,
    pub visited_groups: AHashSet<i64>,
    pub last_completed: Option<usize>,
}

impl Pyramid {
    /// A pyramid whose only tier holds the root.
    pub fn new(root: i64) -> Self {
        let mut tip = Tier::new(TierKind::People);
        tip.push(Node::root(root));
        let mut visited_people = AHashSet::new();
        visited_people.insert(root);
        Self {
            root,
            tiers: vec![tip],
            visited_people,
            visited_groups: AHashSet::new(),
            last_completed: None,
        }
    }

    /// Index of the first tier that may still need work.
    pub fn resume_index(&self) -> usize {
        self.last_completed.map(|index| index + 1).unwrap_or(0)
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    pub fn node_count(&self) -> usize {
        self.tiers.iter().map(Tier::len).sum()
    }

    pub fn people_discovered(&self) -> usize {
        self.visited_people.len()
    }

    pub fn groups_discovered(&self) -> usize {
        self.visited_groups.len()
    }

    /// True once no tier has anything left to expand.
    pub fn is_exhausted(&self) -> bool {
        self.tiers
            .iter()
            .skip(self.resume_index())
            .all(Tier::is_drained)
    }

    /// Returns the tier at `index`, appending empty tiers up to it.
    pub fn tier_mut(&mut self, index: usize) -> &mut Tier {
        while self.tiers.len() <= index {
            let kind = TierKind::for_index(self.tiers.len());
            self.tiers.push(Tier::new(kind));
        }
        &mut self.tiers[index]
    }

    /// Admits `entity_id` into the tier after `tier_index` unless it was seen
    /// before. Returns the index of the new node.
    pub fn admit(&mut self, tier_index: usize, entity_id: i64, parent: usize) -> Option<usize> {
        let next = tier_index + 1;
        let fresh = match TierKind::for_index(next) {
            TierKind::People => self.visited_people.insert(entity_id),
            TierKind::Groups => self.visited_groups.insert(entity_id),
        };
        if !fresh {
            return None;
        }
        Some(self.tier_mut(next).push(Node::child(entity_id, parent)))
    }

    /// Finds the tier and node index holding person `person_id`, if visited.
    pub fn locate_person(&self, person_id: i64) -> Option<(usize, usize)> {
        if !self.visited_people.contains(&person_id) {
            return None;
        }
        self.tiers
            .iter()
            .enumerate()
            .filter(|(_, tier)| tier.kind == TierKind::People)
            .find_map(|(tier_index, tier)| {
                tier.nodes
                    .iter()
                    .position(|node| node.entity_id == person_id)
                    .map(|node_index| (tier_index, node_index))
            })
    }

    /// Checks the structural invariants of a pyramid read back from storage.
    pub fn validate(&self) -> Result<(), DegreesError> {
        let tip = self
            .tiers
            .first()
            .ok_or_else(|| DegreesError::corrupt("pyramid has no tiers"))?;
        if tip.nodes != [Node::root(self.root)] {
            return Err(DegreesError::corrupt(
                "tier 0 must hold exactly the root without a parent",
            ));
        }
        let mut people = 0usize;
        let mut groups = 0usize;
        for (index, tier) in self.tiers.iter().enumerate() {
            if tier.kind != TierKind::for_index(index) {
                return Err(DegreesError::corrupt(format!(
                    "tier {index} has kind {:?}",
                    tier.kind
                )));
            }
            if tier.cursor > tier.len() {
                return Err(DegreesError::corrupt(format!(
                    "tier {index} cursor {} exceeds length {}",
                    tier.cursor,
                    tier.len()
                )));
            }
            let visited = match tier.kind {
                TierKind::People => {
                    people += tier.len();
                    &self.visited_people
                }
                TierKind::Groups => {
                    groups += tier.len();
                    &self.visited_groups
                }
            };
            for node in &tier.nodes {
                if !visited.contains(&node.entity_id) {
                    return Err(DegreesError::corrupt(format!(
                        "entity {} in tier {index} is not marked visited",
                        node.entity_id
                    )));
                }
                if index == 0 {
                    continue;
                }
                match node.parent {
                    Some(parent) if parent < self.tiers[index - 1].len() => {}
                    _ => {
                        return Err(DegreesError::corrupt(format!(
                            "entity {} in tier {index} has a dangling parent",
                            node.entity_id
                        )));
                    }
                }
            }
        }
        if people != self.visited_people.len() || groups != self.visited_groups.len() {
            return Err(DegreesError::corrupt(
                "visited sets do not match tier contents",
            ));
        }
        if let Some(completed) = self.last_completed {
            if completed >= self.tiers.len() || TierKind::for_index(completed) != TierKind::People
            {
                return Err(DegreesError::corrupt(format!(
                    "last completed tier {completed} is not a person tier"
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, DegreesError> {
        serde_json::to_string(self).map_err(|e| DegreesError::invalid_input(e.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, DegreesError> {
        let pyramid: Pyramid =
            serde_json::from_str(raw).map_err(|e| DegreesError::corrupt(e.to_string()))?;
        pyramid.validate()?;
        Ok(pyramid)
    }
}
