use crate::{errors::DegreesError, pyramid::Tier};

/// Walks parent pointers from `tiers[tier_index].nodes[node_index]` back to
/// the root and returns the ids in between, root side first.
///
/// Neither the starting node nor the root is included, so for a person found
/// in tier 4 via `R -> F1 -> A -> F2 -> B` the result is `[F1, A, F2]`.
pub fn reconstruct_path(
    tiers: &[Tier],
    tier_index: usize,
    node_index: usize,
) -> Result<Vec<i64>, DegreesError> {
    let mut node = tiers
        .get(tier_index)
        .and_then(|tier| tier.nodes.get(node_index))
        .copied()
        .ok_or_else(|| DegreesError::corrupt(format!("no node {node_index} in tier {tier_index}")))?;
    let mut path = Vec::with_capacity(tier_index.saturating_sub(1));
    let mut index = tier_index;
    while index > 0 {
        let parent_index = node.parent.ok_or_else(|| {
            DegreesError::corrupt(format!(
                "entity {} in tier {index} has no parent",
                node.entity_id
            ))
        })?;
        let parent = tiers[index - 1]
            .nodes
            .get(parent_index)
            .copied()
            .ok_or_else(|| {
                DegreesError::corrupt(format!(
                    "parent {parent_index} missing from tier {}",
                    index - 1
                ))
            })?;
        index -= 1;
        if index > 0 {
            path.push(parent.entity_id);
        }
        node = parent;
    }
    path.reverse();
    Ok(path)
}

/// Degrees of separation for a path produced by [`reconstruct_path`].
pub fn degrees_for(path: &[i64]) -> u32 {
    path.len().div_ceil(2) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pyramid::{Node, TierKind};

    fn tier(kind: TierKind, nodes: &[(i64, Option<usize>)]) -> Tier {
        Tier {
            kind,
            nodes: nodes.iter().map(|&pair| Node::from(pair)).collect(),
            cursor: 0,
        }
    }

    fn chain() -> Vec<Tier> {
        vec![
            tier(TierKind::People, &[(1, None)]),
            tier(TierKind::Groups, &[(10, Some(0)), (11, Some(0))]),
            tier(TierKind::People, &[(2, Some(0)), (3, Some(1))]),
            tier(TierKind::Groups, &[(12, Some(1))]),
            tier(TierKind::People, &[(4, Some(0))]),
        ]
    }

    #[test]
    fn root_has_empty_path() {
        let tiers = chain();
        assert_eq!(reconstruct_path(&tiers, 0, 0).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn group_tier_node_excludes_itself() {
        let tiers = chain();
        assert_eq!(reconstruct_path(&tiers, 3, 0).unwrap(), vec![11, 3]);
    }

    #[test]
    fn person_path_is_root_first() {
        let tiers = chain();
        let path = reconstruct_path(&tiers, 4, 0).unwrap();
        assert_eq!(path, vec![11, 3, 12]);
        assert_eq!(degrees_for(&path), 2);
    }

    #[test]
    fn dangling_parent_is_reported() {
        let mut tiers = chain();
        tiers[4].nodes[0].parent = Some(7);
        assert!(matches!(
            reconstruct_path(&tiers, 4, 0),
            Err(DegreesError::CorruptState(_))
        ));
    }

    #[test]
    fn degrees_round_up() {
        assert_eq!(degrees_for(&[]), 0);
        assert_eq!(degrees_for(&[10]), 1);
        assert_eq!(degrees_for(&[10, 2, 11]), 2);
    }
}
