/// Parallel traversal helpers
///
/// Rayon-backed versions of frontier expansion and element filtering for
/// large inputs. Both produce exactly the same results as their sequential
/// counterparts.

use super::{collect_peers, Direction, ElementSet};
use crate::element::ElementStore;
use crate::types::{EdgeTypeId, ElementId};
use rayon::prelude::*;

/// Expand every node of `frontier` across `edge_type` in parallel
///
/// Each worker folds peers into a local set; the partial sets are merged at
/// the end.
pub fn parallel_expand(
    store: &ElementStore,
    frontier: &[ElementId],
    edge_type: EdgeTypeId,
    direction: Direction,
) -> ElementSet {
    frontier
        .par_iter()
        .fold(ElementSet::new, |mut acc, &node| {
            collect_peers(store, node, edge_type, direction, &mut acc);
            acc
        })
        .reduce(ElementSet::new, |mut a, b| {
            a.extend(b);
            a
        })
}

/// Filter element ids in parallel using a predicate
///
/// # Returns
/// * The matching ids, in input order
pub fn parallel_filter<F>(elements: &[ElementId], predicate: F) -> Vec<ElementId>
where
    F: Fn(ElementId) -> bool + Sync,
{
    elements
        .par_iter()
        .copied()
        .filter(|&id| predicate(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeRegistry;

    #[test]
    fn test_parallel_expand_matches_sequential() {
        let mut schema = TypeRegistry::new();
        let person = schema.define_node_type("PERSON").unwrap();
        let knows = schema.define_edge_type("KNOWS", true, None).unwrap();
        let mut store = ElementStore::new();

        let nodes: Vec<ElementId> = (0..200)
            .map(|_| store.new_node(&schema, person).unwrap())
            .collect();
        for (i, &node) in nodes.iter().enumerate() {
            let peer = nodes[(i * 7 + 3) % nodes.len()];
            store.new_edge(&schema, knows, node, peer).unwrap();
        }

        let frontier = &nodes[..50];
        let mut sequential = ElementSet::new();
        for &node in frontier {
            collect_peers(&store, node, knows, Direction::Outgoing, &mut sequential);
        }

        let parallel = parallel_expand(&store, frontier, knows, Direction::Outgoing);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_parallel_filter_keeps_order() {
        let ids: Vec<ElementId> = (0..1000).map(ElementId::from_raw).collect();
        let even = parallel_filter(&ids, |id| id.as_raw() % 2 == 0);
        assert_eq!(even.len(), 500);
        assert!(even.windows(2).all(|w| w[0] < w[1]));
    }
}
