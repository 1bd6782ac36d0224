/// Traversal Engine
///
/// Neighbor expansion across one edge type, from a single node or from a set
/// of nodes, plus the set combinators used to compose multi-hop,
/// multi-criterion queries. A single hop costs O(degree): it walks the
/// adjacency list the element store keeps per node and edge type.

pub mod parallel;
pub mod set;

pub use parallel::{parallel_expand, parallel_filter};
pub use set::{difference, intersect, union, ElementSet};

use crate::element::ElementStore;
use crate::schema::EdgeType;
use crate::types::{EdgeTypeId, ElementId};
use serde::{Deserialize, Serialize};

/// Frontiers at least this large are expanded with rayon
pub const PARALLEL_EXPANSION_THRESHOLD: usize = 1024;

/// Which incident edges a traversal follows
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Edges where the start node is the source
    Outgoing,
    /// Edges where the start node is the target
    Incoming,
    /// Both
    Any,
}

impl Direction {
    /// Undirected edge types ignore the requested direction
    pub fn effective_for(self, edge_type: &EdgeType) -> Direction {
        if edge_type.directed {
            self
        } else {
            Direction::Any
        }
    }

    fn follows_outgoing(self) -> bool {
        matches!(self, Direction::Outgoing | Direction::Any)
    }

    fn follows_incoming(self) -> bool {
        matches!(self, Direction::Incoming | Direction::Any)
    }
}

/// Nodes adjacent to `from` across `edge_type` in `direction`
pub fn neighbors(
    store: &ElementStore,
    from: ElementId,
    edge_type: &EdgeType,
    direction: Direction,
) -> ElementSet {
    let mut result = ElementSet::new();
    collect_peers(
        store,
        from,
        edge_type.id,
        direction.effective_for(edge_type),
        &mut result,
    );
    result
}

/// Union of `neighbors` over every member of `from`
pub fn neighbors_of_set(
    store: &ElementStore,
    from: &ElementSet,
    edge_type: &EdgeType,
    direction: Direction,
) -> ElementSet {
    let direction = direction.effective_for(edge_type);
    if from.len() >= PARALLEL_EXPANSION_THRESHOLD {
        let frontier: Vec<ElementId> = from.iter().collect();
        return parallel_expand(store, &frontier, edge_type.id, direction);
    }

    let mut result = ElementSet::new();
    for node in from {
        collect_peers(store, node, edge_type.id, direction, &mut result);
    }
    result
}

/// Edges of `edge_type` incident to `node` in `direction`
pub fn explode(
    store: &ElementStore,
    node: ElementId,
    edge_type: &EdgeType,
    direction: Direction,
) -> ElementSet {
    let mut result = ElementSet::new();
    let direction = direction.effective_for(edge_type);
    if let Some(incidence) = store.incidence(node, edge_type.id) {
        if direction.follows_outgoing() {
            result.extend(incidence.outgoing.iter().map(|&(edge, _)| edge));
        }
        if direction.follows_incoming() {
            result.extend(incidence.incoming.iter().map(|&(edge, _)| edge));
        }
    }
    result
}

/// Number of distinct edges `explode` would return
pub fn degree(
    store: &ElementStore,
    node: ElementId,
    edge_type: &EdgeType,
    direction: Direction,
) -> usize {
    explode(store, node, edge_type, direction).len()
}

pub(crate) fn collect_peers(
    store: &ElementStore,
    node: ElementId,
    edge_type: EdgeTypeId,
    direction: Direction,
    out: &mut ElementSet,
) {
    let Some(incidence) = store.incidence(node, edge_type) else {
        return;
    };
    if direction.follows_outgoing() {
        out.extend(incidence.outgoing.iter().map(|&(_, peer)| peer));
    }
    if direction.follows_incoming() {
        out.extend(incidence.incoming.iter().map(|&(_, peer)| peer));
    }
}
