//! Element-id sets and the set combinators used to compose queries

use crate::types::ElementId;
use std::collections::hash_set;
use std::collections::HashSet;

/// An unordered set of element ids
///
/// Query results are plain values: combinators never mutate their inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSet {
    ids: HashSet<ElementId>,
}

impl ElementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: HashSet::with_capacity(capacity),
        }
    }

    /// Returns `true` if the id was not already present
    pub fn insert(&mut self, id: ElementId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.ids.iter().copied()
    }

    /// Ids in ascending order, for deterministic output
    pub fn to_sorted_vec(&self) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn union(&self, other: &ElementSet) -> ElementSet {
        let (large, small) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut ids = large.ids.clone();
        ids.extend(small.ids.iter().copied());
        ElementSet { ids }
    }

    /// Probes the larger set with every member of the smaller one
    pub fn intersection(&self, other: &ElementSet) -> ElementSet {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .ids
            .iter()
            .filter(|id| large.ids.contains(id))
            .copied()
            .collect()
    }

    pub fn difference(&self, other: &ElementSet) -> ElementSet {
        self.ids
            .iter()
            .filter(|id| !other.ids.contains(id))
            .copied()
            .collect()
    }
}

/// Union of two element sets
pub fn union(a: &ElementSet, b: &ElementSet) -> ElementSet {
    a.union(b)
}

/// Intersection of two element sets, O(min(|a|, |b|))
pub fn intersect(a: &ElementSet, b: &ElementSet) -> ElementSet {
    a.intersection(b)
}

/// Elements of `a` that are not in `b`
pub fn difference(a: &ElementSet, b: &ElementSet) -> ElementSet {
    a.difference(b)
}

impl FromIterator<ElementId> for ElementSet {
    fn from_iter<I: IntoIterator<Item = ElementId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl Extend<ElementId> for ElementSet {
    fn extend<I: IntoIterator<Item = ElementId>>(&mut self, iter: I) {
        self.ids.extend(iter);
    }
}

impl IntoIterator for ElementSet {
    type Item = ElementId;
    type IntoIter = hash_set::IntoIter<ElementId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

impl<'a> IntoIterator for &'a ElementSet {
    type Item = ElementId;
    type IntoIter = std::iter::Copied<hash_set::Iter<'a, ElementId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter().copied()
    }
}
