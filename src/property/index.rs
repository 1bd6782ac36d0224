//! Ordered value index for one property type

use crate::types::{ElementId, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Bound, RangeBounds};

/// Value -> set of elements holding that value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyIndex {
    entries: BTreeMap<Value, BTreeSet<ElementId>>,
}

impl PropertyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: Value, element: ElementId) {
        self.entries.entry(value).or_default().insert(element);
    }

    /// Remove one binding; drops the entry once its element set is empty
    pub fn remove(&mut self, value: &Value, element: ElementId) {
        if let Some(elements) = self.entries.get_mut(value) {
            elements.remove(&element);
            if elements.is_empty() {
                self.entries.remove(value);
            }
        }
    }

    pub fn get(&self, value: &Value) -> Option<&BTreeSet<ElementId>> {
        self.entries.get(value)
    }

    pub fn range<R>(&self, range: R) -> impl Iterator<Item = ElementId> + '_
    where
        R: RangeBounds<Value>,
    {
        let entries = (!is_empty_range(&range)).then(|| self.entries.range(range));
        entries
            .into_iter()
            .flatten()
            .flat_map(|(_, elements)| elements.iter().copied())
    }

    /// All `(value, elements)` entries in value order
    pub fn entries(&self) -> impl Iterator<Item = (&Value, &BTreeSet<ElementId>)> {
        self.entries.iter()
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// True for inverted ranges and for `start == end` unless both ends are
/// inclusive; `BTreeMap::range` panics on some of these
fn is_empty_range<R: RangeBounds<Value>>(range: &R) -> bool {
    match (range.start_bound(), range.end_bound()) {
        (Bound::Included(start), Bound::Included(end)) => start > end,
        (
            Bound::Included(start) | Bound::Excluded(start),
            Bound::Included(end) | Bound::Excluded(end),
        ) => start >= end,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Bound;

    #[test]
    fn test_property_index_ops() {
        let mut index = PropertyIndex::new();
        let e1 = ElementId::from_raw(1);
        let e2 = ElementId::from_raw(2);
        let year = Value::Integer(2008);

        index.insert(year.clone(), e1);
        index.insert(year.clone(), e2);
        assert_eq!(index.get(&year).unwrap().len(), 2);

        index.remove(&year, e1);
        let remaining = index.get(&year).unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.contains(&e2));

        index.remove(&year, e2);
        assert!(index.get(&year).is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn test_property_index_range() {
        let mut index = PropertyIndex::new();
        for year in [1979, 2003, 2008, 2010] {
            index.insert(Value::Integer(year), ElementId::from_raw(year as u64));
        }

        let range = (
            Bound::Included(Value::Integer(2000)),
            Bound::Excluded(Value::Integer(2010)),
        );
        let found: Vec<ElementId> = index.range(range).collect();
        assert_eq!(
            found,
            vec![ElementId::from_raw(2003), ElementId::from_raw(2008)]
        );
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let mut index = PropertyIndex::new();
        index.insert(Value::Integer(2003), ElementId::from_raw(1));

        assert_eq!(index.range(Value::Integer(50)..Value::Integer(10)).count(), 0);
        let excluded = (
            Bound::Excluded(Value::Integer(2003)),
            Bound::Excluded(Value::Integer(2003)),
        );
        assert_eq!(index.range(excluded).count(), 0);
        assert_eq!(
            index.range(Value::Integer(2003)..=Value::Integer(2003)).count(),
            1
        );
    }

    #[test]
    fn test_remove_missing_binding_is_noop() {
        let mut index = PropertyIndex::new();
        index.insert(Value::from("Manhattan"), ElementId::from_raw(3));
        index.remove(&Value::from("Annie Hall"), ElementId::from_raw(3));
        index.remove(&Value::from("Manhattan"), ElementId::from_raw(4));
        assert_eq!(index.len(), 1);
    }
}
