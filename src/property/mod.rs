/// Property / Index Store
///
/// One column per property type: a forward map element -> value plus, for
/// Unique and Indexed properties, an ordered value index kept in step with
/// the forward map on every write.

pub mod index;

pub use index::PropertyIndex;

use crate::error::{GraphError, GraphResult};
use crate::schema::{IndexKind, PropertyType};
use crate::traversal::ElementSet;
use crate::types::{ElementId, PropertyTypeId, Value, ValueKind};
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeBounds;

/// Storage of a single property type
#[derive(Debug, Clone)]
pub struct PropertyColumn {
    property: PropertyTypeId,
    kind: ValueKind,
    index_kind: IndexKind,
    values: HashMap<ElementId, Value>,
    index: Option<PropertyIndex>,
}

impl PropertyColumn {
    pub fn new(property: &PropertyType) -> Self {
        Self {
            property: property.id,
            kind: property.kind,
            index_kind: property.index,
            values: HashMap::new(),
            index: property.index.is_indexed().then(PropertyIndex::new),
        }
    }

    pub fn index_kind(&self) -> IndexKind {
        self.index_kind
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, element: ElementId) -> Option<&Value> {
        self.values.get(&element)
    }

    /// `(element, value)` bindings in ascending element order
    pub fn bindings(&self) -> Vec<(ElementId, &Value)> {
        let mut bindings: Vec<(ElementId, &Value)> =
            self.values.iter().map(|(id, v)| (*id, v)).collect();
        bindings.sort_unstable_by_key(|(id, _)| *id);
        bindings
    }

    pub fn index(&self) -> Option<&PropertyIndex> {
        self.index.as_ref()
    }

    fn check_kind(&self, value: &Value) -> GraphResult<()> {
        if value.kind() != self.kind {
            return Err(GraphError::KindMismatch {
                property: self.property,
                expected: self.kind,
                actual: value.kind(),
            });
        }
        if let Value::Double(d) = value {
            if !d.is_finite() {
                return Err(GraphError::InvalidValue {
                    property: self.property,
                    reason: format!("{} is not a finite double", d),
                });
            }
        }
        Ok(())
    }

    fn indexed(&self) -> GraphResult<&PropertyIndex> {
        self.index.as_ref().ok_or_else(|| {
            GraphError::Schema(format!(
                "property {} is {} and has no index; use a scan lookup",
                self.property, self.index_kind
            ))
        })
    }

    /// Bind `value` to `element`, returning `true` if the stored state changed
    fn set(&mut self, element: ElementId, value: Value) -> GraphResult<bool> {
        self.check_kind(&value)?;

        if self.values.get(&element) == Some(&value) {
            return Ok(false);
        }

        if self.index_kind == IndexKind::Unique {
            let holder = self
                .index
                .as_ref()
                .and_then(|idx| idx.get(&value))
                .and_then(|holders| holders.iter().find(|&&h| h != element).copied());
            if let Some(holder) = holder {
                return Err(GraphError::UniquenessViolation {
                    property: self.property,
                    value,
                    holder,
                });
            }
        }

        let previous = self.values.insert(element, value.clone());
        if let Some(index) = self.index.as_mut() {
            if let Some(old) = previous {
                index.remove(&old, element);
            }
            index.insert(value, element);
        }
        Ok(true)
    }

    fn remove(&mut self, element: ElementId) -> Option<Value> {
        let previous = self.values.remove(&element)?;
        if let Some(index) = self.index.as_mut() {
            index.remove(&previous, element);
        }
        Some(previous)
    }
}

/// All property columns of a graph
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    columns: BTreeMap<PropertyTypeId, PropertyColumn>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the (empty) column for a newly defined property type
    pub fn add_column(&mut self, property: &PropertyType) {
        self.columns
            .entry(property.id)
            .or_insert_with(|| PropertyColumn::new(property));
    }

    pub fn column(&self, property: PropertyTypeId) -> GraphResult<&PropertyColumn> {
        self.columns
            .get(&property)
            .ok_or_else(|| GraphError::NotFound(format!("property type {}", property)))
    }

    fn column_mut(&mut self, property: PropertyTypeId) -> GraphResult<&mut PropertyColumn> {
        self.columns
            .get_mut(&property)
            .ok_or_else(|| GraphError::NotFound(format!("property type {}", property)))
    }

    pub fn columns(&self) -> impl Iterator<Item = &PropertyColumn> {
        self.columns.values()
    }

    /// Set a property value
    ///
    /// Checks the value kind and, for Unique properties, that no other
    /// element holds the value. The previous value (if any) leaves the index
    /// before the new one is inserted. Rewriting the current value is a no-op.
    ///
    /// # Returns
    /// * `Ok(true)` if the stored state changed, `Ok(false)` if the value was already set
    pub fn set(
        &mut self,
        element: ElementId,
        property: PropertyTypeId,
        value: Value,
    ) -> GraphResult<bool> {
        self.column_mut(property)?.set(element, value)
    }

    pub fn get(&self, element: ElementId, property: PropertyTypeId) -> GraphResult<Option<&Value>> {
        Ok(self.column(property)?.get(element))
    }

    /// Clear a binding, returning the removed value
    pub fn remove(
        &mut self,
        element: ElementId,
        property: PropertyTypeId,
    ) -> GraphResult<Option<Value>> {
        Ok(self.column_mut(property)?.remove(element))
    }

    /// Point lookup through a Unique index
    pub fn find_unique(
        &self,
        property: PropertyTypeId,
        value: &Value,
    ) -> GraphResult<Option<ElementId>> {
        let column = self.column(property)?;
        if column.index_kind != IndexKind::Unique {
            return Err(GraphError::Schema(format!(
                "property {} is {}, not unique",
                property, column.index_kind
            )));
        }
        column.check_kind(value)?;
        Ok(column
            .indexed()?
            .get(value)
            .and_then(|elements| elements.iter().next().copied()))
    }

    /// Point lookup through an Indexed or Unique index
    pub fn find_indexed(&self, property: PropertyTypeId, value: &Value) -> GraphResult<ElementSet> {
        let column = self.column(property)?;
        column.check_kind(value)?;
        Ok(column
            .indexed()?
            .get(value)
            .map(|elements| elements.iter().copied().collect())
            .unwrap_or_default())
    }

    /// Range lookup through an Indexed or Unique index
    pub fn find_range<R>(&self, property: PropertyTypeId, range: R) -> GraphResult<ElementSet>
    where
        R: RangeBounds<Value>,
    {
        let column = self.column(property)?;
        for bound in [range.start_bound(), range.end_bound()] {
            match bound {
                std::ops::Bound::Included(v) | std::ops::Bound::Excluded(v) => {
                    column.check_kind(v)?
                }
                std::ops::Bound::Unbounded => {}
            }
        }
        Ok(column.indexed()?.range(range).collect())
    }

    /// Restore a column's persisted bindings and index entries
    ///
    /// Every index entry must agree with the forward map; a disagreement
    /// means the persisted image is inconsistent.
    pub fn restore_column(
        &mut self,
        property: &PropertyType,
        bindings: Vec<(ElementId, Value)>,
        index_entries: Vec<(Value, Vec<ElementId>)>,
    ) -> GraphResult<()> {
        let mut column = PropertyColumn::new(property);
        for (element, value) in bindings {
            column.check_kind(&value)?;
            column.values.insert(element, value);
        }

        if let Some(index) = column.index.as_mut() {
            let mut indexed = 0usize;
            for (value, elements) in index_entries {
                if property.index == IndexKind::Unique && elements.len() > 1 {
                    return Err(GraphError::Schema(format!(
                        "persisted unique index of {} holds {} elements for one value",
                        property.id,
                        elements.len()
                    )));
                }
                for element in elements {
                    if column.values.get(&element) != Some(&value) {
                        return Err(GraphError::Schema(format!(
                            "persisted index of {} disagrees with stored value of {}",
                            property.id, element
                        )));
                    }
                    index.insert(value.clone(), element);
                    indexed += 1;
                }
            }
            if indexed != column.values.len() {
                return Err(GraphError::Schema(format!(
                    "persisted index of {} covers {} of {} values",
                    property.id,
                    indexed,
                    column.values.len()
                )));
            }
        } else if !index_entries.is_empty() {
            return Err(GraphError::Schema(format!(
                "persisted index entries for {} property {}",
                property.index, property.id
            )));
        }

        self.columns.insert(property.id, column);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElementType, NodeTypeId};
    use std::ops::Bound;

    fn property(id: u32, kind: ValueKind, index: IndexKind) -> PropertyType {
        PropertyType {
            id: PropertyTypeId::from_raw(id),
            owner: ElementType::Node(NodeTypeId::from_raw(0)),
            name: format!("P{}", id),
            kind,
            index,
        }
    }

    fn store_with(pt: &PropertyType) -> PropertyStore {
        let mut store = PropertyStore::new();
        store.add_column(pt);
        store
    }

    fn e(id: u64) -> ElementId {
        ElementId::from_raw(id)
    }

    #[test]
    fn test_unique_violation() {
        let pt = property(0, ValueKind::Long, IndexKind::Unique);
        let mut store = store_with(&pt);

        store.set(e(1), pt.id, Value::Long(1)).unwrap();
        let result = store.set(e(2), pt.id, Value::Long(1));
        match result {
            Err(GraphError::UniquenessViolation { holder, .. }) => assert_eq!(holder, e(1)),
            other => panic!("expected uniqueness violation, got {:?}", other),
        }
        assert_eq!(store.find_unique(pt.id, &Value::Long(1)).unwrap(), Some(e(1)));
        assert_eq!(store.get(e(2), pt.id).unwrap(), None);
    }

    #[test]
    fn test_unique_rebind_after_release() {
        let pt = property(0, ValueKind::Long, IndexKind::Unique);
        let mut store = store_with(&pt);

        store.set(e(1), pt.id, Value::Long(1)).unwrap();
        store.set(e(1), pt.id, Value::Long(2)).unwrap();
        // Value 1 is free again once e1 moved to 2
        store.set(e(2), pt.id, Value::Long(1)).unwrap();
        assert_eq!(store.find_unique(pt.id, &Value::Long(1)).unwrap(), Some(e(2)));
        assert_eq!(store.find_unique(pt.id, &Value::Long(2)).unwrap(), Some(e(1)));
    }

    #[test]
    fn test_kind_mismatch() {
        let pt = property(0, ValueKind::Long, IndexKind::Unique);
        let mut store = store_with(&pt);
        let result = store.set(e(1), pt.id, Value::Integer(1));
        assert!(matches!(
            result,
            Err(GraphError::KindMismatch {
                expected: ValueKind::Long,
                actual: ValueKind::Integer,
                ..
            })
        ));
    }

    #[test]
    fn test_overwrite_leaves_no_stale_index_entry() {
        let pt = property(1, ValueKind::Text, IndexKind::Indexed);
        let mut store = store_with(&pt);

        store.set(e(1), pt.id, Value::from("Manhattan")).unwrap();
        store.set(e(1), pt.id, Value::from("Annie Hall")).unwrap();

        assert!(store
            .find_indexed(pt.id, &Value::from("Manhattan"))
            .unwrap()
            .is_empty());
        assert!(store
            .find_indexed(pt.id, &Value::from("Annie Hall"))
            .unwrap()
            .contains(e(1)));
    }

    #[test]
    fn test_set_is_idempotent() {
        let pt = property(1, ValueKind::Integer, IndexKind::Indexed);
        let mut store = store_with(&pt);

        assert!(store.set(e(1), pt.id, Value::Integer(1979)).unwrap());
        let after_once = store.column(pt.id).unwrap().index().cloned();
        assert!(!store.set(e(1), pt.id, Value::Integer(1979)).unwrap());

        assert_eq!(store.column(pt.id).unwrap().index().cloned(), after_once);
        assert_eq!(store.column(pt.id).unwrap().len(), 1);
    }

    #[test]
    fn test_indexed_allows_shared_values() {
        let pt = property(1, ValueKind::Integer, IndexKind::Indexed);
        let mut store = store_with(&pt);
        store.set(e(1), pt.id, Value::Integer(2008)).unwrap();
        store.set(e(2), pt.id, Value::Integer(2008)).unwrap();

        let found = store.find_indexed(pt.id, &Value::Integer(2008)).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_range_lookup() {
        let pt = property(1, ValueKind::Integer, IndexKind::Indexed);
        let mut store = store_with(&pt);
        for (id, year) in [(1, 2003), (2, 2008), (3, 1979)] {
            store.set(e(id), pt.id, Value::Integer(year)).unwrap();
        }

        let found = store
            .find_range(
                pt.id,
                (Bound::Included(Value::Integer(2000)), Bound::Unbounded),
            )
            .unwrap();
        assert_eq!(found.to_sorted_vec(), vec![e(1), e(2)]);

        let wrong_kind = store.find_range(pt.id, Value::Long(0)..Value::Long(5));
        assert!(matches!(wrong_kind, Err(GraphError::KindMismatch { .. })));
    }

    #[test]
    fn test_empty_and_inverted_ranges() {
        let pt = property(1, ValueKind::Integer, IndexKind::Indexed);
        let mut store = store_with(&pt);
        for (id, year) in [(1, 2003), (2, 2008), (3, 1979)] {
            store.set(e(id), pt.id, Value::Integer(year)).unwrap();
        }

        let inverted = store.find_range(pt.id, Value::Integer(2010)..Value::Integer(1970));
        assert!(inverted.unwrap().is_empty());
        let both_excluded = store
            .find_range(
                pt.id,
                (
                    Bound::Excluded(Value::Integer(2003)),
                    Bound::Excluded(Value::Integer(2003)),
                ),
            )
            .unwrap();
        assert!(both_excluded.is_empty());
        let half_open = store.find_range(pt.id, Value::Integer(2003)..Value::Integer(2003));
        assert!(half_open.unwrap().is_empty());
        let single = store
            .find_range(pt.id, Value::Integer(2003)..=Value::Integer(2003))
            .unwrap();
        assert_eq!(single.to_sorted_vec(), vec![e(1)]);
    }

    #[test]
    fn test_non_finite_double_rejected() {
        let pt = property(3, ValueKind::Double, IndexKind::Indexed);
        let mut store = store_with(&pt);
        store.set(e(1), pt.id, Value::Double(7.5)).unwrap();

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = store.set(e(1), pt.id, Value::Double(bad));
            assert!(matches!(result, Err(GraphError::InvalidValue { .. })));
        }
        assert_eq!(store.get(e(1), pt.id).unwrap(), Some(&Value::Double(7.5)));
        assert!(matches!(
            store.find_indexed(pt.id, &Value::Double(f64::NAN)),
            Err(GraphError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_basic_property_has_no_index_path() {
        let pt = property(2, ValueKind::Text, IndexKind::Basic);
        let mut store = store_with(&pt);
        store.set(e(5), pt.id, Value::from("Charlotte")).unwrap();

        assert_eq!(
            store.get(e(5), pt.id).unwrap(),
            Some(&Value::from("Charlotte"))
        );
        let result = store.find_indexed(pt.id, &Value::from("Charlotte"));
        assert!(matches!(result, Err(GraphError::Schema(_))));
    }

    #[test]
    fn test_remove_clears_index() {
        let pt = property(0, ValueKind::Long, IndexKind::Unique);
        let mut store = store_with(&pt);
        store.set(e(1), pt.id, Value::Long(7)).unwrap();

        assert_eq!(store.remove(e(1), pt.id).unwrap(), Some(Value::Long(7)));
        assert_eq!(store.find_unique(pt.id, &Value::Long(7)).unwrap(), None);
        store.set(e(2), pt.id, Value::Long(7)).unwrap();
    }

    #[test]
    fn test_unknown_property() {
        let store = PropertyStore::new();
        let result = store.get(e(1), PropertyTypeId::from_raw(42));
        assert!(matches!(result, Err(GraphError::NotFound(_))));
    }

    #[test]
    fn test_restore_column_rejects_inconsistent_index() {
        let pt = property(1, ValueKind::Integer, IndexKind::Indexed);
        let mut store = PropertyStore::new();
        let result = store.restore_column(
            &pt,
            vec![(e(1), Value::Integer(2003))],
            vec![(Value::Integer(2008), vec![e(1)])],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_restore_column_rejects_entries_for_basic_property() {
        let pt = property(2, ValueKind::Text, IndexKind::Basic);
        let mut store = PropertyStore::new();
        let result = store.restore_column(
            &pt,
            vec![(e(1), Value::from("Mary"))],
            vec![(Value::from("Mary"), vec![e(1)])],
        );
        assert!(matches!(result, Err(GraphError::Schema(_))));
    }

    #[test]
    fn test_restore_column() {
        let pt = property(1, ValueKind::Integer, IndexKind::Indexed);
        let mut store = PropertyStore::new();
        store
            .restore_column(
                &pt,
                vec![(e(1), Value::Integer(2003)), (e(2), Value::Integer(2003))],
                vec![(Value::Integer(2003), vec![e(1), e(2)])],
            )
            .unwrap();
        assert_eq!(
            store
                .find_indexed(pt.id, &Value::Integer(2003))
                .unwrap()
                .len(),
            2
        );
    }
}
