//! FILENAME: core/pivot-engine/src/group.rs
//! Group Aggregator - sums value fields for every key prefix on one axis.
//!
//! For each row the full key (one value per axis field, outermost first) is
//! built, then the row's value amounts are added to that key and to every
//! shorter prefix of it down to the empty key. The empty key therefore holds
//! the grand total, and every key's parent holds at least its sums.

use engine::{ColumnIndex, Table};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cache::CacheValue;
use crate::definition::{check_disjoint, resolve_axis, Axis, AxisSpec, ResolvedAxis};
use crate::error::PivotError;

// ============================================================================
// GROUP KEY
// ============================================================================

/// Variable-length tuple of axis member values, outermost field first.
/// The empty key is the grand-total bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GroupKey(pub SmallVec<[CacheValue; 4]>);

impl GroupKey {
    pub fn root() -> Self {
        GroupKey(SmallVec::new())
    }

    pub fn from_values(values: impl IntoIterator<Item = CacheValue>) -> Self {
        GroupKey(values.into_iter().collect())
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[CacheValue] {
        &self.0
    }

    /// The key with its innermost member dropped.
    pub fn parent(&self) -> Option<GroupKey> {
        if self.0.is_empty() {
            return None;
        }
        let mut parent = self.clone();
        parent.0.pop();
        Some(parent)
    }

    /// The key extended by one inner member.
    pub fn child(&self, value: CacheValue) -> GroupKey {
        let mut child = self.clone();
        child.0.push(value);
        child
    }
}

// ============================================================================
// GROUP TABLE
// ============================================================================

/// Accumulated sums per group key, one sum per value field.
#[derive(Debug, Clone)]
pub struct GroupTable {
    field_count: usize,
    value_names: Vec<String>,
    groups: FxHashMap<GroupKey, Vec<f64>>,
}

impl GroupTable {
    /// Groups `table` by the fields of `spec` and sums the fields of `values`.
    ///
    /// An empty `values` spec sums the last table column.
    pub fn build(table: &Table, axis: Axis, spec: &AxisSpec, values: &AxisSpec) -> Result<Self, PivotError> {
        let headers = table.headers();
        let values = if values.is_empty() {
            match headers.last() {
                Some(last) => AxisSpec::new().with(last.as_str()),
                None => return Err(PivotError::EmptyRange),
            }
        } else {
            values.clone()
        };

        let fields = resolve_axis(headers, axis, spec)?;
        let values = resolve_axis(headers, Axis::Value, &values)?;
        check_disjoint(&[&fields, &values])?;

        Ok(Self::from_resolved(table, &fields, &values))
    }

    /// Groups with axes that were already validated.
    pub fn from_resolved(table: &Table, fields: &ResolvedAxis, values: &ResolvedAxis) -> Self {
        Self::aggregate(table, &fields.indices, &values.indices, values.fields.iter().map(|f| f.name.clone()).collect())
    }

    fn aggregate(
        table: &Table,
        field_indices: &[ColumnIndex],
        value_indices: &[ColumnIndex],
        value_names: Vec<String>,
    ) -> Self {
        let mut groups: FxHashMap<GroupKey, Vec<f64>> = FxHashMap::default();

        for row in table.rows() {
            let amounts: SmallVec<[f64; 4]> = value_indices.iter().map(|&i| row[i].as_number()).collect();
            let mut key = GroupKey::from_values(field_indices.iter().map(|&i| CacheValue::from(&row[i])));

            loop {
                let sums = groups
                    .entry(key.clone())
                    .or_insert_with(|| vec![0.0; value_indices.len()]);
                for (sum, amount) in sums.iter_mut().zip(amounts.iter()) {
                    *sum += amount;
                }
                if key.0.pop().is_none() {
                    break;
                }
            }
        }

        // A table without rows still has a (zero) grand total.
        groups
            .entry(GroupKey::root())
            .or_insert_with(|| vec![0.0; value_indices.len()]);

        log::debug!(
            "group table: {} fields, {} value fields, {} keys",
            field_indices.len(),
            value_indices.len(),
            groups.len()
        );

        GroupTable {
            field_count: field_indices.len(),
            value_names,
            groups,
        }
    }

    /// Number of axis fields the table was grouped by.
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    pub fn value_names(&self) -> &[String] {
        &self.value_names
    }

    /// Sums for `key`, one per value field.
    pub fn get(&self, key: &GroupKey) -> Option<&[f64]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Sum of the `value`-th value field for `key`.
    pub fn sum(&self, key: &GroupKey, value: usize) -> Option<f64> {
        self.groups.get(key)?.get(value).copied()
    }

    pub fn grand_total(&self) -> &[f64] {
        self.groups
            .get(&GroupKey::root())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, key: &GroupKey) -> bool {
        self.groups.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> + '_ {
        self.groups.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &[f64])> + '_ {
        self.groups.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of keys, the empty key included.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
