//! FILENAME: core/pivot-engine/src/cache.rs
//! Shared-Value Index - the deduplicated value store behind a pivot cache.
//!
//! Every source column gets its own ordered list of distinct values
//! ("shared items"). A value's index is its position in that list, assigned
//! in first-seen row order, so rebuilding from the same table always yields
//! the same indices. Records and layouts refer to values by these indices.

use std::cmp::Ordering;

use engine::{CellValue, ColumnIndex, Table};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::PivotError;

// ============================================================================
// VALUE INTERNING
// ============================================================================

/// A reference to an interned value within a column's shared items.
pub type ValueId = u32;

/// A normalized, hashable representation of a cell value.
/// Used as keys in the shared item lookup and in group keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheValue {
    Empty,
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
}

impl From<&CellValue> for CacheValue {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => CacheValue::Empty,
            CellValue::Number(n) => CacheValue::Number(OrderedFloat(*n)),
            CellValue::Text(s) => CacheValue::Text(s.clone()),
            CellValue::Boolean(b) => CacheValue::Boolean(*b),
        }
    }
}

impl From<&CacheValue> for CellValue {
    fn from(value: &CacheValue) -> Self {
        match value {
            CacheValue::Empty => CellValue::Empty,
            CacheValue::Number(n) => CellValue::Number(n.0),
            CacheValue::Text(s) => CellValue::Text(s.clone()),
            CacheValue::Boolean(b) => CellValue::Boolean(*b),
        }
    }
}

impl CacheValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CacheValue::Empty)
    }

    pub fn to_cell_value(&self) -> CellValue {
        CellValue::from(self)
    }
}

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // 0.0 and -0.0 compare equal, so they must hash alike
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

/// Ascending comparison used for field item ordering.
/// Blanks sort first, then numbers, text (case-insensitive) and booleans.
pub fn compare_cache_values(a: &CacheValue, b: &CacheValue) -> Ordering {
    match (a, b) {
        (CacheValue::Empty, CacheValue::Empty) => Ordering::Equal,
        (CacheValue::Empty, _) => Ordering::Less,
        (_, CacheValue::Empty) => Ordering::Greater,

        (CacheValue::Number(na), CacheValue::Number(nb)) => {
            na.0.total_cmp(&nb.0)
        }
        (CacheValue::Number(_), _) => Ordering::Less,
        (_, CacheValue::Number(_)) => Ordering::Greater,

        (CacheValue::Text(ta), CacheValue::Text(tb)) => ta
            .to_lowercase()
            .cmp(&tb.to_lowercase())
            .then_with(|| ta.cmp(tb)),
        (CacheValue::Text(_), _) => Ordering::Less,
        (_, CacheValue::Text(_)) => Ordering::Greater,

        (CacheValue::Boolean(ba), CacheValue::Boolean(bb)) => ba.cmp(bb),
    }
}

// ============================================================================
// SHARED ITEMS
// ============================================================================

/// Declared type of a column's shared items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    /// Every cell is a number.
    Numeric {
        min: f64,
        max: f64,
        all_integers: bool,
    },
    /// Every cell is a boolean.
    Boolean,
    /// Mixed types, blanks or text.
    Text,
}

/// The distinct values of one source column, in first-seen order.
#[derive(Debug, Clone)]
pub struct SharedItems {
    /// Column header.
    pub name: String,

    /// The source column index these items were collected from.
    pub source_index: ColumnIndex,

    lookup: FxHashMap<CacheValue, ValueId>,
    values: Vec<CacheValue>,
    field_type: FieldType,
    contains_blank: bool,
}

impl SharedItems {
    /// Collects the distinct values of `cells`, preserving first-seen order,
    /// and classifies the column.
    pub fn build<'a>(
        name: impl Into<String>,
        source_index: ColumnIndex,
        cells: impl IntoIterator<Item = &'a CellValue>,
    ) -> Self {
        let mut lookup = FxHashMap::default();
        let mut values = Vec::new();

        let mut all_numeric = true;
        let mut all_boolean = true;
        let mut all_integers = true;
        let mut contains_blank = false;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut seen_any = false;

        for cell in cells {
            seen_any = true;
            match cell {
                CellValue::Number(n) => {
                    all_boolean = false;
                    min = min.min(*n);
                    max = max.max(*n);
                    if n.fract() != 0.0 {
                        all_integers = false;
                    }
                }
                CellValue::Boolean(_) => all_numeric = false,
                CellValue::Empty => {
                    contains_blank = true;
                    all_numeric = false;
                    all_boolean = false;
                }
                CellValue::Text(_) => {
                    all_numeric = false;
                    all_boolean = false;
                }
            }

            let key = CacheValue::from(cell);
            if !lookup.contains_key(&key) {
                lookup.insert(key.clone(), values.len() as ValueId);
                values.push(key);
            }
        }

        let field_type = if seen_any && all_numeric {
            FieldType::Numeric {
                min,
                max,
                all_integers,
            }
        } else if seen_any && all_boolean {
            FieldType::Boolean
        } else {
            FieldType::Text
        };

        SharedItems {
            name: name.into(),
            source_index,
            lookup,
            values,
            field_type,
            contains_blank,
        }
    }

    /// Index of `value` in this column, if it was seen.
    pub fn index_of(&self, value: &CacheValue) -> Option<ValueId> {
        self.lookup.get(value).copied()
    }

    /// Gets the value for a given index.
    pub fn value(&self, id: ValueId) -> Option<&CacheValue> {
        self.values.get(id as usize)
    }

    pub fn values(&self) -> &[CacheValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn contains_blank(&self) -> bool {
        self.contains_blank
    }

    /// All indices ordered ascending by value.
    pub fn sorted_ids(&self) -> Vec<ValueId> {
        let mut ids: Vec<ValueId> = (0..self.values.len() as ValueId).collect();
        ids.sort_by(|&a, &b| compare_cache_values(&self.values[a as usize], &self.values[b as usize]));
        ids
    }
}

/// Per-column shared items for a whole table.
#[derive(Debug, Clone)]
pub struct SharedValueIndex {
    fields: Vec<SharedItems>,
    record_count: usize,
}

impl SharedValueIndex {
    /// Builds the index for every column of `table`.
    /// Fails with `EmptyRange` if the table has no data rows.
    pub fn build(table: &Table) -> Result<Self, PivotError> {
        if table.row_count() == 0 || table.column_count() == 0 {
            return Err(PivotError::EmptyRange);
        }

        let fields: Vec<SharedItems> = table
            .headers()
            .iter()
            .enumerate()
            .map(|(idx, name)| SharedItems::build(name.clone(), idx, table.column(idx)))
            .collect();

        log::debug!(
            "shared value index: {} rows, distinct values per column {:?}",
            table.row_count(),
            fields.iter().map(SharedItems::len).collect::<Vec<_>>()
        );

        Ok(SharedValueIndex {
            fields,
            record_count: table.row_count(),
        })
    }

    pub fn fields(&self) -> &[SharedItems] {
        &self.fields
    }

    pub fn field(&self, column: ColumnIndex) -> Option<&SharedItems> {
        self.fields.get(column)
    }

    /// Index of `value` within `column`.
    pub fn index_of(&self, column: ColumnIndex, value: &CellValue) -> Option<ValueId> {
        self.fields.get(column)?.index_of(&CacheValue::from(value))
    }

    /// The value at `id` within `column`.
    pub fn value(&self, column: ColumnIndex, id: ValueId) -> Option<&CacheValue> {
        self.fields.get(column)?.value(id)
    }

    /// Number of data rows the index was built from.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn column_count(&self) -> usize {
        self.fields.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_table() -> Table {
        Table::new(
            vec!["Account".into(), "Images".into(), "Public".into(), "Note".into()],
            vec![
                vec!["Megan".into(), 20.into(), true.into(), "a".into()],
                vec!["Daniel".into(), 31.into(), false.into(), CellValue::Empty],
                vec!["Megan".into(), 4.5.into(), true.into(), 7.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_first_seen_order() {
        let index = SharedValueIndex::build(&create_test_table()).unwrap();
        let accounts = index.field(0).unwrap();
        assert_eq!(
            accounts.values(),
            &[CacheValue::Text("Megan".into()), CacheValue::Text("Daniel".into())]
        );
        assert_eq!(index.index_of(0, &"Daniel".into()), Some(1));
        assert_eq!(index.index_of(0, &"Hannah".into()), None);
        assert_eq!(index.record_count(), 3);
    }

    #[test]
    fn test_field_types() {
        let index = SharedValueIndex::build(&create_test_table()).unwrap();
        assert_eq!(index.field(0).unwrap().field_type(), FieldType::Text);
        assert_eq!(
            index.field(1).unwrap().field_type(),
            FieldType::Numeric {
                min: 4.5,
                max: 31.0,
                all_integers: false
            }
        );
        assert_eq!(index.field(2).unwrap().field_type(), FieldType::Boolean);

        let note = index.field(3).unwrap();
        assert_eq!(note.field_type(), FieldType::Text);
        assert!(note.contains_blank());
        assert_eq!(note.index_of(&CacheValue::Empty), Some(1));
    }

    #[test]
    fn test_empty_range() {
        let table = Table::new(vec!["Account".into()], vec![]).unwrap();
        assert_eq!(SharedValueIndex::build(&table).unwrap_err(), PivotError::EmptyRange);
    }

    #[test]
    fn test_sorted_ids() {
        let items = SharedItems::build(
            "Genre",
            0,
            &[
                CellValue::from("portraits"),
                CellValue::from("Floral"),
                CellValue::from("Landscapes"),
            ],
        );
        assert_eq!(items.sorted_ids(), vec![1, 2, 0]);
    }

    #[test]
    fn test_sorted_ids_with_nan() {
        let items = SharedItems::build(
            "Images",
            0,
            &[
                CellValue::Number(f64::NAN),
                CellValue::Number(31.0),
                CellValue::Number(-2.0),
                CellValue::Number(f64::NAN),
            ],
        );
        assert_eq!(items.len(), 3);
        assert_eq!(items.sorted_ids(), vec![2, 1, 0]);
    }

    #[test]
    fn test_negative_zero_interns_once() {
        let items = SharedItems::build("n", 0, &[CellValue::Number(0.0), CellValue::Number(-0.0)]);
        assert_eq!(items.len(), 1);
    }
}
