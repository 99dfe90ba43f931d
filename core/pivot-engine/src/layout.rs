//! FILENAME: core/pivot-engine/src/layout.rs
//! Layout Builder - turns grouped sums into the ordered positions of a pivot grid.
//!
//! Each grouped axis becomes a flat list of positions in display order:
//! depth-first over the key tree, siblings ordered by their field's sort
//! order, a subtotal after the children it summarizes and one grand total
//! at the very end. Positions reference members both by shared-item index
//! and by their index in the field's own (sorted) item list.

use engine::{CellRange, ColumnIndex};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheValue, SharedItems, SharedValueIndex, ValueId};
use crate::definition::{Axis, AxisField, PivotDefinition, ResolvedAxes, ResolvedAxis, SortOrder};
use crate::group::{GroupKey, GroupTable};

// ============================================================================
// FIELD ITEMS
// ============================================================================

/// One item of an axis field: a shared value plus its visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldItem {
    pub shared_index: ValueId,
    pub hidden: bool,
}

/// Layout of one source column as a pivot field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotFieldLayout {
    pub name: String,
    pub source_index: ColumnIndex,
    /// Row or column axis placement, if any.
    pub axis: Option<Axis>,
    pub sort_order: SortOrder,
    /// All shared items in display order. Empty unless the field is on the
    /// row or column axis.
    pub items: Vec<FieldItem>,
    /// True when the field is summed as a value field.
    pub data_field: bool,
    /// Item position of every shared index.
    item_positions: Vec<u32>,
}

impl PivotFieldLayout {
    fn plain(items: &SharedItems, data_field: bool) -> Self {
        PivotFieldLayout {
            name: items.name.clone(),
            source_index: items.source_index,
            axis: if data_field { Some(Axis::Value) } else { None },
            sort_order: SortOrder::Ascending,
            items: Vec::new(),
            data_field,
            item_positions: Vec::new(),
        }
    }

    fn on_axis(items: &SharedItems, axis: Axis, field: &AxisField) -> Self {
        let order = item_order(items, field);
        let mut item_positions = vec![0u32; items.len()];
        for (pos, &id) in order.iter().enumerate() {
            item_positions[id as usize] = pos as u32;
        }
        let field_items = order
            .into_iter()
            .map(|id| FieldItem {
                shared_index: id,
                hidden: items
                    .value(id)
                    .map(|v| !field.is_visible(&v.to_cell_value()))
                    .unwrap_or(false),
            })
            .collect();

        PivotFieldLayout {
            name: items.name.clone(),
            source_index: items.source_index,
            axis: Some(axis),
            sort_order: field.sort_order,
            items: field_items,
            data_field: false,
            item_positions,
        }
    }

    /// Position of a shared index within `items`.
    pub fn item_index(&self, shared_index: ValueId) -> Option<u32> {
        self.item_positions.get(shared_index as usize).copied()
    }
}

/// Shared indices of `items` in the order `field` displays them.
///
/// Manual order lists the explicitly named values first, in list order,
/// followed by the remaining values in first-seen order.
pub fn item_order(items: &SharedItems, field: &AxisField) -> Vec<ValueId> {
    match field.sort_order {
        SortOrder::Ascending => items.sorted_ids(),
        SortOrder::Descending => {
            let mut ids = items.sorted_ids();
            ids.reverse();
            ids
        }
        SortOrder::Manual => {
            let mut ids: Vec<ValueId> = (0..items.len() as ValueId).collect();
            // Stable sort keeps first-seen order among unlisted values.
            ids.sort_by_key(|&id| {
                items
                    .value(id)
                    .and_then(|v| field.listed_position(&v.to_cell_value()))
                    .unwrap_or(usize::MAX)
            });
            ids
        }
    }
}

// ============================================================================
// AXIS POSITIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionKind {
    /// A full key, one member per axis field.
    Leaf,
    /// A key shorter than the axis field count.
    Subtotal,
    GrandTotal,
}

/// A field reference on a row or column axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisFieldRef {
    Source(ColumnIndex),
    /// The data fields shown side by side.
    Values,
}

/// One row or column of the rendered pivot grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisPosition {
    pub kind: PositionKind,
    pub key: GroupKey,
    /// Shared-item index of each member, outermost first.
    pub shared_indices: Vec<ValueId>,
    /// Index of each member in its field's item list.
    pub item_indices: Vec<u32>,
    pub visible: bool,
    /// Data field shown at this position, when values are laid out on this axis.
    pub data_field: Option<usize>,
    /// Sums of the value fields for `key`.
    pub sums: Vec<f64>,
}

impl AxisPosition {
    pub fn depth(&self) -> usize {
        self.key.depth()
    }

    /// The sum this position displays: its own data field, or the first one.
    pub fn value(&self) -> Option<f64> {
        self.sums.get(self.data_field.unwrap_or(0)).copied()
    }
}

/// Ordered positions of one axis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisLayout {
    pub fields: Vec<AxisFieldRef>,
    pub positions: Vec<AxisPosition>,
}

impl AxisLayout {
    pub fn visible_positions(&self) -> impl Iterator<Item = &AxisPosition> + '_ {
        self.positions.iter().filter(|p| p.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_positions().count()
    }

    pub fn has_values_field(&self) -> bool {
        self.fields.contains(&AxisFieldRef::Values)
    }
}

// ============================================================================
// DATA FIELDS AND LOCATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataField {
    /// Display name, "Sum of <column>".
    pub name: String,
    pub source_index: ColumnIndex,
}

/// Where the rendered pivot table sits on its sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotLocation {
    pub range: CellRange,
    pub first_header_row: u32,
    pub first_data_row: u32,
    pub first_data_col: u32,
}

/// The complete position-indexed description of a pivot grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotLayout {
    pub name: String,
    pub data_caption: String,
    /// One entry per source column, in column order.
    pub fields: Vec<PivotFieldLayout>,
    pub rows: AxisLayout,
    pub columns: AxisLayout,
    pub data_fields: Vec<DataField>,
    pub location: PivotLocation,
}

impl PivotLayout {
    pub fn field(&self, index: ColumnIndex) -> Option<&PivotFieldLayout> {
        self.fields.get(index)
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds the layout of a pivot table from its grouped axes.
pub fn build_layout(
    definition: &PivotDefinition,
    index: &SharedValueIndex,
    axes: &ResolvedAxes,
    row_groups: &GroupTable,
    column_groups: &GroupTable,
) -> PivotLayout {
    let fields = build_field_layouts(index, axes);
    let value_count = axes.values.len();

    let rows = AxisBuilder::new(index, &axes.rows, &fields, row_groups).build();

    let mut columns = if axes.columns.is_empty() && value_count > 1 {
        values_axis(value_count, column_groups)
    } else {
        AxisBuilder::new(index, &axes.columns, &fields, column_groups).build()
    };
    if !axes.columns.is_empty() && value_count > 1 {
        nest_values(&mut columns, value_count);
    }

    let data_fields = axes
        .values
        .fields
        .iter()
        .zip(&axes.values.indices)
        .map(|(field, &source_index)| DataField {
            name: format!("Sum of {}", field.name),
            source_index,
        })
        .collect();

    let location = locate(definition, &rows, &columns, axes.rows.len());

    log::debug!(
        "pivot layout '{}': {} row positions ({} visible), {} column positions ({} visible)",
        definition.name,
        rows.positions.len(),
        rows.visible_count(),
        columns.positions.len(),
        columns.visible_count()
    );

    PivotLayout {
        name: definition.name.clone(),
        data_caption: definition.data_caption.clone(),
        fields,
        rows,
        columns,
        data_fields,
        location,
    }
}

fn build_field_layouts(index: &SharedValueIndex, axes: &ResolvedAxes) -> Vec<PivotFieldLayout> {
    index
        .fields()
        .iter()
        .map(|items| {
            let col = items.source_index;
            if let Some(field) = placed_field(&axes.rows, col) {
                PivotFieldLayout::on_axis(items, Axis::Row, field)
            } else if let Some(field) = placed_field(&axes.columns, col) {
                PivotFieldLayout::on_axis(items, Axis::Column, field)
            } else {
                PivotFieldLayout::plain(items, axes.values.indices.contains(&col))
            }
        })
        .collect()
}

fn placed_field(axis: &ResolvedAxis, col: ColumnIndex) -> Option<&AxisField> {
    axis.indices
        .iter()
        .position(|&i| i == col)
        .map(|pos| &axis.fields[pos])
}

/// Column axis made of the data fields alone: one position per value field.
fn values_axis(value_count: usize, groups: &GroupTable) -> AxisLayout {
    let sums = groups.grand_total().to_vec();
    let positions = (0..value_count)
        .map(|i| AxisPosition {
            kind: PositionKind::Leaf,
            key: GroupKey::root(),
            shared_indices: Vec::new(),
            item_indices: Vec::new(),
            visible: true,
            data_field: Some(i),
            sums: sums.clone(),
        })
        .collect();
    AxisLayout {
        fields: vec![AxisFieldRef::Values],
        positions,
    }
}

/// Appends the values field innermost and repeats every position once per data field.
fn nest_values(layout: &mut AxisLayout, value_count: usize) {
    layout.fields.push(AxisFieldRef::Values);
    layout.positions = layout
        .positions
        .drain(..)
        .flat_map(|position| {
            (0..value_count).map(move |i| AxisPosition {
                data_field: Some(i),
                ..position.clone()
            })
        })
        .collect();
}

fn locate(definition: &PivotDefinition, rows: &AxisLayout, columns: &AxisLayout, row_fields: usize) -> PivotLocation {
    let row_fields = row_fields.max(1) as u32;
    let column_fields = (columns.fields.len()).max(1) as u32;
    let width = row_fields + columns.visible_count() as u32;
    let height = 1 + column_fields + rows.visible_count() as u32;

    PivotLocation {
        range: CellRange::from_origin(definition.anchor, height, width),
        first_header_row: 1,
        first_data_row: 1 + column_fields,
        first_data_col: row_fields,
    }
}

/// Depth-first walk over the key tree of one grouped axis.
struct AxisBuilder<'a> {
    axis: &'a ResolvedAxis,
    fields: &'a [PivotFieldLayout],
    groups: &'a GroupTable,
    /// Members below each parent key, with their shared-item index.
    children: FxHashMap<GroupKey, Vec<(ValueId, CacheValue)>>,
    positions: Vec<AxisPosition>,
}

impl<'a> AxisBuilder<'a> {
    fn new(
        index: &SharedValueIndex,
        axis: &'a ResolvedAxis,
        fields: &'a [PivotFieldLayout],
        groups: &'a GroupTable,
    ) -> Self {
        let mut children: FxHashMap<GroupKey, Vec<(ValueId, CacheValue)>> = FxHashMap::default();
        for key in groups.keys() {
            let (parent, member) = match (key.parent(), key.values().last()) {
                (Some(parent), Some(member)) => (parent, member),
                _ => continue,
            };
            let shared = axis
                .indices
                .get(key.depth() - 1)
                .and_then(|&col| index.field(col))
                .and_then(|items| items.index_of(member));
            if let Some(id) = shared {
                children.entry(parent).or_default().push((id, member.clone()));
            }
        }

        AxisBuilder {
            axis,
            fields,
            groups,
            children,
            positions: Vec::new(),
        }
    }

    fn build(mut self) -> AxisLayout {
        let root = GroupKey::root();
        let mut shared = Vec::new();
        let mut items = Vec::new();
        self.flatten_nodes(&root, &mut shared, &mut items, true);

        let sums = self.sums(&root);
        self.positions.push(AxisPosition {
            kind: PositionKind::GrandTotal,
            key: root,
            shared_indices: Vec::new(),
            item_indices: Vec::new(),
            visible: true,
            data_field: None,
            sums,
        });

        AxisLayout {
            fields: self.axis.indices.iter().map(|&i| AxisFieldRef::Source(i)).collect(),
            positions: self.positions,
        }
    }

    fn sums(&self, key: &GroupKey) -> Vec<f64> {
        self.groups.get(key).map(<[f64]>::to_vec).unwrap_or_default()
    }

    /// Emits the positions below `key`, each subtree before its subtotal.
    /// Returns true if any leaf below `key` is visible.
    fn flatten_nodes(
        &mut self,
        key: &GroupKey,
        shared: &mut Vec<ValueId>,
        items: &mut Vec<u32>,
        parent_visible: bool,
    ) -> bool {
        let axis = self.axis;
        let fields = self.fields;
        let depth = key.depth();
        let (field, layout) = match (axis.fields.get(depth), axis.indices.get(depth)) {
            (Some(field), Some(&col)) => match fields.get(col) {
                Some(layout) => (field, layout),
                None => return false,
            },
            _ => return false,
        };

        let mut children = self.children.get(key).cloned().unwrap_or_default();
        children.sort_by_key(|(id, _)| layout.item_index(*id).unwrap_or(u32::MAX));

        let mut any_visible = false;
        for (id, member) in children {
            let visible = parent_visible && field.is_visible(&member.to_cell_value());
            let item = layout.item_index(id).unwrap_or(0);
            let child = key.child(member);
            shared.push(id);
            items.push(item);

            let is_leaf = child.depth() == axis.len();
            let shown = if is_leaf {
                visible
            } else {
                let below = self.flatten_nodes(&child, shared, items, visible);
                visible && below
            };
            any_visible |= shown;

            let sums = self.sums(&child);
            self.positions.push(AxisPosition {
                kind: if is_leaf {
                    PositionKind::Leaf
                } else {
                    PositionKind::Subtotal
                },
                key: child,
                shared_indices: shared.clone(),
                item_indices: items.clone(),
                visible: shown,
                data_field: None,
                sums,
            });

            shared.pop();
            items.pop();
        }
        any_visible
    }
}
