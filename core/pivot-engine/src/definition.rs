//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Table Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a pivot table:
//! which fields sit on which axis, how each field is sorted and which of its
//! items are visible. These structures are designed to be:
//! - Serializable (hosts can load a pivot request from JSON)
//! - Immutable snapshots of user intent
//! - Validated against a concrete table by [`ResolvedAxes::resolve`]

use std::fmt;

use engine::{CellCoord, CellValue, ColumnIndex};
use serde::{Deserialize, Serialize};

use crate::error::PivotError;

// ============================================================================
// AXES
// ============================================================================

/// The three rendering dimensions of a pivot grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Column,
    Value,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::Row => "row",
            Axis::Column => "column",
            Axis::Value => "value",
        })
    }
}

/// Sort order for field items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
    /// Explicitly listed values first (in list order), then the rest in
    /// first-seen order.
    Manual,
}

impl SortOrder {
    /// The `sortType` attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
            SortOrder::Manual => "manual",
        }
    }
}

// ============================================================================
// FIELD DEFINITIONS
// ============================================================================

/// A source column placed on an axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisField {
    /// Column header of the source field.
    pub name: String,

    /// Sort order for this field's items.
    #[serde(default)]
    pub sort_order: SortOrder,

    /// Values named by the visibility filter. Empty means every value is visible.
    #[serde(default)]
    pub values: Vec<CellValue>,

    /// When true `values` lists the visible items, otherwise the hidden ones.
    #[serde(default = "default_true")]
    pub visibility_is_allowlist: bool,
}

fn default_true() -> bool {
    true
}

impl AxisField {
    pub fn new(name: impl Into<String>) -> Self {
        AxisField {
            name: name.into(),
            sort_order: SortOrder::Ascending,
            values: Vec::new(),
            visibility_is_allowlist: true,
        }
    }

    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Shows only `values`; every other item is hidden.
    /// A non-empty list switches the field to manual sorting.
    pub fn with_visible_values<V: Into<CellValue>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.values = values.into_iter().map(Into::into).collect();
        self.visibility_is_allowlist = true;
        if !self.values.is_empty() {
            self.sort_order = SortOrder::Manual;
        }
        self
    }

    /// Hides `values`; every other item stays visible.
    /// A non-empty list switches the field to manual sorting.
    pub fn with_hidden_values<V: Into<CellValue>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self = self.with_visible_values(values);
        self.visibility_is_allowlist = self.values.is_empty();
        self
    }

    /// Whether `value` passes this field's visibility filter.
    /// Blanks are always visible.
    pub fn is_visible(&self, value: &CellValue) -> bool {
        if self.values.is_empty() || value.is_empty() {
            return true;
        }
        let listed = self.listed_position(value).is_some();
        if listed {
            self.visibility_is_allowlist
        } else {
            !self.visibility_is_allowlist
        }
    }

    /// Position of `value` in the explicit value list. Values are matched by
    /// their display text so that `"20"` and `20` name the same item.
    pub fn listed_position(&self, value: &CellValue) -> Option<usize> {
        let text = value.display_value();
        self.values
            .iter()
            .position(|v| v == value || v.display_value() == text)
    }
}

impl From<&str> for AxisField {
    fn from(name: &str) -> Self {
        AxisField::new(name)
    }
}

impl From<String> for AxisField {
    fn from(name: String) -> Self {
        AxisField::new(name)
    }
}

/// Ordered list of fields assigned to one axis, outermost first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AxisSpec {
    fields: Vec<AxisField>,
}

impl AxisSpec {
    pub fn new() -> Self {
        AxisSpec::default()
    }

    /// Adds a field. A field with the same name replaces the earlier entry in place.
    pub fn push(&mut self, field: impl Into<AxisField>) {
        let field = field.into();
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn with(mut self, field: impl Into<AxisField>) -> Self {
        self.push(field);
        self
    }

    pub fn fields(&self) -> &[AxisField] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&AxisField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<F: Into<AxisField>> FromIterator<F> for AxisSpec {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        let mut spec = AxisSpec::new();
        for field in iter {
            spec.push(field);
        }
        spec
    }
}

// ============================================================================
// PIVOT DEFINITION
// ============================================================================

/// Everything a host supplies to build one pivot table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotDefinition {
    /// Pivot table name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Caption shown over the value columns.
    #[serde(default = "default_data_caption")]
    pub data_caption: String,

    /// Top-left cell of the rendered pivot table (0-based row, col).
    #[serde(default = "default_anchor")]
    pub anchor: CellCoord,

    #[serde(default)]
    pub rows: AxisSpec,

    #[serde(default)]
    pub columns: AxisSpec,

    #[serde(default)]
    pub values: AxisSpec,
}

fn default_name() -> String {
    "PivotTable1".to_string()
}

fn default_data_caption() -> String {
    "Data".to_string()
}

fn default_anchor() -> CellCoord {
    (1, 1)
}

impl PivotDefinition {
    pub fn new(rows: AxisSpec, columns: AxisSpec, values: AxisSpec) -> Self {
        PivotDefinition {
            name: default_name(),
            data_caption: default_data_caption(),
            anchor: default_anchor(),
            rows,
            columns,
            values,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_data_caption(mut self, caption: impl Into<String>) -> Self {
        self.data_caption = caption.into();
        self
    }

    pub fn with_anchor(mut self, anchor: CellCoord) -> Self {
        self.anchor = anchor;
        self
    }
}

impl Default for PivotDefinition {
    fn default() -> Self {
        PivotDefinition::new(AxisSpec::new(), AxisSpec::new(), AxisSpec::new())
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// An axis whose field names have been checked against the table headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAxis {
    pub axis: Axis,
    pub fields: Vec<AxisField>,
    /// Source column of each field, parallel to `fields`.
    pub indices: Vec<ColumnIndex>,
}

impl ResolvedAxis {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Looks up every field of `spec` in `headers`.
pub fn resolve_axis(headers: &[String], axis: Axis, spec: &AxisSpec) -> Result<ResolvedAxis, PivotError> {
    let mut indices = Vec::with_capacity(spec.len());
    for field in spec.fields() {
        let index = headers
            .iter()
            .position(|h| *h == field.name)
            .ok_or_else(|| PivotError::UnknownField {
                axis,
                name: field.name.clone(),
            })?;
        indices.push(index);
    }
    Ok(ResolvedAxis {
        axis,
        fields: spec.fields().to_vec(),
        indices,
    })
}

/// Fails with `OverlappingFields` when any field appears on more than one axis.
pub fn check_disjoint(axes: &[&ResolvedAxis]) -> Result<(), PivotError> {
    let mut names: Vec<String> = Vec::new();
    for (i, a) in axes.iter().enumerate() {
        for b in &axes[i + 1..] {
            for field in &a.fields {
                if b.fields.iter().any(|f| f.name == field.name) && !names.contains(&field.name) {
                    names.push(field.name.clone());
                }
            }
        }
    }
    if names.is_empty() {
        Ok(())
    } else {
        Err(PivotError::OverlappingFields { names })
    }
}

/// The three axes of a definition after defaulting and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAxes {
    pub rows: ResolvedAxis,
    pub columns: ResolvedAxis,
    pub values: ResolvedAxis,
}

impl ResolvedAxes {
    /// Applies the defaults (rows: first column, values: last column), then
    /// checks that every field exists and that the axes are disjoint.
    pub fn resolve(headers: &[String], definition: &PivotDefinition) -> Result<Self, PivotError> {
        let (first, last) = match (headers.first(), headers.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(PivotError::EmptyRange),
        };

        let rows = if definition.rows.is_empty() {
            AxisSpec::new().with(first.as_str())
        } else {
            definition.rows.clone()
        };
        let values = if definition.values.is_empty() {
            AxisSpec::new().with(last.as_str())
        } else {
            definition.values.clone()
        };

        let rows = resolve_axis(headers, Axis::Row, &rows)?;
        let columns = resolve_axis(headers, Axis::Column, &definition.columns)?;
        let values = resolve_axis(headers, Axis::Value, &values)?;
        check_disjoint(&[&rows, &columns, &values])?;

        Ok(ResolvedAxes { rows, columns, values })
    }
}
