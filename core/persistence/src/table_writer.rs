//! FILENAME: core/persistence/src/table_writer.rs
//! Writer for the pivot table definition part (`pivotTable{n}.xml`).
//!
//! Pure translation of a [`PivotLayout`]; every decision about ordering,
//! visibility and placement has already been made by the layout builder.

use pivot_engine::{Axis, AxisFieldRef, AxisLayout, AxisPosition, PivotFieldLayout, PivotLayout, PositionKind};

use crate::xml::{self, XmlWriter, MAIN_NS};

/// Field index that stands for the data fields on an axis.
const VALUES_FIELD: &str = "-2";

/// Renders the pivot table definition for `layout`, bound to cache `cache_id`.
pub fn write_pivot_table(layout: &PivotLayout, cache_id: u32) -> Result<String, quick_xml::Error> {
    let mut writer = xml::document()?;

    let cache_id = cache_id.to_string();
    xml::start(
        &mut writer,
        "pivotTableDefinition",
        &[
            ("xmlns", MAIN_NS),
            ("name", layout.name.as_str()),
            ("cacheId", cache_id.as_str()),
            ("applyNumberFormats", "0"),
            ("applyBorderFormats", "0"),
            ("applyFontFormats", "0"),
            ("applyPatternFormats", "0"),
            ("applyAlignmentFormats", "0"),
            ("applyWidthHeightFormats", "1"),
            ("dataCaption", layout.data_caption.as_str()),
            ("showMultipleLabel", "0"),
            ("showMemberPropertyTips", "0"),
            ("useAutoFormatting", "1"),
            ("indent", "127"),
            ("compact", "0"),
            ("compactData", "0"),
            ("gridDropZones", "1"),
        ],
    )?;

    write_location(&mut writer, layout)?;
    write_pivot_fields(&mut writer, layout)?;

    write_axis_fields(&mut writer, "rowFields", &layout.rows)?;
    write_axis_items(&mut writer, "rowItems", &layout.rows)?;

    if !layout.columns.fields.is_empty() {
        write_axis_fields(&mut writer, "colFields", &layout.columns)?;
    }
    write_col_items(&mut writer, &layout.columns)?;

    write_data_fields(&mut writer, layout)?;

    xml::empty(
        &mut writer,
        "pivotTableStyleInfo",
        &[
            ("showRowHeaders", "1"),
            ("showColHeaders", "1"),
            ("showRowStripes", "0"),
            ("showColStripes", "0"),
            ("showLastColumn", "1"),
        ],
    )?;

    xml::end(&mut writer, "pivotTableDefinition")?;
    Ok(xml::finish(writer))
}

fn write_location(writer: &mut XmlWriter, layout: &PivotLayout) -> Result<(), quick_xml::Error> {
    let location = &layout.location;
    let range = location.range.to_string();
    let header = location.first_header_row.to_string();
    let data_row = location.first_data_row.to_string();
    let data_col = location.first_data_col.to_string();
    xml::empty(
        writer,
        "location",
        &[
            ("ref", range.as_str()),
            ("firstHeaderRow", header.as_str()),
            ("firstDataRow", data_row.as_str()),
            ("firstDataCol", data_col.as_str()),
        ],
    )
}

// ============================================================================
// PIVOT FIELDS
// ============================================================================

fn write_pivot_fields(writer: &mut XmlWriter, layout: &PivotLayout) -> Result<(), quick_xml::Error> {
    let count = layout.fields.len().to_string();
    xml::start(writer, "pivotFields", &[("count", count.as_str())])?;
    for field in &layout.fields {
        write_pivot_field(writer, field)?;
    }
    xml::end(writer, "pivotFields")
}

fn write_pivot_field(writer: &mut XmlWriter, field: &PivotFieldLayout) -> Result<(), quick_xml::Error> {
    let mut attrs = vec![
        ("compact", "0"),
        ("outline", "0"),
        ("subtotalTop", "0"),
        ("showAll", "0"),
        ("includeNewItemsInFilter", "1"),
    ];

    let axis = match field.axis {
        Some(Axis::Row) => Some("axisRow"),
        Some(Axis::Column) => Some("axisCol"),
        _ => None,
    };

    let axis = match axis {
        Some(axis) => axis,
        None => {
            if field.data_field {
                attrs.push(("dataField", "1"));
            }
            return xml::empty(writer, "pivotField", &attrs);
        }
    };

    attrs.push(("axis", axis));
    attrs.push(("sortType", field.sort_order.as_str()));
    xml::start(writer, "pivotField", &attrs)?;

    let count = (field.items.len() + 1).to_string();
    xml::start(writer, "items", &[("count", count.as_str())])?;
    for item in &field.items {
        let x = item.shared_index.to_string();
        if item.hidden {
            xml::empty(writer, "item", &[("x", x.as_str()), ("h", "1")])?;
        } else {
            xml::empty(writer, "item", &[("x", x.as_str())])?;
        }
    }
    xml::empty(writer, "item", &[("t", "default")])?;
    xml::end(writer, "items")?;

    xml::end(writer, "pivotField")
}

// ============================================================================
// AXIS FIELDS AND ITEMS
// ============================================================================

fn write_axis_fields(writer: &mut XmlWriter, name: &str, axis: &AxisLayout) -> Result<(), quick_xml::Error> {
    let count = axis.fields.len().to_string();
    xml::start(writer, name, &[("count", count.as_str())])?;
    for field in &axis.fields {
        let x = match field {
            AxisFieldRef::Source(index) => index.to_string(),
            AxisFieldRef::Values => VALUES_FIELD.to_string(),
        };
        xml::empty(writer, "field", &[("x", x.as_str())])?;
    }
    xml::end(writer, name)
}

fn write_col_items(writer: &mut XmlWriter, axis: &AxisLayout) -> Result<(), quick_xml::Error> {
    if axis.fields.is_empty() {
        // A single column holding the grand total of the one data field.
        xml::start(writer, "colItems", &[("count", "1")])?;
        xml::start(writer, "i", &[])?;
        xml::empty(writer, "x", &[])?;
        xml::end(writer, "i")?;
        return xml::end(writer, "colItems");
    }
    write_axis_items(writer, "colItems", axis)
}

fn write_axis_items(writer: &mut XmlWriter, name: &str, axis: &AxisLayout) -> Result<(), quick_xml::Error> {
    let count = axis.visible_count().to_string();
    xml::start(writer, name, &[("count", count.as_str())])?;
    let values_nested = axis.has_values_field();
    for position in axis.visible_positions() {
        write_item(writer, position, values_nested)?;
    }
    xml::end(writer, name)
}

/// One `<i>` element: the position type, then an `<x>` per member.
/// `v` holds the member's index in its field's item list and is omitted when 0.
fn write_item(writer: &mut XmlWriter, position: &AxisPosition, values_nested: bool) -> Result<(), quick_xml::Error> {
    let data_index = position.data_field.filter(|_| values_nested).unwrap_or(0);
    let data_attr = data_index.to_string();

    let mut attrs: Vec<(&str, &str)> = Vec::new();
    match position.kind {
        PositionKind::Leaf => {}
        PositionKind::Subtotal => attrs.push(("t", "default")),
        PositionKind::GrandTotal => attrs.push(("t", "grand")),
    }
    if data_index > 0 {
        attrs.push(("i", data_attr.as_str()));
    }
    xml::start(writer, "i", &attrs)?;

    match position.kind {
        PositionKind::GrandTotal => write_x(writer, data_index)?,
        PositionKind::Subtotal => {
            for &item in &position.item_indices {
                write_x(writer, item as usize)?;
            }
        }
        PositionKind::Leaf => {
            for &item in &position.item_indices {
                write_x(writer, item as usize)?;
            }
            if values_nested {
                write_x(writer, data_index)?;
            }
        }
    }

    xml::end(writer, "i")
}

fn write_x(writer: &mut XmlWriter, v: usize) -> Result<(), quick_xml::Error> {
    if v == 0 {
        xml::empty(writer, "x", &[])
    } else {
        let v = v.to_string();
        xml::empty(writer, "x", &[("v", v.as_str())])
    }
}

// ============================================================================
// DATA FIELDS
// ============================================================================

fn write_data_fields(writer: &mut XmlWriter, layout: &PivotLayout) -> Result<(), quick_xml::Error> {
    let count = layout.data_fields.len().to_string();
    xml::start(writer, "dataFields", &[("count", count.as_str())])?;
    for field in &layout.data_fields {
        let fld = field.source_index.to_string();
        xml::empty(
            writer,
            "dataField",
            &[
                ("name", field.name.as_str()),
                ("fld", fld.as_str()),
                ("baseField", "0"),
                ("baseItem", "0"),
            ],
        )?;
    }
    xml::end(writer, "dataFields")
}
