//! FILENAME: core/persistence/src/cache_writer.rs
//! Writers for the pivot cache definition and pivot cache records parts.

use chrono::NaiveDateTime;
use engine::{format_number, CellRange};
use pivot_engine::{reference_id, CacheValue, FieldType, Record, RecordCell, SharedItems, SharedValueIndex};
use serde::{Deserialize, Serialize};

use crate::xml::{self, XmlWriter, MAIN_NS, REL_NS};

// ============================================================================
// OPTIONS
// ============================================================================

/// Document-level attributes written into every cache definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheDefinitionOptions {
    /// Author recorded as the last refresher.
    #[serde(default = "default_refreshed_by")]
    pub refreshed_by: String,

    /// Refresh timestamp. `None` uses the current local time.
    #[serde(default)]
    pub refreshed_date: Option<NaiveDateTime>,
}

fn default_refreshed_by() -> String {
    "Unknown Creator".to_string()
}

impl Default for CacheDefinitionOptions {
    fn default() -> Self {
        CacheDefinitionOptions {
            refreshed_by: default_refreshed_by(),
            refreshed_date: None,
        }
    }
}

impl CacheDefinitionOptions {
    fn refreshed_serial(&self) -> f64 {
        let date = self
            .refreshed_date
            .unwrap_or_else(|| chrono::Local::now().naive_local());
        xml::excel_serial(date)
    }
}

// ============================================================================
// CACHE DEFINITION
// ============================================================================

/// Renders `pivotCacheDefinition{n}.xml` for the shared items of one source range.
pub fn write_cache_definition(
    index: &SharedValueIndex,
    definition_id: u32,
    sheet: &str,
    source: &CellRange,
    options: &CacheDefinitionOptions,
) -> Result<String, quick_xml::Error> {
    let mut writer = xml::document()?;

    let rid = reference_id(definition_id);
    let refreshed_date = format_number(options.refreshed_serial());
    let record_count = index.record_count().to_string();
    xml::start(
        &mut writer,
        "pivotCacheDefinition",
        &[
            ("xmlns", MAIN_NS),
            ("xmlns:r", REL_NS),
            ("r:id", rid.as_str()),
            ("refreshedBy", options.refreshed_by.as_str()),
            ("refreshedDate", refreshed_date.as_str()),
            ("createdVersion", "1"),
            ("refreshedVersion", "1"),
            ("refreshOnLoad", "1"),
            ("recordCount", record_count.as_str()),
        ],
    )?;

    xml::start(&mut writer, "cacheSource", &[("type", "worksheet")])?;
    xml::empty(
        &mut writer,
        "worksheetSource",
        &[("ref", source.to_string().as_str()), ("sheet", sheet)],
    )?;
    xml::end(&mut writer, "cacheSource")?;

    let field_count = index.column_count().to_string();
    xml::start(&mut writer, "cacheFields", &[("count", field_count.as_str())])?;
    for items in index.fields() {
        xml::start(&mut writer, "cacheField", &[("name", items.name.as_str()), ("numFmtId", "0")])?;
        write_shared_items(&mut writer, items)?;
        xml::end(&mut writer, "cacheField")?;
    }
    xml::end(&mut writer, "cacheFields")?;

    xml::end(&mut writer, "pivotCacheDefinition")?;
    Ok(xml::finish(writer))
}

fn write_shared_items(writer: &mut XmlWriter, items: &SharedItems) -> Result<(), quick_xml::Error> {
    let count = items.len().to_string();
    let field_type = items.field_type();

    match field_type {
        FieldType::Numeric { min, max, all_integers } => {
            let min = format_number(min);
            let max = format_number(max);
            xml::start(
                writer,
                "sharedItems",
                &[
                    ("containsSemiMixedTypes", "0"),
                    ("containsString", "0"),
                    ("containsNumber", "1"),
                    ("containsInteger", if all_integers { "1" } else { "0" }),
                    ("minValue", min.as_str()),
                    ("maxValue", max.as_str()),
                    ("count", count.as_str()),
                ],
            )?;
        }
        FieldType::Boolean => {
            xml::start(writer, "sharedItems", &[("count", count.as_str())])?;
        }
        FieldType::Text => {
            if items.contains_blank() {
                xml::start(writer, "sharedItems", &[("containsBlank", "1"), ("count", count.as_str())])?;
            } else {
                xml::start(writer, "sharedItems", &[("count", count.as_str())])?;
            }
        }
    }

    for value in items.values() {
        match (field_type, value) {
            (_, CacheValue::Empty) => xml::empty(writer, "m", &[])?,
            (FieldType::Text, value) => {
                let text = value.to_cell_value().display_value();
                xml::empty(writer, "s", &[("v", text.as_str())])?
            }
            (_, value) => write_typed_value(writer, value)?,
        }
    }

    xml::end(writer, "sharedItems")
}

/// Writes a value as `<n>`, `<s>`, `<b>` or `<m/>` according to its own type.
fn write_typed_value(writer: &mut XmlWriter, value: &CacheValue) -> Result<(), quick_xml::Error> {
    match value {
        CacheValue::Empty => xml::empty(writer, "m", &[]),
        CacheValue::Number(n) => xml::empty(writer, "n", &[("v", format_number(n.0).as_str())]),
        CacheValue::Text(s) => xml::empty(writer, "s", &[("v", s.as_str())]),
        CacheValue::Boolean(b) => xml::empty(writer, "b", &[("v", if *b { "1" } else { "0" })]),
    }
}

// ============================================================================
// CACHE RECORDS
// ============================================================================

/// Renders `pivotCacheRecords{n}.xml`.
pub fn write_cache_records(records: &[Record]) -> Result<String, quick_xml::Error> {
    let mut writer = xml::document()?;

    let count = records.len().to_string();
    xml::start(
        &mut writer,
        "pivotCacheRecords",
        &[("xmlns", MAIN_NS), ("xmlns:r", REL_NS), ("count", count.as_str())],
    )?;

    for record in records {
        xml::start(&mut writer, "r", &[])?;
        for cell in record {
            match cell {
                RecordCell::Indexed(id) => xml::empty(&mut writer, "x", &[("v", id.to_string().as_str())])?,
                RecordCell::Literal(value) => write_typed_value(&mut writer, value)?,
            }
        }
        xml::end(&mut writer, "r")?;
    }

    xml::end(&mut writer, "pivotCacheRecords")?;
    Ok(xml::finish(writer))
}
