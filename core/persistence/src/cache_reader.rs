//! FILENAME: core/persistence/src/cache_reader.rs
//! Reads pivot cache parts back into typed values.
//!
//! The parsers are namespace-insensitive (they match local names) and only
//! look at the elements this workspace writes.

use engine::{CellRange, CellValue};
use pivot_engine::{CacheValue, OrderedFloat, RecordCell};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::PersistenceError;

/// A parsed `pivotCacheDefinition` part.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheDefinitionPart {
    pub reference_id: Option<String>,
    pub refreshed_by: Option<String>,
    pub record_count: Option<usize>,
    pub source_sheet: Option<String>,
    pub source_range: Option<CellRange>,
    pub fields: Vec<CacheFieldPart>,
}

/// One `cacheField` with its shared items.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheFieldPart {
    pub name: String,
    pub items: Vec<CacheValue>,
    pub contains_blank: bool,
}

impl CacheDefinitionPart {
    /// Turns an encoded record back into cell values.
    pub fn resolve_record(&self, record: &[RecordCell]) -> Result<Vec<CellValue>, PersistenceError> {
        record
            .iter()
            .enumerate()
            .map(|(col, cell)| match cell {
                RecordCell::Literal(value) => Ok(value.to_cell_value()),
                RecordCell::Indexed(id) => self
                    .fields
                    .get(col)
                    .and_then(|field| field.items.get(*id as usize))
                    .map(CacheValue::to_cell_value)
                    .ok_or_else(|| {
                        PersistenceError::InvalidFormat(format!(
                            "record index {} is out of range for cache field {}",
                            id, col
                        ))
                    }),
            })
            .collect()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, PersistenceError> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn attr_parsed<T: std::str::FromStr>(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<T>, PersistenceError> {
    match attr(e, key)? {
        Some(v) => v.trim().parse::<T>().map(Some).map_err(|_| {
            PersistenceError::InvalidFormat(format!(
                "attribute {} has an invalid value: {}",
                String::from_utf8_lossy(key),
                v
            ))
        }),
        None => Ok(None),
    }
}

/// Parses a typed item element (`n`, `s`, `b`, `m`). Returns `None` for other elements.
fn typed_value(e: &BytesStart<'_>) -> Result<Option<CacheValue>, PersistenceError> {
    let value = match e.local_name().as_ref() {
        b"m" => CacheValue::Empty,
        b"n" => CacheValue::Number(OrderedFloat(attr_parsed::<f64>(e, b"v")?.unwrap_or(0.0))),
        b"s" => CacheValue::Text(attr(e, b"v")?.unwrap_or_default()),
        b"b" => {
            let v = attr(e, b"v")?.unwrap_or_default();
            CacheValue::Boolean(v == "1" || v.eq_ignore_ascii_case("true"))
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// Parses a `pivotCacheDefinition` part.
pub fn read_cache_definition(xml: &str) -> Result<CacheDefinitionPart, PersistenceError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut part = CacheDefinitionPart {
        reference_id: None,
        refreshed_by: None,
        record_count: None,
        source_sheet: None,
        source_range: None,
        fields: Vec::new(),
    };
    let mut seen_root = false;
    let mut in_shared_items = false;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"pivotCacheDefinition" => {
                seen_root = true;
                part.reference_id = attr(&e, b"id")?;
                part.refreshed_by = attr(&e, b"refreshedBy")?;
                part.record_count = attr_parsed(&e, b"recordCount")?;
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"worksheetSource" => {
                part.source_sheet = attr(&e, b"sheet")?;
                part.source_range = match attr(&e, b"ref")? {
                    Some(r) => Some(r.parse::<CellRange>().map_err(|err| {
                        PersistenceError::InvalidFormat(err.to_string())
                    })?),
                    None => None,
                };
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"cacheField" => {
                part.fields.push(CacheFieldPart {
                    name: attr(&e, b"name")?.unwrap_or_default(),
                    items: Vec::new(),
                    contains_blank: false,
                });
            }
            Event::Start(e) if e.local_name().as_ref() == b"sharedItems" => {
                in_shared_items = true;
                if let Some(field) = part.fields.last_mut() {
                    field.contains_blank = attr(&e, b"containsBlank")?.as_deref() == Some("1");
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"sharedItems" => in_shared_items = false,
            Event::Empty(e) if in_shared_items => {
                if let Some(value) = typed_value(&e)? {
                    if let Some(field) = part.fields.last_mut() {
                        field.items.push(value);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(PersistenceError::InvalidFormat(
            "missing pivotCacheDefinition element".to_string(),
        ));
    }
    log::debug!(
        "read cache definition {:?}: {} fields",
        part.reference_id,
        part.fields.len()
    );
    Ok(part)
}

/// Parses a `pivotCacheRecords` part into encoded records.
pub fn read_cache_records(xml: &str) -> Result<Vec<Vec<RecordCell>>, PersistenceError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut records = Vec::new();
    let mut current: Option<Vec<RecordCell>> = None;
    let mut seen_root = false;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"pivotCacheRecords" => {
                seen_root = true;
            }
            Event::Start(e) if e.local_name().as_ref() == b"r" => current = Some(Vec::new()),
            Event::Empty(e) if e.local_name().as_ref() == b"r" => records.push(Vec::new()),
            Event::End(e) if e.local_name().as_ref() == b"r" => {
                if let Some(record) = current.take() {
                    records.push(record);
                }
            }
            Event::Empty(e) => {
                if let Some(record) = current.as_mut() {
                    if e.local_name().as_ref() == b"x" {
                        let id = attr_parsed::<u32>(&e, b"v")?.unwrap_or(0);
                        record.push(RecordCell::Indexed(id));
                    } else if let Some(value) = typed_value(&e)? {
                        record.push(RecordCell::Literal(value));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(PersistenceError::InvalidFormat(
            "missing pivotCacheRecords element".to_string(),
        ));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<pivotCacheDefinition xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" r:id="rId1" refreshedBy="XBRL Query" refreshedDate="41934.8125" createdVersion="1" refreshedVersion="1" refreshOnLoad="1" recordCount="2">
  <cacheSource type="worksheet">
    <worksheetSource ref="B2:C4" sheet="Data"/>
  </cacheSource>
  <cacheFields count="2">
    <cacheField name="Account" numFmtId="0">
      <sharedItems containsBlank="1" count="2"><s v="Megan"/><m/></sharedItems>
    </cacheField>
    <cacheField name="Images" numFmtId="0">
      <sharedItems containsSemiMixedTypes="0" containsString="0" containsNumber="1" containsInteger="1" minValue="20" maxValue="31" count="2"><n v="20"/><n v="31"/></sharedItems>
    </cacheField>
  </cacheFields>
</pivotCacheDefinition>"#;

    const RECORDS: &str = r#"<pivotCacheRecords count="2"><r><x v="0"/><x/></r><r><m/><n v="31"/></r></pivotCacheRecords>"#;

    #[test]
    fn test_read_definition() {
        let part = read_cache_definition(DEFINITION).unwrap();
        assert_eq!(part.reference_id.as_deref(), Some("rId1"));
        assert_eq!(part.refreshed_by.as_deref(), Some("XBRL Query"));
        assert_eq!(part.record_count, Some(2));
        assert_eq!(part.source_sheet.as_deref(), Some("Data"));
        assert_eq!(part.source_range.map(|r| r.to_string()), Some("B2:C4".to_string()));
        assert_eq!(part.field_names(), vec!["Account", "Images"]);
        assert!(part.fields[0].contains_blank);
        assert_eq!(part.fields[0].items, vec![CacheValue::Text("Megan".into()), CacheValue::Empty]);
        assert_eq!(part.fields[1].items[1], CacheValue::Number(OrderedFloat(31.0)));
    }

    #[test]
    fn test_read_and_resolve_records() {
        let part = read_cache_definition(DEFINITION).unwrap();
        let records = read_cache_records(RECORDS).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], vec![RecordCell::Indexed(0), RecordCell::Indexed(0)]);
        assert_eq!(records[1][1], RecordCell::Literal(CacheValue::Number(OrderedFloat(31.0))));

        let row = part.resolve_record(&records[0]).unwrap();
        assert_eq!(row, vec![CellValue::from("Megan"), CellValue::Number(20.0)]);

        let bad = part.resolve_record(&[RecordCell::Indexed(5)]);
        assert!(matches!(bad, Err(PersistenceError::InvalidFormat(_))));
    }

    #[test]
    fn test_wrong_part() {
        assert!(matches!(
            read_cache_records(DEFINITION),
            Err(PersistenceError::InvalidFormat(_))
        ));
    }
}
