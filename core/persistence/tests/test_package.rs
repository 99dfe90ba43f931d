//! FILENAME: tests/test_package.rs
//! Integration tests for the pivot part registry and the cache reader.

mod common;

use std::fs;
use std::sync::Arc;

use common::{fixed_options, sales_grid, sales_table, spec, TOTAL_REVENUE};
use engine::{CellRange, CellValue};
use persistence::{
    read_cache_definition, read_cache_records, CacheDefinitionOptions, PersistenceError, PivotPackage,
};
use pivot_engine::{AxisSpec, CacheIdAllocator, PivotDefinition, PivotError};

fn by_region() -> PivotDefinition {
    PivotDefinition::new(spec(&["Region"]), AxisSpec::new(), spec(&["Revenue"])).with_name("RevenueByRegion")
}

fn source() -> CellRange {
    "A1:D6".parse().unwrap()
}

#[test]
fn test_write_to_dir_creates_part_tree() {
    let mut package = PivotPackage::with_options(fixed_options());
    package
        .add_pivot_table(&sales_table(), &by_region(), "Sales", &source(), "Summary")
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = package.write_to_dir(dir.path()).unwrap();
    assert_eq!(written.len(), 3);

    for relative in [
        "xl/pivotCache/pivotCacheDefinition1.xml",
        "xl/pivotCache/pivotCacheRecords1.xml",
        "xl/pivotTables/pivotTable1.xml",
    ] {
        let path = dir.path().join(relative);
        assert!(path.exists(), "missing {}", relative);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
        assert_eq!(content, package.part_xml(relative).unwrap());
    }
}

#[test]
fn test_cache_parts_read_back_to_source_rows() {
    let table = sales_table();
    let mut package = PivotPackage::with_options(fixed_options());
    package
        .add_pivot_table(&table, &by_region(), "Sales", &source(), "Summary")
        .unwrap();

    let definition = read_cache_definition(package.part_xml("xl/pivotCache/pivotCacheDefinition1.xml").unwrap()).unwrap();
    assert_eq!(definition.reference_id.as_deref(), Some("rId1"));
    assert_eq!(definition.refreshed_by.as_deref(), Some("Test Suite"));
    assert_eq!(definition.record_count, Some(5));
    assert_eq!(definition.source_sheet.as_deref(), Some("Sales"));
    assert_eq!(definition.source_range, Some(source()));
    assert_eq!(definition.field_names(), vec!["Region", "Product", "Units", "Revenue"]);
    assert_eq!(definition.fields[0].items.len(), 3);

    let records = read_cache_records(package.part_xml("xl/pivotCache/pivotCacheRecords1.xml").unwrap()).unwrap();
    assert_eq!(records.len(), table.row_count());
    for (record, row) in records.iter().zip(table.rows()) {
        assert_eq!(&definition.resolve_record(record).unwrap(), row);
    }

    let revenue: f64 = records
        .iter()
        .map(|r| definition.resolve_record(r).unwrap()[3].as_number())
        .sum();
    assert!((revenue - TOTAL_REVENUE).abs() < 1e-9);
}

#[test]
fn test_pivot_table_part_content() {
    let mut package = PivotPackage::with_options(fixed_options());
    let entry = package
        .add_pivot_table(&sales_table(), &by_region(), "Sales", &source(), "Summary")
        .unwrap()
        .clone();
    assert_eq!(entry.location.to_string(), "B2:C7");
    assert_eq!(entry.stats.records, 5);
    assert_eq!(entry.stats.data_fields, 1);

    let xml = package.part_xml("xl/pivotTables/pivotTable1.xml").unwrap();
    assert!(xml.contains(r#"name="RevenueByRegion" cacheId="1""#));
    assert!(xml.contains(r#"<location ref="B2:C7" firstHeaderRow="1" firstDataRow="2" firstDataCol="1"/>"#));
    // East, North, South in display order; shared order is North, South, East.
    assert!(xml.contains(r#"<item x="2"/><item x="0"/><item x="1"/><item t="default"/>"#));
    assert!(xml.contains(r#"<dataField name="Sum of Revenue" fld="3" baseField="0" baseItem="0"/>"#));
}

#[test]
fn test_two_tables_get_distinct_ids() {
    let mut package = PivotPackage::with_options(fixed_options());
    let table = sales_table();
    package
        .add_pivot_table(&table, &by_region(), "Sales", &source(), "Summary")
        .unwrap();
    let by_product = PivotDefinition::new(spec(&["Product"]), AxisSpec::new(), spec(&["Units"])).with_name("UnitsByProduct");
    let second = package
        .add_pivot_table(&table, &by_product, "Sales", &source(), "Summary")
        .unwrap()
        .clone();

    assert_eq!(second.definition_id, 2);
    assert_eq!(second.cache_id, 2);
    assert_eq!(package.cache_ids(), vec![1, 2]);
    assert_eq!(package.cache_reference(2), Some("rId2"));
    assert_eq!(package.parts().len(), 6);
    assert_eq!(package.tables().len(), 2);

    let xml = package.part_xml("xl/pivotTables/pivotTable2.xml").unwrap();
    assert!(xml.contains(r#"name="UnitsByProduct" cacheId="2""#));

    let caches = package.pivot_caches_xml().unwrap();
    assert!(caches.contains(r#"<pivotCache cacheId="1" r:id="rId1"/><pivotCache cacheId="2" r:id="rId2"/>"#));
}

#[test]
fn test_shared_allocator_across_packages() {
    let ids = Arc::new(CacheIdAllocator::starting_after(0, 7));
    let mut first = PivotPackage::with_allocator(Arc::clone(&ids), fixed_options());
    let mut second = PivotPackage::with_allocator(Arc::clone(&ids), fixed_options());

    let a = first
        .add_pivot_table(&sales_table(), &by_region(), "Sales", &source(), "Summary")
        .unwrap()
        .cache_id;
    let b = second
        .add_pivot_table(&sales_table(), &by_region(), "Sales", &source(), "Summary")
        .unwrap()
        .cache_id;

    assert_eq!((a, b), (8, 9));
    assert_eq!(ids.last_definition_id(), 2);
    assert!(second.part("xl/pivotTables/pivotTable2.xml").is_some());
}

#[test]
fn test_add_from_grid() {
    let (grid, range) = sales_grid();
    assert_eq!(range.to_string(), "A1:D6");

    let mut package = PivotPackage::with_options(fixed_options());
    package
        .add_pivot_table_from_grid(&grid, &range, &by_region(), "Sales", "Summary")
        .unwrap();

    let xml = package.part_xml("xl/pivotCache/pivotCacheDefinition1.xml").unwrap();
    assert!(xml.contains(r#"<worksheetSource ref="A1:D6" sheet="Sales"/>"#));

    let header_only: CellRange = "A1:D1".parse().unwrap();
    let result = package.add_pivot_table_from_grid(&grid, &header_only, &by_region(), "Sales", "Summary");
    assert!(matches!(result, Err(PersistenceError::Pivot(PivotError::EmptyRange))));
    assert_eq!(package.tables().len(), 1);
}

#[test]
fn test_options_from_json() {
    let options: CacheDefinitionOptions =
        serde_json::from_str(r#"{"refreshed_by": "XBRL Query", "refreshed_date": "2014-10-22T19:30:00"}"#).unwrap();
    let mut package = PivotPackage::with_options(options);
    package
        .add_pivot_table(&sales_table(), &by_region(), "Sales", &source(), "Summary")
        .unwrap();

    let xml = package.part_xml("xl/pivotCache/pivotCacheDefinition1.xml").unwrap();
    assert!(xml.contains(r#"refreshedBy="XBRL Query" refreshedDate="41934.8125""#));

    let defaults: CacheDefinitionOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(defaults, CacheDefinitionOptions::default());
}

#[test]
fn test_blank_cells_survive_round_trip() {
    let table = engine::Table::new(
        vec!["Region".into(), "Revenue".into()],
        vec![
            vec!["North".into(), 10.into()],
            vec![CellValue::Empty, 5.into()],
        ],
    )
    .unwrap();
    let definition = PivotDefinition::new(spec(&["Region"]), AxisSpec::new(), spec(&["Revenue"]));
    let mut package = PivotPackage::with_options(fixed_options());
    package
        .add_pivot_table(&table, &definition, "Sales", &"A1:B3".parse().unwrap(), "Summary")
        .unwrap();

    let cache = read_cache_definition(package.part_xml("xl/pivotCache/pivotCacheDefinition1.xml").unwrap()).unwrap();
    assert!(cache.fields[0].contains_blank);
    let records = read_cache_records(package.part_xml("xl/pivotCache/pivotCacheRecords1.xml").unwrap()).unwrap();
    assert_eq!(cache.resolve_record(&records[1]).unwrap()[0], CellValue::Empty);
}
