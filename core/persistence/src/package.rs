//! FILENAME: core/persistence/src/package.rs
//! Pivot part registry for one document.
//!
//! `PivotPackage` assigns ids, renders the cache definition, cache records and
//! pivot table parts for every registered pivot table, and keeps the
//! cacheId -> rId index the workbook part needs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine::{CellRange, Grid, Table};
use pivot_engine::{calculate_pivot, reference_id, table_from_range, CacheIdAllocator, PivotDefinition, PivotStats};
use serde::Serialize;

use crate::cache_writer::{write_cache_definition, write_cache_records, CacheDefinitionOptions};
use crate::error::PersistenceError;
use crate::table_writer::write_pivot_table;
use crate::xml::{self, REL_NS};

// ============================================================================
// PARTS
// ============================================================================

/// One rendered XML part and its path inside the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePart {
    pub path: String,
    pub xml: String,
}

pub fn cache_definition_path(definition_id: u32) -> String {
    format!("xl/pivotCache/pivotCacheDefinition{}.xml", definition_id)
}

pub fn cache_records_path(definition_id: u32) -> String {
    format!("xl/pivotCache/pivotCacheRecords{}.xml", definition_id)
}

pub fn pivot_table_path(definition_id: u32) -> String {
    format!("xl/pivotTables/pivotTable{}.xml", definition_id)
}

/// What was registered for one pivot table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTableEntry {
    pub name: String,
    pub definition_id: u32,
    pub cache_id: u32,
    pub reference_id: String,
    pub source_sheet: String,
    pub source_range: CellRange,
    pub target_sheet: String,
    pub location: CellRange,
    pub stats: PivotStats,
}

// ============================================================================
// PACKAGE
// ============================================================================

#[derive(Debug)]
pub struct PivotPackage {
    ids: Arc<CacheIdAllocator>,
    options: CacheDefinitionOptions,
    parts: Vec<PackagePart>,
    tables: Vec<PivotTableEntry>,
    /// cacheId -> rId
    cache_index: BTreeMap<u32, String>,
}

impl PivotPackage {
    pub fn new() -> Self {
        Self::with_allocator(Arc::new(CacheIdAllocator::new()), CacheDefinitionOptions::default())
    }

    pub fn with_options(options: CacheDefinitionOptions) -> Self {
        Self::with_allocator(Arc::new(CacheIdAllocator::new()), options)
    }

    /// A package numbering its parts from a shared allocator.
    pub fn with_allocator(ids: Arc<CacheIdAllocator>, options: CacheDefinitionOptions) -> Self {
        PivotPackage {
            ids,
            options,
            parts: Vec::new(),
            tables: Vec::new(),
            cache_index: BTreeMap::new(),
        }
    }

    pub fn allocator(&self) -> &Arc<CacheIdAllocator> {
        &self.ids
    }

    pub fn options(&self) -> &CacheDefinitionOptions {
        &self.options
    }

    /// Calculates a pivot over `table` and registers its three parts.
    ///
    /// `source_range` is where the table sits on `source_sheet`, header row
    /// included. Nothing is registered when the calculation fails.
    pub fn add_pivot_table(
        &mut self,
        table: &Table,
        definition: &PivotDefinition,
        source_sheet: &str,
        source_range: &CellRange,
        target_sheet: &str,
    ) -> Result<&PivotTableEntry, PersistenceError> {
        let model = calculate_pivot(table, definition)?;

        let definition_id = self.ids.next_definition_id();
        let cache_id = self.ids.next_cache_id();

        let definition_xml =
            write_cache_definition(&model.index, definition_id, source_sheet, source_range, &self.options)?;
        let records_xml = write_cache_records(&model.records)?;
        let table_xml = write_pivot_table(&model.layout, cache_id)?;

        self.parts.push(PackagePart {
            path: cache_definition_path(definition_id),
            xml: definition_xml,
        });
        self.parts.push(PackagePart {
            path: cache_records_path(definition_id),
            xml: records_xml,
        });
        self.parts.push(PackagePart {
            path: pivot_table_path(definition_id),
            xml: table_xml,
        });

        let rid = reference_id(definition_id);
        self.cache_index.insert(cache_id, rid.clone());

        let entry = PivotTableEntry {
            name: model.layout.name.clone(),
            definition_id,
            cache_id,
            reference_id: rid,
            source_sheet: source_sheet.to_string(),
            source_range: *source_range,
            target_sheet: target_sheet.to_string(),
            location: model.layout.location.range,
            stats: PivotStats::from(&model),
        };
        log::info!(
            "Registered pivot table '{}' on '{}' at {} (cacheId {}, {})",
            entry.name,
            entry.target_sheet,
            entry.location,
            entry.cache_id,
            entry.reference_id
        );

        self.tables.push(entry);
        let last = self.tables.len() - 1;
        Ok(&self.tables[last])
    }

    /// Reads the source table out of `grid` and registers a pivot over it.
    pub fn add_pivot_table_from_grid(
        &mut self,
        grid: &Grid,
        source_range: &CellRange,
        definition: &PivotDefinition,
        source_sheet: &str,
        target_sheet: &str,
    ) -> Result<&PivotTableEntry, PersistenceError> {
        let table = table_from_range(grid, source_range)?;
        self.add_pivot_table(&table, definition, source_sheet, source_range, target_sheet)
    }

    /// The reference id a pivot table with `cache_id` resolves its cache through.
    pub fn cache_reference(&self, cache_id: u32) -> Option<&str> {
        self.cache_index.get(&cache_id).map(String::as_str)
    }

    pub fn cache_ids(&self) -> Vec<u32> {
        self.cache_index.keys().copied().collect()
    }

    pub fn tables(&self) -> &[PivotTableEntry] {
        &self.tables
    }

    pub fn parts(&self) -> &[PackagePart] {
        &self.parts
    }

    pub fn part(&self, path: &str) -> Option<&PackagePart> {
        self.parts.iter().find(|p| p.path == path)
    }

    pub fn part_xml(&self, path: &str) -> Result<&str, PersistenceError> {
        self.part(path)
            .map(|p| p.xml.as_str())
            .ok_or_else(|| PersistenceError::MissingPart(path.to_string()))
    }

    /// The `<pivotCaches>` element for the workbook part. Empty when nothing
    /// is registered.
    pub fn pivot_caches_xml(&self) -> Result<String, PersistenceError> {
        if self.cache_index.is_empty() {
            return Ok(String::new());
        }

        let mut writer = xml::fragment();
        xml::start(&mut writer, "pivotCaches", &[("xmlns:r", REL_NS)])?;
        for (cache_id, rid) in &self.cache_index {
            let cache_id = cache_id.to_string();
            xml::empty(
                &mut writer,
                "pivotCache",
                &[("cacheId", cache_id.as_str()), ("r:id", rid.as_str())],
            )?;
        }
        xml::end(&mut writer, "pivotCaches")?;
        Ok(xml::finish(writer))
    }

    /// Writes every part beneath `dir`, creating directories as needed.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, PersistenceError> {
        let mut written = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            let path = dir.join(&part.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, part.xml.as_bytes())?;
            written.push(path);
        }
        log::debug!("Wrote {} pivot parts to {}", written.len(), dir.display());
        Ok(written)
    }
}

impl Default for PivotPackage {
    fn default() -> Self {
        Self::new()
    }
}
