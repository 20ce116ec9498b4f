//! Catalog loading
//!
//! Turns a tabular source into the ordered, deduplicated record list that
//! the index encodes. The CSV store is the production source; anything that
//! implements [`CatalogStore`] can stand in for it.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use crate::error::{IndexError, Result};

/// Column layout of a catalog source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSchema {
    /// Column holding the item name (default: `Nama`)
    pub name_column: String,
    /// Column holding the item description (default: `DeskripsiObat`)
    pub description_column: String,
    /// Joins name and description into the embedded text (default: `" - "`)
    pub separator: String,
}

impl Default for CatalogSchema {
    fn default() -> Self {
        Self {
            name_column: "Nama".to_string(),
            description_column: "DeskripsiObat".to_string(),
            separator: " - ".to_string(),
        }
    }
}

impl CatalogSchema {
    fn required_columns(&self) -> [&str; 2] {
        [&self.name_column, &self.description_column]
    }
}

/// A single catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRecord {
    pub name: String,
    pub description: String,
    /// `name + separator + description`, unique within a catalog
    pub combined_text: String,
}

impl CatalogRecord {
    pub fn new(name: impl Into<String>, description: impl Into<String>, separator: &str) -> Self {
        let name = name.into();
        let description = description.into();
        let combined_text = format!("{name}{separator}{description}");
        Self {
            name,
            description,
            combined_text,
        }
    }
}

/// Loaded catalog: source field names plus deduplicated records in source order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    fields: Vec<String>,
    records: Vec<CatalogRecord>,
}

impl Catalog {
    /// Build a catalog from raw `(name, description)` rows
    ///
    /// Rows whose combined text was already seen are dropped; the first
    /// occurrence keeps its position.
    pub fn from_rows<I, N, D>(fields: Vec<String>, rows: I, separator: &str) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut duplicates = 0usize;

        for (name, description) in rows {
            let record = CatalogRecord::new(name, description, separator);
            if seen.insert(record.combined_text.clone()) {
                records.push(record);
            } else {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            log::debug!("Dropped {} duplicate catalog rows", duplicates);
        }

        Self { fields, records }
    }

    /// Field (column) names of the source
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Split into field names and records
    pub fn into_parts(self) -> (Vec<String>, Vec<CatalogRecord>) {
        (self.fields, self.records)
    }
}

/// Source of catalog rows
///
/// Implementations are blocking; the builder calls them from a blocking
/// worker thread.
pub trait CatalogStore: Send + Sync {
    /// Load the catalog at `location`, validating that the schema's
    /// required columns are present
    fn load(&self, location: &Path, schema: &CatalogSchema) -> Result<Catalog>;
}

/// Headered CSV catalog
#[derive(Debug, Clone, Default)]
pub struct CsvCatalogStore;

impl CsvCatalogStore {
    pub fn new() -> Self {
        Self
    }
}

impl CatalogStore for CsvCatalogStore {
    fn load(&self, location: &Path, schema: &CatalogSchema) -> Result<Catalog> {
        if !location.exists() {
            return Err(IndexError::CatalogNotFound(location.to_path_buf()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(location)?;

        let fields: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let missing: Vec<String> = schema
            .required_columns()
            .iter()
            .filter(|column| !fields.iter().any(|field| field == *column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(IndexError::MissingColumns {
                missing,
                available: fields,
            });
        }

        let position = |column: &str| fields.iter().position(|field| field == column);
        let (Some(name_idx), Some(description_idx)) = (
            position(&schema.name_column),
            position(&schema.description_column),
        ) else {
            return Err(IndexError::invalid_index("required column index lookup failed"));
        };

        let mut rows = Vec::new();
        let mut total = 0usize;
        for row in reader.records() {
            let row = row?;
            total += 1;
            let name = row.get(name_idx).unwrap_or_default().to_string();
            let description = row.get(description_idx).unwrap_or_default().to_string();
            rows.push((name, description));
        }

        log::info!(
            "CSV loaded from {} ({} rows, {} columns)",
            location.display(),
            total,
            fields.len()
        );

        let catalog = Catalog::from_rows(fields, rows, &schema.separator);
        log::info!("Catalog processed: {} unique records", catalog.len());
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_combined_text_uses_separator() {
        let record = CatalogRecord::new("Paracetamol", "Pereda demam", " - ");
        assert_eq!(record.combined_text, "Paracetamol - Pereda demam");
    }

    #[test]
    fn test_from_rows_dedup_keeps_first_occurrence() {
        let catalog = Catalog::from_rows(
            vec!["Nama".into(), "DeskripsiObat".into()],
            vec![("A", "x"), ("B", "y"), ("A", "x"), ("C", "z"), ("B", "y")],
            " - ",
        );
        let names: Vec<&str> = catalog.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_from_rows_same_name_different_description_kept() {
        let catalog = Catalog::from_rows(vec![], vec![("A", "x"), ("A", "y")], " - ");
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_csv_store_loads_and_dedups() {
        let file = write_csv(
            "id,Nama,DeskripsiObat\n\
             1,Paracetamol,Pereda demam\n\
             2,Amoxicillin,Antibiotik\n\
             3,Paracetamol,Pereda demam\n",
        );
        let catalog = CsvCatalogStore::new()
            .load(file.path(), &CatalogSchema::default())
            .unwrap();

        assert_eq!(catalog.fields(), &["id", "Nama", "DeskripsiObat"]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[0].name, "Paracetamol");
        assert_eq!(catalog.records()[1].description, "Antibiotik");
    }

    #[test]
    fn test_csv_store_quoted_fields() {
        let file = write_csv(
            "Nama,DeskripsiObat\n\"Obat, Batuk\",\"Meredakan \"\"batuk\"\" kering\"\n",
        );
        let catalog = CsvCatalogStore::new()
            .load(file.path(), &CatalogSchema::default())
            .unwrap();
        assert_eq!(catalog.records()[0].name, "Obat, Batuk");
        assert_eq!(catalog.records()[0].description, "Meredakan \"batuk\" kering");
    }

    #[test]
    fn test_csv_store_missing_columns() {
        let file = write_csv("Nama,Harga\nParacetamol,1000\n");
        let err = CsvCatalogStore::new()
            .load(file.path(), &CatalogSchema::default())
            .unwrap_err();

        match err {
            IndexError::MissingColumns { missing, available } => {
                assert_eq!(missing, vec!["DeskripsiObat".to_string()]);
                assert_eq!(available, vec!["Nama".to_string(), "Harga".to_string()]);
            }
            other => panic!("Expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_csv_store_missing_file() {
        let err = CsvCatalogStore::new()
            .load(Path::new("/nonexistent/catalog.csv"), &CatalogSchema::default())
            .unwrap_err();
        assert!(matches!(err, IndexError::CatalogNotFound(_)));
    }

    #[test]
    fn test_csv_store_custom_schema() {
        let file = write_csv("title,body\nWidget,Small part\n");
        let schema = CatalogSchema {
            name_column: "title".into(),
            description_column: "body".into(),
            separator: ": ".into(),
        };
        let catalog = CsvCatalogStore::new().load(file.path(), &schema).unwrap();
        assert_eq!(catalog.records()[0].combined_text, "Widget: Small part");
    }
}
