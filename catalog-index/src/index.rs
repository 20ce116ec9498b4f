//! Immutable catalog index
//!
//! Records paired 1:1 with their vectors. An index is validated on
//! construction and never mutated afterwards; a rebuild produces a new one.

use std::path::PathBuf;

use serde::Serialize;

use crate::catalog::CatalogRecord;
use crate::embedding::{cosine_similarity, norm, Vector, VectorEngine};
use crate::error::{IndexError, Result};

/// Records and their embeddings, aligned by position
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    fields: Vec<String>,
    records: Vec<CatalogRecord>,
    vectors: Vec<Vector>,
    norms: Vec<f64>,
    dimension: usize,
}

impl CatalogIndex {
    /// Pair `records` with `vectors`
    ///
    /// Fails when the counts differ or the vectors are not all the same length.
    pub fn new(
        fields: Vec<String>,
        records: Vec<CatalogRecord>,
        vectors: Vec<Vector>,
    ) -> Result<Self> {
        if records.len() != vectors.len() {
            return Err(IndexError::invalid_index(format!(
                "{} records but {} vectors",
                records.len(),
                vectors.len()
            )));
        }

        let dimension = vectors.first().map_or(0, Vec::len);
        if let Some(pos) = vectors.iter().position(|v| v.len() != dimension) {
            return Err(IndexError::invalid_index(format!(
                "vector {} has length {}, expected {}",
                pos,
                vectors[pos].len(),
                dimension
            )));
        }

        let norms = vectors.iter().map(|v| norm(v)).collect();

        Ok(Self {
            fields,
            records,
            vectors,
            norms,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Vector length shared by every entry (0 for an empty index)
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn record(&self, position: usize) -> Option<&CatalogRecord> {
        self.records.get(position)
    }

    /// Cosine similarity of `query` against every entry, in index order
    ///
    /// Each score is computed independently; NaN and negative zero are
    /// normalised to 0 so ranking sees a total order.
    pub fn similarities(&self, query: &[f32]) -> Result<Vec<f64>> {
        if self.is_empty() {
            return Ok(vec![]);
        }
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let query_norm = norm(query);
        Ok(self
            .vectors
            .iter()
            .zip(self.norms.iter())
            .map(|(vector, vector_norm)| cosine_similarity(query, vector, query_norm, *vector_norm))
            .collect())
    }
}

/// Index published for queries: the catalog index plus the engine that
/// encodes queries into the same vector space
pub struct PublishedIndex {
    index: CatalogIndex,
    engine: VectorEngine,
    model_id: String,
    source: PathBuf,
}

impl PublishedIndex {
    pub fn new(
        index: CatalogIndex,
        engine: VectorEngine,
        model_id: impl Into<String>,
        source: impl Into<PathBuf>,
    ) -> Self {
        Self {
            index,
            engine,
            model_id: model_id.into(),
            source: source.into(),
        }
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn engine(&self) -> &VectorEngine {
        &self.engine
    }

    /// Diagnostic summary
    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            total_records: self.index.len(),
            field_names: self.index.fields().to_vec(),
            vector_dimensionality: self.index.dimension(),
            model_identifier: self.model_id.clone(),
            source_location: self.source.display().to_string(),
        }
    }
}

/// Read-only index diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    pub total_records: usize,
    pub field_names: Vec<String>,
    pub vector_dimensionality: usize,
    pub model_identifier: String,
    pub source_location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(names: &[&str]) -> Vec<CatalogRecord> {
        names
            .iter()
            .map(|n| CatalogRecord::new(*n, "desc", " - "))
            .collect()
    }

    #[test]
    fn test_new_rejects_count_mismatch() {
        let err = CatalogIndex::new(vec![], records(&["A", "B"]), vec![vec![1.0]]).unwrap_err();
        assert!(err.to_string().contains("2 records but 1 vectors"));
    }

    #[test]
    fn test_new_rejects_ragged_vectors() {
        let err = CatalogIndex::new(
            vec![],
            records(&["A", "B"]),
            vec![vec![1.0, 0.0], vec![1.0]],
        )
        .unwrap_err();
        assert!(err.to_string().contains("vector 1 has length 1, expected 2"));
    }

    #[test]
    fn test_similarities_in_index_order() {
        let index = CatalogIndex::new(
            vec![],
            records(&["A", "B", "C"]),
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
        )
        .unwrap();
        let scores = index.similarities(&[1.0, 0.0]).unwrap();

        assert!((scores[0] - 1.0).abs() < 1e-9);
        assert_eq!(scores[1], 0.0);
        assert!((scores[2] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_similarities_zero_query() {
        let index = CatalogIndex::new(vec![], records(&["A"]), vec![vec![1.0, 0.0]]).unwrap();
        assert_eq!(index.similarities(&[0.0, 0.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_similarities_dimension_mismatch() {
        let index = CatalogIndex::new(vec![], records(&["A"]), vec![vec![1.0, 0.0]]).unwrap();
        let err = index.similarities(&[1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_empty_index() {
        let index = CatalogIndex::new(vec![], vec![], vec![]).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.dimension(), 0);
        assert!(index.similarities(&[1.0]).unwrap().is_empty());
    }
}
