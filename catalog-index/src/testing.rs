//! In-memory doubles for the embedding provider and catalog store
//!
//! Available to this crate's tests and, through the `test-support` feature,
//! to downstream crates that need to drive a full build without model files
//! or network access.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::catalog::{Catalog, CatalogSchema, CatalogStore};
use crate::embedding::{EmbeddingProvider, Encoder, Vector};
use crate::error::{IndexError, Result};

/// One-shot latch for parking a blocking call until a test releases it
#[derive(Clone, Default)]
pub struct Gate {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every current and future waiter
    pub fn open(&self) {
        let (open, condvar) = &*self.inner;
        *open.lock() = true;
        condvar.notify_all();
    }

    /// Block until [`open`](Self::open) is called
    pub fn wait(&self) {
        let (open, condvar) = &*self.inner;
        let mut guard = open.lock();
        while !*guard {
            condvar.wait(&mut guard);
        }
    }
}

#[derive(Default)]
struct Counters {
    auth: AtomicUsize,
    load: AtomicUsize,
    encode: AtomicUsize,
    texts: AtomicUsize,
}

/// Provider whose encoder returns fixed vectors for known texts and a
/// character histogram for everything else
pub struct StaticEmbeddingProvider {
    dimension: usize,
    vectors: HashMap<String, Vector>,
    load_gate: Option<Gate>,
    auth_error: Option<String>,
    encode_error: Option<String>,
    load_failures: Arc<AtomicUsize>,
    counters: Arc<Counters>,
}

impl StaticEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            vectors: HashMap::new(),
            load_gate: None,
            auth_error: None,
            encode_error: None,
            load_failures: Arc::new(AtomicUsize::new(0)),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Fixed vector for `text`; must have the provider's dimension
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vector) -> Self {
        assert_eq!(vector.len(), self.dimension, "vector length must match dimension");
        self.vectors.insert(text.into(), vector);
        self
    }

    /// Park `load_encoder` until the gate opens
    pub fn with_load_gate(mut self, gate: Gate) -> Self {
        self.load_gate = Some(gate);
        self
    }

    pub fn fail_authentication(mut self, msg: impl Into<String>) -> Self {
        self.auth_error = Some(msg.into());
        self
    }

    /// Fail the first `n` calls to `load_encoder`
    pub fn fail_first_loads(self, n: usize) -> Self {
        self.load_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn fail_encode(mut self, msg: impl Into<String>) -> Self {
        self.encode_error = Some(msg.into());
        self
    }

    pub fn auth_calls(&self) -> usize {
        self.counters.auth.load(Ordering::SeqCst)
    }

    pub fn load_calls(&self) -> usize {
        self.counters.load.load(Ordering::SeqCst)
    }

    /// Calls to `encode` across all encoders handed out
    pub fn encode_calls(&self) -> usize {
        self.counters.encode.load(Ordering::SeqCst)
    }

    /// Texts encoded across all encoders handed out
    pub fn encoded_texts(&self) -> usize {
        self.counters.texts.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for StaticEmbeddingProvider {
    fn authenticate(&self, _credential: &str) -> Result<()> {
        self.counters.auth.fetch_add(1, Ordering::SeqCst);
        match &self.auth_error {
            Some(msg) => Err(IndexError::authentication(msg.clone())),
            None => Ok(()),
        }
    }

    fn load_encoder(&self, model_id: &str) -> Result<Arc<dyn Encoder>> {
        self.counters.load.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.load_gate {
            gate.wait();
        }

        let remaining = self.load_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.load_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(IndexError::model(format!("Failed to load {model_id}")));
        }

        Ok(Arc::new(StaticEncoder {
            dimension: self.dimension,
            vectors: self.vectors.clone(),
            encode_error: self.encode_error.clone(),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct StaticEncoder {
    dimension: usize,
    vectors: HashMap<String, Vector>,
    encode_error: Option<String>,
    counters: Arc<Counters>,
}

impl StaticEncoder {
    fn histogram(&self, text: &str) -> Vector {
        let mut vector = vec![0.0; self.dimension];
        for c in text.chars().filter(|c| c.is_alphanumeric()) {
            vector[c.to_ascii_lowercase() as usize % self.dimension] += 1.0;
        }
        vector
    }
}

impl Encoder for StaticEncoder {
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        self.counters.encode.fetch_add(1, Ordering::SeqCst);
        self.counters.texts.fetch_add(texts.len(), Ordering::SeqCst);
        if let Some(msg) = &self.encode_error {
            return Err(IndexError::encoding(msg.clone()));
        }

        Ok(texts
            .iter()
            .map(|text| {
                self.vectors
                    .get(*text)
                    .cloned()
                    .unwrap_or_else(|| self.histogram(text))
            })
            .collect())
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}

/// Catalog store over rows held in memory
///
/// Applies the same column validation and deduplication as the CSV store;
/// the location argument is ignored.
pub struct InMemoryCatalogStore {
    fields: Vec<String>,
    rows: Vec<(String, String)>,
    loads: AtomicUsize,
}

impl InMemoryCatalogStore {
    pub fn new(fields: Vec<String>, rows: Vec<(String, String)>) -> Self {
        Self {
            fields,
            rows,
            loads: AtomicUsize::new(0),
        }
    }

    /// Store whose fields are exactly the schema's required columns
    pub fn with_rows<N, D>(schema: &CatalogSchema, rows: Vec<(N, D)>) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Self::new(
            vec![schema.name_column.clone(), schema.description_column.clone()],
            rows.into_iter()
                .map(|(name, description)| (name.into(), description.into()))
                .collect(),
        )
    }

    pub fn load_calls(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn load(&self, _location: &Path, schema: &CatalogSchema) -> Result<Catalog> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        let missing: Vec<String> = [&schema.name_column, &schema.description_column]
            .into_iter()
            .filter(|column| !self.fields.contains(column))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(IndexError::MissingColumns {
                missing,
                available: self.fields.clone(),
            });
        }

        Ok(Catalog::from_rows(
            self.fields.clone(),
            self.rows.clone(),
            &schema.separator,
        ))
    }
}
