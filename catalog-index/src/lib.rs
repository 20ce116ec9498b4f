//! Catalog Index
//!
//! Free-text matching over a tabular catalog: every catalog row is encoded
//! into an embedding once, and queries are ranked against the resulting
//! in-memory index by cosine similarity.
//!
//! ## Features
//!
//! - **Single-flight initialization** - At most one build runs; a completed build is final, a failed one can be retried
//! - **Observable progress** - Status snapshots with progress checkpoints, timestamps and errors
//! - **Atomic publication** - Queries see either no index or a complete one
//! - **Deterministic ranking** - Ties keep catalog order; confidence labels from fixed thresholds
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use catalog_index::{CsvCatalogStore, FastEmbedProvider, IndexBuilder, IndexConfig, QueryEngine};
//!
//! let builder = IndexBuilder::new(
//!     IndexConfig::default(),
//!     Arc::new(FastEmbedProvider::new()),
//!     Arc::new(CsvCatalogStore::new()),
//! );
//! builder.request_initialization(true).await;
//! builder.wait_until_ready(std::time::Duration::from_secs(600)).await;
//!
//! let engine = QueryEngine::new(builder.clone());
//! let matches = engine.predict("fever", "headache for two days", 5).await?;
//! ```

pub mod builder;
pub mod catalog;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod query;
pub mod state;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-exports for convenience
pub use builder::{IndexBuilder, InitOutcome};
pub use catalog::{Catalog, CatalogRecord, CatalogSchema, CatalogStore, CsvCatalogStore};
pub use config::IndexConfig;
pub use embedding::{EmbeddingProvider, Encoder, FastEmbedProvider, HubLogin, Vector, VectorEngine};
pub use error::{IndexError, QueryError};
pub use index::{CatalogIndex, CatalogStats, PublishedIndex};
pub use query::{Confidence, PredictionResult, QueryEngine, TopKPolicy};
pub use state::{InitStatus, InitializationState, StatusSnapshot};
pub use status::{HealthReport, Readiness};
