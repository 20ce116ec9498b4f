//! Embedding provider seams

use std::sync::Arc;

use crate::error::Result;

/// Fixed-length embedding vector
pub type Vector = Vec<f32>;

/// Loaded text encoder
///
/// Calls may be slow and are blocking; async callers run them on a
/// blocking worker.
pub trait Encoder: Send + Sync {
    /// Encode `texts` into one vector each, in input order
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vector>>;

    /// Output dimensionality, when known before encoding
    fn dimension(&self) -> Option<usize>;
}

/// Source of encoders
pub trait EmbeddingProvider: Send + Sync {
    /// One-time handshake with the model hub
    fn authenticate(&self, credential: &str) -> Result<()>;

    /// Obtain an encoder for `model_id`; dominates initialization latency
    fn load_encoder(&self, model_id: &str) -> Result<Arc<dyn Encoder>>;
}
