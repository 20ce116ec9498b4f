//! Vector embedding engine
//!
//! High-level API over a loaded [`Encoder`]: batched catalog encoding,
//! cached query embeddings and cosine similarity.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use super::provider::{Encoder, Vector};
use crate::error::{IndexError, Result};

/// Vector embedding engine with query caching
///
/// The cache only holds query embeddings; catalog texts are encoded once per
/// build and never cached.
pub struct VectorEngine {
    encoder: Arc<dyn Encoder>,
    cache: Option<Mutex<LruCache<String, Vector>>>,
}

impl VectorEngine {
    /// Wrap `encoder`, caching up to `cache_size` query embeddings (0 disables)
    pub fn new(encoder: Arc<dyn Encoder>, cache_size: usize) -> Self {
        let cache = NonZeroUsize::new(cache_size).map(|cap| Mutex::new(LruCache::new(cap)));
        Self { encoder, cache }
    }

    /// Embed a single query, consulting the cache first
    pub fn embed(&self, text: &str) -> Result<Vector> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.lock().get(text) {
                return Ok(cached.clone());
            }
        }

        let embedding = self
            .encoder
            .encode(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| IndexError::encoding("Encoder returned no vector for query"))?;

        if let Some(cache) = &self.cache {
            cache.lock().put(text.to_string(), embedding.clone());
        }
        Ok(embedding)
    }

    /// Encode `texts` in chunks of `batch_size`, preserving order
    ///
    /// `on_batch` receives `(encoded_so_far, total)` after every chunk.
    pub fn embed_batches<F>(
        &self,
        texts: &[&str],
        batch_size: usize,
        mut on_batch: F,
    ) -> Result<Vec<Vector>>
    where
        F: FnMut(usize, usize),
    {
        let total = texts.len();
        let mut vectors = Vec::with_capacity(total);

        for chunk in texts.chunks(batch_size.max(1)) {
            let encoded = self.encoder.encode(chunk)?;
            if encoded.len() != chunk.len() {
                return Err(IndexError::encoding(format!(
                    "Encoder returned {} vectors for a batch of {}",
                    encoded.len(),
                    chunk.len()
                )));
            }
            vectors.extend(encoded);
            on_batch(vectors.len(), total);
        }

        Ok(vectors)
    }

    /// Get embedding dimension reported by the encoder
    pub fn dimension(&self) -> Option<usize> {
        self.encoder.dimension()
    }
}

/// `dot(a, b) / (|a| * |b|)` given both norms
///
/// 0 when either norm is 0 or the lengths differ. Accumulates in f64 so
/// threshold comparisons are not skewed by f32 rounding; NaN and negative
/// zero come back as 0 so callers can rank with a total order.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32], norm_a: f64, norm_b: f64) -> f64 {
    if a.len() != b.len() || norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let score = dot / (norm_a * norm_b);
    if score.is_nan() || score == 0.0 {
        0.0
    } else {
        score
    }
}

/// Euclidean norm accumulated in f64
pub(crate) fn norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|x| f64::from(*x) * f64::from(*x))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEncoder {
        calls: AtomicUsize,
    }

    impl Encoder for CountingEncoder {
        fn encode(&self, texts: &[&str]) -> Result<Vec<Vector>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimension(&self) -> Option<usize> {
            Some(2)
        }
    }

    fn cached(engine: &VectorEngine) -> usize {
        engine.cache.as_ref().map_or(0, |cache| cache.lock().len())
    }

    fn counting() -> Arc<CountingEncoder> {
        Arc::new(CountingEncoder {
            calls: AtomicUsize::new(0),
        })
    }

    fn cosine(a: &[f32], b: &[f32]) -> f64 {
        cosine_similarity(a, b, norm(a), norm(b))
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = [1.0_f32, 2.0, 3.0];
        assert!((cosine(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_orthogonal() {
        let a = [1.0_f32, 0.0, 0.0];
        let b = [0.0_f32, 1.0, 0.0];
        assert_eq!(cosine(&a, &b), 0.0);
    }

    #[test]
    fn test_similarity_opposite() {
        let a = [1.0_f32, 1.0];
        let b = [-1.0_f32, -1.0];
        assert!((cosine(&a, &b) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_zero_norm() {
        let a = [0.0_f32, 0.0];
        let b = [1.0_f32, 0.0];
        assert_eq!(cosine(&a, &b), 0.0);
        assert_eq!(cosine(&b, &a), 0.0);
    }

    #[test]
    fn test_similarity_length_mismatch() {
        assert_eq!(cosine(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_similarity_negative_zero_normalised() {
        let score = cosine(&[1.0, 0.0], &[-0.0, 1.0]);
        assert_eq!(score, 0.0);
        assert!(score.is_sign_positive());
    }

    #[test]
    fn test_embed_uses_cache() {
        let encoder = counting();
        let engine = VectorEngine::new(encoder.clone(), 4);

        let first = engine.embed("fever").unwrap();
        let second = engine.embed("fever").unwrap();
        assert_eq!(first, second);
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached(&engine), 1);
    }

    #[test]
    fn test_embed_without_cache() {
        let encoder = counting();
        let engine = VectorEngine::new(encoder.clone(), 0);

        engine.embed("fever").unwrap();
        engine.embed("fever").unwrap();
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached(&engine), 0);
    }

    #[test]
    fn test_embed_batches_preserves_order_and_reports_progress() {
        let encoder = counting();
        let engine = VectorEngine::new(encoder.clone(), 0);
        let texts = ["a", "bb", "ccc", "dddd", "eeeee"];
        let mut progress = Vec::new();

        let vectors = engine
            .embed_batches(&texts, 2, |done, total| progress.push((done, total)))
            .unwrap();

        let lengths: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lengths, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(progress, vec![(2, 5), (4, 5), (5, 5)]);
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 3);
    }
}
