//! fastembed-backed provider
//!
//! ONNX sentence embeddings (BGE, MiniLM, ...) downloaded from the
//! Hugging Face hub on first use and cached locally.

use std::path::PathBuf;
use std::sync::Arc;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

use super::hub::HubLogin;
use super::provider::{EmbeddingProvider, Encoder, Vector};
use crate::error::{IndexError, Result};

/// Provider resolving model codes against fastembed's supported models
#[derive(Debug, Clone, Default)]
pub struct FastEmbedProvider {
    cache_dir: Option<PathBuf>,
    batch_size: Option<usize>,
    show_download_progress: bool,
    hub: HubLogin,
}

impl FastEmbedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory for downloaded model files
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Batch size handed to the ONNX session
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size.max(1));
        self
    }

    /// Print a progress bar while model files download
    pub fn with_download_progress(mut self, show: bool) -> Self {
        self.show_download_progress = show;
        self
    }

    fn resolve(model_id: &str) -> Result<(EmbeddingModel, usize)> {
        let supported = TextEmbedding::list_supported_models();

        if let Some(info) = supported
            .iter()
            .find(|info| info.model_code.eq_ignore_ascii_case(model_id))
        {
            return Ok((info.model.clone(), info.dim));
        }

        let known: Vec<&str> = supported
            .iter()
            .take(8)
            .map(|info| info.model_code.as_str())
            .collect();
        Err(IndexError::model(format!(
            "Unsupported model '{}'. Supported models include: {}",
            model_id,
            known.join(", ")
        )))
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn authenticate(&self, credential: &str) -> Result<()> {
        self.hub.login(credential)
    }

    fn load_encoder(&self, model_id: &str) -> Result<Arc<dyn Encoder>> {
        let (model, dimension) = Self::resolve(model_id)?;

        log::info!("Loading embedding model: {} ({}d)", model_id, dimension);

        let mut options =
            InitOptions::new(model).with_show_download_progress(self.show_download_progress);
        if let Some(dir) = &self.cache_dir {
            options = options.with_cache_dir(dir.clone());
        }

        let embedding = TextEmbedding::try_new(options)
            .map_err(|e| IndexError::model(format!("Failed to load {}: {}", model_id, e)))?;

        log::info!("Embedding model loaded: {}", model_id);

        Ok(Arc::new(FastEmbedEncoder {
            model: Mutex::new(embedding),
            dimension,
            batch_size: self.batch_size,
        }))
    }
}

/// Encoder over a loaded fastembed session
pub struct FastEmbedEncoder {
    model: Mutex<TextEmbedding>,
    dimension: usize,
    batch_size: Option<usize>,
}

impl Encoder for FastEmbedEncoder {
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let vectors = self
            .model
            .lock()
            .embed(texts.to_vec(), self.batch_size)
            .map_err(|e| IndexError::encoding(format!("Failed to encode texts: {}", e)))?;

        if vectors.len() != texts.len() {
            return Err(IndexError::encoding(format!(
                "Encoder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }

        Ok(vectors)
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}
