//! Embedding module
//!
//! Provider and encoder seams, the fastembed-backed implementation and the
//! query-side engine with cosine similarity.

mod engine;
mod fastembed_provider;
mod hub;
mod provider;

pub use engine::VectorEngine;
pub(crate) use engine::{cosine_similarity, norm};
pub use fastembed_provider::{FastEmbedEncoder, FastEmbedProvider};
pub use hub::{HubLogin, HF_ENDPOINT};
pub use provider::{EmbeddingProvider, Encoder, Vector};
