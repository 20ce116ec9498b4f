//! Query engine
//!
//! Encodes a free-text query, scores it against every indexed vector and
//! returns the top-k matches with confidence labels.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::builder::IndexBuilder;
use crate::config::IndexConfig;
use crate::error::QueryError;
use crate::index::PublishedIndex;

/// Discrete label for a similarity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
    VeryLow,
}

impl Confidence {
    /// `>= 0.8` high, `>= 0.6` medium, `>= 0.4` low, otherwise very low
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::High
        } else if score >= 0.6 {
            Self::Medium
        } else if score >= 0.4 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::VeryLow => "very_low",
        }
    }
}

/// One ranked match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// 1-based position in the result list
    pub rank: usize,
    pub name: String,
    pub description: String,
    pub similarity_score: f64,
    pub confidence: Confidence,
}

/// Accepted top-k range and the fallback for values outside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopKPolicy {
    pub default: usize,
    pub max: usize,
}

impl TopKPolicy {
    pub fn new(default: usize, max: usize) -> Self {
        Self { default, max }
    }

    /// `requested` when within `[1, max]`, the default otherwise
    pub fn resolve(&self, requested: i64) -> usize {
        match usize::try_from(requested) {
            Ok(k) if (1..=self.max).contains(&k) => k,
            _ => self.default,
        }
    }
}

impl From<&IndexConfig> for TopKPolicy {
    fn from(config: &IndexConfig) -> Self {
        Self::new(config.default_top_k, config.max_top_k)
    }
}

/// Query text sent to the encoder: both parts joined by a space, trimmed
pub fn build_query(primary: &str, secondary: &str) -> String {
    format!("{primary} {secondary}").trim().to_string()
}

/// Positions of the `top_k` best scores, best first
///
/// Equal scores keep catalog order.
pub fn rank(scores: &[f64], top_k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // stable: ties stay in index order
    order.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));
    order.truncate(top_k);
    order
}

/// Ranks catalog items against free-text queries
///
/// Reads whatever index the builder has published; never waits on a build.
#[derive(Clone)]
pub struct QueryEngine {
    builder: IndexBuilder,
    top_k: TopKPolicy,
}

impl QueryEngine {
    pub fn new(builder: IndexBuilder) -> Self {
        let top_k = TopKPolicy::from(builder.config());
        Self { builder, top_k }
    }

    pub fn top_k_policy(&self) -> TopKPolicy {
        self.top_k
    }

    /// Top-k catalog matches for `primary` + `secondary`
    ///
    /// `top_k` outside `[1, max]` falls back to the configured default.
    /// Encoding and scoring run on a blocking worker.
    pub async fn predict(
        &self,
        primary: &str,
        secondary: &str,
        top_k: i64,
    ) -> Result<Vec<PredictionResult>, QueryError> {
        let published = self.builder.published().ok_or(QueryError::NotReady)?;

        let query = build_query(primary, secondary);
        if query.is_empty() {
            return Err(QueryError::InvalidInput("Query cannot be empty".to_string()));
        }
        let top_k = self.top_k.resolve(top_k);

        tokio::task::spawn_blocking(move || search(&published, &query, top_k))
            .await
            .map_err(|e| QueryError::Internal(format!("search task failed: {e}")))?
    }
}

/// Encode `query` and rank the published index against it
pub fn search(
    published: &Arc<PublishedIndex>,
    query: &str,
    top_k: usize,
) -> Result<Vec<PredictionResult>, QueryError> {
    let embedding = published.engine().embed(query)?;
    let index = published.index();
    let scores = index.similarities(&embedding)?;

    Ok(rank(&scores, top_k)
        .into_iter()
        .enumerate()
        .filter_map(|(i, pos)| {
            let record = index.record(pos)?;
            let score = scores[pos];
            Some(PredictionResult {
                rank: i + 1,
                name: record.name.clone(),
                description: record.description.clone(),
                similarity_score: score,
                confidence: Confidence::from_score(score),
            })
        })
        .collect())
}
