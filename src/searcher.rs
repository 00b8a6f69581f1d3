//! Query-side search: embed one image, return its nearest dataset images.

use std::sync::Arc;

use log::debug;

use crate::embedding::ImageEmbedder;
use crate::error::Result;
use crate::index::{IndexStore, SearchHit};

/// Searches an [`IndexStore`] with query images.
pub struct ImageSearcher {
    embedder: Arc<dyn ImageEmbedder>,
    store: IndexStore,
}

impl ImageSearcher {
    /// Create a searcher over an existing store.
    pub fn new(embedder: Arc<dyn ImageEmbedder>, store: IndexStore) -> Self {
        Self { embedder, store }
    }

    /// The underlying index store.
    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Name of the embedder used for queries.
    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    /// Embed the query image and return its `top_k` nearest dataset images,
    /// ascending by distance.
    pub async fn search(&self, image_path: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let query = self.embedder.embed(image_path).await?;
        let hits = self.store.search(&query, top_k)?;
        debug!("Query {} returned {} hits", image_path, hits.len());
        Ok(hits)
    }
}

/// Convert hit distances into 0-100 similarity scores for display.
///
/// Distances are normalized against the largest distance in the batch:
/// `100 * (1 - d / d_max)`. When every hit is an exact duplicate of the query
/// (`d_max == 0`), all hits score 100.
pub fn similarity_scores(hits: &[SearchHit]) -> Vec<f32> {
    let max_distance = hits.iter().fold(0.0f32, |acc, hit| acc.max(hit.distance));
    if max_distance == 0.0 {
        return vec![100.0; hits.len()];
    }

    hits.iter()
        .map(|hit| (100.0 * (1.0 - hit.distance / max_distance)).clamp(0.0, 100.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(path: &str, distance: f32) -> SearchHit {
        SearchHit {
            path: path.to_string(),
            distance,
        }
    }

    #[test]
    fn test_similarity_scores_normalization() {
        let hits = vec![hit("a.png", 0.0), hit("b.png", 1.0), hit("c.png", 2.0)];
        let scores = similarity_scores(&hits);

        assert_eq!(scores.len(), 3);
        assert!((scores[0] - 100.0).abs() < 1e-4);
        assert!((scores[1] - 50.0).abs() < 1e-4);
        assert!(scores[2].abs() < 1e-4);
    }

    #[test]
    fn test_similarity_scores_all_duplicates() {
        let hits = vec![hit("a.png", 0.0), hit("b.png", 0.0)];
        let scores = similarity_scores(&hits);
        assert_eq!(scores, vec![100.0, 100.0]);
    }

    #[test]
    fn test_similarity_scores_empty() {
        assert!(similarity_scores(&[]).is_empty());
    }

    #[test]
    fn test_scores_are_monotonic_in_distance() {
        let hits = vec![hit("a.png", 0.2), hit("b.png", 0.7), hit("c.png", 0.9)];
        let scores = similarity_scores(&hits);
        assert!(scores[0] > scores[1]);
        assert!(scores[1] > scores[2]);
    }
}
