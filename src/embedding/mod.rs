//! Image embedding for similarity search.
//!
//! The [`ImageEmbedder`] trait abstracts over pretrained image-to-vector
//! models. Two implementations are provided: a CLIP vision encoder running on
//! Candle (behind the `embeddings-clip` feature) and an offline RGB histogram
//! embedder used as the default and in tests.

#[cfg(feature = "embeddings-clip")]
pub mod clip;
pub mod embedder;
pub mod histogram;

use std::sync::Arc;

#[cfg(feature = "embeddings-clip")]
pub use clip::ClipImageEmbedder;
pub use embedder::ImageEmbedder;
pub use histogram::HistogramImageEmbedder;

use crate::config::{EmbedderConfig, EmbedderKind};
use crate::error::Result;
#[cfg(not(feature = "embeddings-clip"))]
use crate::error::KagamiError;

/// Create an embedder from the given configuration.
pub fn create_embedder(config: &EmbedderConfig) -> Result<Arc<dyn ImageEmbedder>> {
    match config.kind {
        EmbedderKind::Histogram => Ok(Arc::new(HistogramImageEmbedder::new(
            config.histogram_bins,
        )?)),
        #[cfg(feature = "embeddings-clip")]
        EmbedderKind::Clip => Ok(Arc::new(ClipImageEmbedder::new(&config.clip_model)?)),
        #[cfg(not(feature = "embeddings-clip"))]
        EmbedderKind::Clip => Err(KagamiError::invalid_config(
            "CLIP embedder requires the `embeddings-clip` feature",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_histogram_embedder() {
        let config = EmbedderConfig::default();
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.dimension(), 8 * 8 * 8);
    }
}
