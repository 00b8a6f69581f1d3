//! Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{KagamiError, Result};
use crate::vector::DistanceMetric;

/// Default number of results returned per search.
pub const DEFAULT_TOP_K: usize = 5;

/// Default maximum upload size (16 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Which embedder implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// RGB color histogram embedder (offline, deterministic).
    #[default]
    Histogram,
    /// CLIP vision encoder via Candle (requires the `embeddings-clip` feature).
    Clip,
}

impl EmbedderKind {
    /// Parse an embedder kind from a string.
    pub fn parse_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "histogram" => Ok(EmbedderKind::Histogram),
            "clip" => Ok(EmbedderKind::Clip),
            _ => Err(KagamiError::invalid_config(format!(
                "Unknown embedder kind: {s}"
            ))),
        }
    }
}

/// Embedder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderConfig {
    /// Which embedder implementation to use.
    pub kind: EmbedderKind,
    /// HuggingFace model identifier for the CLIP embedder.
    pub clip_model: String,
    /// Bins per channel for the histogram embedder.
    pub histogram_bins: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        EmbedderConfig {
            kind: EmbedderKind::default(),
            clip_model: "openai/clip-vit-base-patch32".to_string(),
            histogram_bins: 8,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory containing the dataset images.
    pub dataset_dir: PathBuf,
    /// Directory holding the persisted index files.
    pub index_dir: PathBuf,
    /// Directory where uploaded query images are stored.
    pub upload_dir: PathBuf,
    /// Number of results returned per search.
    pub top_k: usize,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
    /// Address the web server binds to.
    pub host: String,
    /// Port the web server binds to.
    pub port: u16,
    /// Distance metric used when building and querying the index.
    pub metric: DistanceMetric,
    /// Embedder settings.
    pub embedder: EmbedderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            dataset_dir: PathBuf::from("static/dataset"),
            index_dir: PathBuf::from("static/index"),
            upload_dir: PathBuf::from("static/uploads"),
            top_k: DEFAULT_TOP_K,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            host: "127.0.0.1".to_string(),
            port: 8080,
            metric: DistanceMetric::default(),
            embedder: EmbedderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(KagamiError::invalid_config("top_k must be greater than 0"));
        }
        if self.embedder.histogram_bins == 0 {
            return Err(KagamiError::invalid_config(
                "histogram_bins must be greater than 0",
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(KagamiError::invalid_config(
                "max_upload_bytes must be greater than 0",
            ));
        }
        Ok(())
    }
}
