//! Dataset indexing: walk a directory tree, embed every image, persist the
//! index store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::embedding::ImageEmbedder;
use crate::error::{KagamiError, Result};
use crate::index::IndexStore;
use crate::storage::Storage;
use crate::vector::DistanceMetric;

/// File extensions treated as indexable images (lowercase).
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Check whether a file name carries an allowed image extension.
pub fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Statistics from an indexing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingStats {
    /// Number of images embedded and added to the index.
    pub indexed: usize,
    /// Number of files that failed to embed and were skipped.
    pub skipped: usize,
    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: u64,
}

/// Builds an [`IndexStore`] from a directory of images.
pub struct Indexer {
    embedder: Arc<dyn ImageEmbedder>,
    metric: DistanceMetric,
}

impl Indexer {
    /// Create a new indexer.
    pub fn new(embedder: Arc<dyn ImageEmbedder>, metric: DistanceMetric) -> Self {
        Self { embedder, metric }
    }

    /// Walk `dataset_dir`, embed every image found, and persist the resulting
    /// store into `storage`.
    ///
    /// Files that fail to embed are skipped with a warning; they count toward
    /// [`IndexingStats::skipped`] but never enter the store. An empty dataset,
    /// or one where every file fails, is an error.
    pub async fn index_directory(
        &self,
        dataset_dir: &Path,
        storage: &dyn Storage,
    ) -> Result<(IndexStore, IndexingStats)> {
        let start = Instant::now();

        let image_files = collect_image_files(dataset_dir)?;
        if image_files.is_empty() {
            return Err(KagamiError::index(format!(
                "No images found in {}",
                dataset_dir.display()
            )));
        }

        info!(
            "Indexing {} images from {} with embedder '{}'",
            image_files.len(),
            dataset_dir.display(),
            self.embedder.name()
        );

        let mut store = IndexStore::new(self.embedder.dimension(), self.metric)?;
        let mut skipped = 0usize;

        for path in &image_files {
            let path_str = path.to_string_lossy();
            match self.embedder.embed(&path_str).await {
                Ok(vector) => {
                    debug!("Indexed {path_str}");
                    store.add(vector, path_str.to_string())?;
                }
                Err(e) => {
                    warn!("Skipping {path_str}: {e}");
                    skipped += 1;
                }
            }
        }

        if store.is_empty() {
            return Err(KagamiError::index(
                "No images could be embedded from the dataset",
            ));
        }

        store.save(storage)?;

        let stats = IndexingStats {
            indexed: store.len(),
            skipped,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Index built: {} indexed, {} skipped in {} ms",
            stats.indexed, stats.skipped, stats.duration_ms
        );

        Ok((store, stats))
    }
}

/// Recursively collect image files under `dir`, sorted for deterministic slot
/// assignment.
fn collect_image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_into(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_into(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Err(KagamiError::index(format!(
            "Dataset path is not a directory: {}",
            dir.display()
        )));
    }

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_into(&path, files)?;
        } else if has_image_extension(&entry.file_name().to_string_lossy()) {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_image_extension() {
        assert!(has_image_extension("photo.jpg"));
        assert!(has_image_extension("photo.JPEG"));
        assert!(has_image_extension("photo.Png"));
        assert!(!has_image_extension("notes.txt"));
        assert!(!has_image_extension("archive.tar.gz"));
        assert!(!has_image_extension("no_extension"));
    }
}
