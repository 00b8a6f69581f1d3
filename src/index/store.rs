//! Persistent store pairing the vector index with its source image paths.

use std::io::{Read, Write};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{KagamiError, Result};
use crate::index::flat::FlatVectorIndex;
use crate::storage::Storage;
use crate::vector::{DistanceMetric, Vector};

/// File name of the serialized vector index blob.
pub const INDEX_FILE: &str = "vectors.bin";

/// File name of the slot-to-path list.
pub const PATHS_FILE: &str = "paths.json";

/// A single search result: a dataset image and its distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Path of the matched dataset image.
    pub path: String,
    /// Distance between the query and the matched image (smaller is closer).
    pub distance: f32,
}

/// A flat vector index plus the parallel list mapping vector slot to the
/// source image path.
///
/// Invariant: the index and the path list always have the same length; every
/// vector slot `i` corresponds to `paths[i]`.
#[derive(Debug, Clone)]
pub struct IndexStore {
    index: FlatVectorIndex,
    paths: Vec<String>,
}

impl IndexStore {
    /// Create a new empty store for vectors of the given dimension.
    pub fn new(dimension: usize, metric: DistanceMetric) -> Result<Self> {
        Ok(Self {
            index: FlatVectorIndex::new(dimension, metric)?,
            paths: Vec::new(),
        })
    }

    /// Number of indexed images.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the store holds no images.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Dimension of the stored vectors.
    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// Distance metric used for search.
    pub fn metric(&self) -> DistanceMetric {
        self.index.metric()
    }

    /// Paths of all indexed images, in slot order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Append one image embedding with its source path.
    pub fn add(&mut self, vector: Vector, path: String) -> Result<()> {
        self.index.add_vector(vector)?;
        self.paths.push(path);
        Ok(())
    }

    /// Append a batch of image embeddings with their source paths.
    pub fn add_batch(&mut self, entries: Vec<(Vector, String)>) -> Result<()> {
        for (vector, path) in entries {
            self.add(vector, path)?;
        }
        Ok(())
    }

    /// Find the `k` images closest to the query vector.
    ///
    /// Returns hits in ascending distance order. Searching an empty store is
    /// an error.
    pub fn search(&self, query: &Vector, k: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() {
            return Err(KagamiError::index("index is empty"));
        }

        let results = self.index.search(query, k)?;
        Ok(results
            .into_iter()
            .map(|(slot, distance)| SearchHit {
                path: self.paths[slot].clone(),
                distance,
            })
            .collect())
    }

    /// Check whether a persisted store exists in the given storage.
    pub fn exists(storage: &dyn Storage) -> bool {
        storage.file_exists(INDEX_FILE) && storage.file_exists(PATHS_FILE)
    }

    /// Persist the store as two files: the index blob and the path list.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let blob = self.index.to_bytes()?;
        let mut output = storage.create_output(INDEX_FILE)?;
        output.write_all(&blob)?;
        output.flush_and_sync()?;

        let paths_json = serde_json::to_vec_pretty(&self.paths)?;
        let mut output = storage.create_output(PATHS_FILE)?;
        output.write_all(&paths_json)?;
        output.flush_and_sync()?;

        info!("Saved index with {} images", self.len());
        Ok(())
    }

    /// Load a store previously written by [`Self::save`].
    ///
    /// Fails if either file is missing, unreadable, or if the index and path
    /// list disagree on length.
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        let mut blob = Vec::new();
        storage.open_input(INDEX_FILE)?.read_to_end(&mut blob)?;
        let index = FlatVectorIndex::from_bytes(&blob)?;

        let mut paths_json = Vec::new();
        storage
            .open_input(PATHS_FILE)?
            .read_to_end(&mut paths_json)?;
        let paths: Vec<String> = serde_json::from_slice(&paths_json)?;

        if index.len() != paths.len() {
            return Err(KagamiError::index(format!(
                "index/path list length mismatch: {} vectors, {} paths",
                index.len(),
                paths.len()
            )));
        }

        info!("Loaded index with {} images", paths.len());
        Ok(Self { index, paths })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn sample_store() -> IndexStore {
        let mut store = IndexStore::new(2, DistanceMetric::Euclidean).unwrap();
        store
            .add_batch(vec![
                (Vector::new(vec![0.0, 0.0]), "a.png".to_string()),
                (Vector::new(vec![1.0, 0.0]), "b.png".to_string()),
                (Vector::new(vec![0.0, 5.0]), "c.png".to_string()),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_search_returns_paths() {
        let store = sample_store();
        let hits = store.search(&Vector::new(vec![0.1, 0.0]), 2).unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].path, "a.png");
        assert_eq!(hits[1].path, "b.png");
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[test]
    fn test_search_empty_store_is_error() {
        let store = IndexStore::new(2, DistanceMetric::Euclidean).unwrap();
        assert!(store.search(&Vector::new(vec![0.0, 0.0]), 1).is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let storage = MemoryStorage::new();
        let store = sample_store();

        assert!(!IndexStore::exists(&storage));
        store.save(&storage).unwrap();
        assert!(IndexStore::exists(&storage));

        let loaded = IndexStore::load(&storage).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.paths(), store.paths());

        let hits = loaded.search(&Vector::new(vec![0.0, 4.9]), 1).unwrap();
        assert_eq!(hits[0].path, "c.png");
    }

    #[test]
    fn test_load_rejects_length_mismatch() {
        let storage = MemoryStorage::new();
        let store = sample_store();
        store.save(&storage).unwrap();

        // Corrupt the path list so it no longer matches the index
        let mut output = storage.create_output(PATHS_FILE).unwrap();
        output.write_all(b"[\"only.png\"]").unwrap();
        output.flush_and_sync().unwrap();
        drop(output);

        assert!(IndexStore::load(&storage).is_err());
    }

    #[test]
    fn test_load_missing_files_is_error() {
        let storage = MemoryStorage::new();
        assert!(IndexStore::load(&storage).is_err());
    }
}
