//! Image embedding trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::vector::Vector;

/// Trait for converting images to vector embeddings.
///
/// This trait provides a common interface for various image embedding methods
/// (neural models, pixel statistics, etc.) to integrate with the indexing and
/// search pipeline.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use kagami::embedding::ImageEmbedder;
/// use kagami::error::Result;
/// use kagami::vector::Vector;
///
/// struct MyCustomImageEmbedder {
///     dimension: usize,
/// }
///
/// #[async_trait]
/// impl ImageEmbedder for MyCustomImageEmbedder {
///     async fn embed(&self, image_path: &str) -> Result<Vector> {
///         Ok(Vector::new(vec![0.0; self.dimension]))
///     }
///
///     fn dimension(&self) -> usize {
///         self.dimension
///     }
/// }
/// ```
#[async_trait]
pub trait ImageEmbedder: Send + Sync {
    /// Generate an embedding vector for the given image.
    ///
    /// # Arguments
    ///
    /// * `image_path` - Path to the image file to embed
    async fn embed(&self, image_path: &str) -> Result<Vector>;

    /// Generate embeddings for multiple images in batch.
    ///
    /// The default implementation calls `embed` sequentially. Override this
    /// method for better performance with batch processing.
    async fn embed_batch(&self, image_paths: &[&str]) -> Result<Vec<Vector>> {
        let mut results = Vec::with_capacity(image_paths.len());
        for path in image_paths {
            results.push(self.embed(path).await?);
        }
        Ok(results)
    }

    /// Get the dimension of generated embeddings.
    fn dimension(&self) -> usize;

    /// Get the name/identifier of this embedder.
    fn name(&self) -> &str {
        "unknown"
    }
}
