//! RGB color histogram embedder.
//!
//! A deterministic, offline embedder that represents an image by its joint
//! RGB color distribution. It is the default embedder when the
//! `embeddings-clip` feature is disabled, and the embedder used in tests.
//! Images with similar color palettes land close together under L2 distance;
//! it is a much weaker similarity proxy than a neural embedding, but it runs
//! anywhere with no model download.

use async_trait::async_trait;

use crate::embedding::embedder::ImageEmbedder;
use crate::error::{KagamiError, Result};
use crate::vector::Vector;

/// Embeds images as L2-normalized joint RGB histograms.
///
/// With `bins` bins per channel the embedding dimension is `bins^3`.
#[derive(Debug, Clone)]
pub struct HistogramImageEmbedder {
    bins: usize,
    dimension: usize,
}

impl HistogramImageEmbedder {
    /// Create a new histogram embedder with the given bins per channel.
    pub fn new(bins: usize) -> Result<Self> {
        if bins == 0 || bins > 256 {
            return Err(KagamiError::invalid_argument(format!(
                "histogram bins must be in 1..=256, got {bins}"
            )));
        }
        Ok(Self {
            bins,
            dimension: bins * bins * bins,
        })
    }

    /// Bins per channel.
    pub fn bins(&self) -> usize {
        self.bins
    }

    fn histogram(&self, image_path: &str) -> Result<Vector> {
        use image::ImageReader;

        let img_reader = ImageReader::open(image_path)
            .map_err(|e| KagamiError::embedding(format!("Image open failed: {e}")))?
            .with_guessed_format()
            .map_err(|e| KagamiError::embedding(format!("Image format guess failed: {e}")))?;

        let img = img_reader
            .decode()
            .map_err(|e| KagamiError::embedding(format!("Image decode failed: {e}")))?
            .to_rgb8();

        let pixel_count = (img.width() as u64) * (img.height() as u64);
        if pixel_count == 0 {
            return Err(KagamiError::embedding(format!(
                "Image has no pixels: {image_path}"
            )));
        }

        // 256 intensity levels spread evenly over `bins` buckets per channel.
        let bucket_width = (256 + self.bins - 1) / self.bins;
        let mut counts = vec![0.0f32; self.dimension];
        for pixel in img.pixels() {
            let r = pixel.0[0] as usize / bucket_width;
            let g = pixel.0[1] as usize / bucket_width;
            let b = pixel.0[2] as usize / bucket_width;
            counts[(r * self.bins + g) * self.bins + b] += 1.0;
        }

        let mut vector = Vector::new(counts);
        vector.normalize();
        Ok(vector)
    }
}

#[async_trait]
impl ImageEmbedder for HistogramImageEmbedder {
    async fn embed(&self, image_path: &str) -> Result<Vector> {
        self.histogram(image_path)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "histogram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_solid_image(path: &std::path::Path, color: [u8; 3]) {
        let img = RgbImage::from_pixel(8, 8, Rgb(color));
        img.save(path).unwrap();
    }

    #[tokio::test]
    async fn test_embed_solid_color() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        write_solid_image(&path, [255, 0, 0]);

        let embedder = HistogramImageEmbedder::new(4).unwrap();
        let vector = embedder.embed(path.to_str().unwrap()).await.unwrap();

        assert_eq!(vector.dimension(), 64);
        // A solid image concentrates all mass in one bucket, so the
        // normalized histogram is a unit one-hot vector.
        assert!((vector.norm() - 1.0).abs() < 1e-6);
        assert_eq!(vector.data.iter().filter(|v| **v > 0.0).count(), 1);
    }

    #[tokio::test]
    async fn test_similar_colors_closer_than_different() {
        use crate::vector::DistanceMetric;

        let dir = tempfile::tempdir().unwrap();
        let red = dir.path().join("red.png");
        let dark_red = dir.path().join("dark_red.png");
        let blue = dir.path().join("blue.png");
        write_solid_image(&red, [250, 10, 10]);
        write_solid_image(&dark_red, [240, 20, 20]);
        write_solid_image(&blue, [10, 10, 250]);

        let embedder = HistogramImageEmbedder::new(4).unwrap();
        let v_red = embedder.embed(red.to_str().unwrap()).await.unwrap();
        let v_dark = embedder.embed(dark_red.to_str().unwrap()).await.unwrap();
        let v_blue = embedder.embed(blue.to_str().unwrap()).await.unwrap();

        let metric = DistanceMetric::Euclidean;
        let d_similar = metric.distance(&v_red.data, &v_dark.data).unwrap();
        let d_different = metric.distance(&v_red.data, &v_blue.data).unwrap();
        assert!(d_similar < d_different);
    }

    #[tokio::test]
    async fn test_embed_missing_file() {
        let embedder = HistogramImageEmbedder::new(8).unwrap();
        let result = embedder.embed("/nonexistent/image.png").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_bins() {
        assert!(HistogramImageEmbedder::new(0).is_err());
        assert!(HistogramImageEmbedder::new(257).is_err());
    }
}
