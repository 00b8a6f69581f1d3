//! Candle-based image embedder using the CLIP vision encoder.
//!
//! Runs a CLIP vision transformer locally through the HuggingFace Candle
//! framework. Requires the `embeddings-clip` feature to be enabled.

use async_trait::async_trait;
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{Linear, VarBuilder};
use candle_transformers::models::clip;
use hf_hub::api::sync::ApiBuilder;

use crate::embedding::embedder::ImageEmbedder;
use crate::error::{KagamiError, Result};
use crate::vector::Vector;

/// Image embedder backed by the vision tower of a CLIP model.
///
/// Weights are downloaded from the HuggingFace Hub on first use and cached.
/// Embeddings are projected into CLIP's shared space and L2-normalized, so
/// both Euclidean and cosine distance rank them identically.
///
/// # Examples
///
/// ```no_run
/// use kagami::embedding::{ClipImageEmbedder, ImageEmbedder};
///
/// # async fn example() -> kagami::error::Result<()> {
/// let embedder = ClipImageEmbedder::new("openai/clip-vit-base-patch32")?;
/// let vector = embedder.embed("path/to/image.jpg").await?;
/// println!("Dimension: {}", embedder.dimension());
/// # Ok(())
/// # }
/// ```
pub struct ClipImageEmbedder {
    /// CLIP vision transformer model.
    vision_model: clip::vision_model::ClipVisionTransformer,
    /// Linear projection layer into the shared embedding space.
    vision_projection: Linear,
    /// Device to run the model on (CPU or GPU).
    device: Device,
    /// Dimension of the projected embeddings.
    dimension: usize,
    /// Name of the HuggingFace CLIP model.
    model_name: String,
    /// Expected image size (width/height in pixels).
    image_size: usize,
}

impl std::fmt::Debug for ClipImageEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipImageEmbedder")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("image_size", &self.image_size)
            .finish()
    }
}

impl ClipImageEmbedder {
    /// Create a new CLIP image embedder from a HuggingFace model identifier.
    ///
    /// The model will be automatically downloaded from HuggingFace Hub if not
    /// cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the model download, weight loading, or device
    /// initialization fails.
    pub fn new(model_name: &str) -> Result<Self> {
        // Prefer GPU if available
        let device = Device::cuda_if_available(0)
            .map_err(|e| KagamiError::embedding(format!("Device setup failed: {e}")))?;

        let cache_dir = std::env::var("HF_HOME")
            .or_else(|_| std::env::var("HOME").map(|home| format!("{home}/.cache/huggingface")))
            .unwrap_or_else(|_| "/tmp/huggingface".to_string());

        let api = ApiBuilder::new()
            .with_cache_dir(cache_dir.into())
            .build()
            .map_err(|e| KagamiError::embedding(format!("HF API initialization failed: {e}")))?;
        let repo = api.model(model_name.to_string());

        // Note: Using the default vit_base_patch32 config
        let config = clip::ClipConfig::vit_base_patch32();

        // Load weights - try safetensors first, fall back to pytorch
        let weights_filename = repo
            .get("model.safetensors")
            .or_else(|_| repo.get("pytorch_model.bin"))
            .map_err(|e| KagamiError::embedding(format!("Weights download failed: {e}")))?;

        let vb = if weights_filename.to_string_lossy().ends_with(".safetensors") {
            unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_filename], DType::F32, &device)
                    .map_err(|e| {
                        KagamiError::embedding(format!("VarBuilder creation failed: {e}"))
                    })?
            }
        } else {
            VarBuilder::from_pth(&weights_filename, DType::F32, &device)
                .map_err(|e| KagamiError::embedding(format!("VarBuilder creation failed: {e}")))?
        };

        let vision_model = clip::vision_model::ClipVisionTransformer::new(
            vb.pp("vision_model"),
            &config.vision_config,
        )
        .map_err(|e| KagamiError::embedding(format!("Vision model load failed: {e}")))?;

        let projection_dim = config.vision_config.projection_dim;

        // CLIP models use linear layers without bias
        let vision_projection = candle_nn::linear_no_bias(
            config.vision_config.embed_dim,
            projection_dim,
            vb.pp("visual_projection"),
        )
        .map_err(|e| KagamiError::embedding(format!("Vision projection load failed: {e}")))?;

        Ok(Self {
            vision_model,
            vision_projection,
            device,
            dimension: projection_dim,
            model_name: model_name.to_string(),
            image_size: config.vision_config.image_size,
        })
    }

    /// Preprocess an image to the format expected by the CLIP vision model.
    ///
    /// Standard CLIP preprocessing: load, resize to the model's input size,
    /// convert to RGB, normalize with CLIP's mean/std, and permute to
    /// (1, C, H, W).
    fn preprocess_image(&self, image_path: &str) -> Result<Tensor> {
        use image::{DynamicImage, ImageReader};

        let img_reader = ImageReader::open(image_path)
            .map_err(|e| KagamiError::embedding(format!("Image open failed: {e}")))?
            .with_guessed_format()
            .map_err(|e| KagamiError::embedding(format!("Image format guess failed: {e}")))?;

        let img = img_reader
            .decode()
            .map_err(|e| KagamiError::embedding(format!("Image decode failed: {e}")))?;

        let img = img.resize_exact(
            self.image_size as u32,
            self.image_size as u32,
            image::imageops::FilterType::Triangle,
        );

        let img = match img {
            DynamicImage::ImageRgb8(img) => img,
            img => img.to_rgb8(),
        };

        let img_data = img.into_raw();
        let img_tensor = Tensor::from_vec(
            img_data,
            (self.image_size, self.image_size, 3),
            &self.device,
        )
        .map_err(|e| KagamiError::embedding(format!("Tensor creation failed: {e}")))?;

        // Scale to [0, 1] and normalize with CLIP's mean/std
        let mean = Tensor::new(&[0.48145466f32, 0.4578275, 0.40821073], &self.device)
            .map_err(|e| KagamiError::embedding(e.to_string()))?
            .reshape((1, 1, 3))
            .map_err(|e| KagamiError::embedding(e.to_string()))?;
        let std = Tensor::new(&[0.2686295_f32, 0.2613026, 0.2757771], &self.device)
            .map_err(|e| KagamiError::embedding(e.to_string()))?
            .reshape((1, 1, 3))
            .map_err(|e| KagamiError::embedding(e.to_string()))?;

        let normalized = img_tensor
            .to_dtype(DType::F32)
            .map_err(|e| KagamiError::embedding(e.to_string()))?
            .affine(1.0 / 255.0, 0.0)
            .map_err(|e| KagamiError::embedding(e.to_string()))?
            .broadcast_sub(&mean)
            .map_err(|e| KagamiError::embedding(e.to_string()))?
            .broadcast_div(&std)
            .map_err(|e| KagamiError::embedding(e.to_string()))?;

        // Permute to (C, H, W) and add the batch dimension
        let normalized = normalized
            .permute((2, 0, 1))
            .map_err(|e| KagamiError::embedding(e.to_string()))?
            .unsqueeze(0)
            .map_err(|e| KagamiError::embedding(e.to_string()))?;

        Ok(normalized)
    }

    /// L2-normalize a batch of embeddings.
    fn normalize(&self, tensor: &Tensor) -> Result<Tensor> {
        let norm = tensor
            .sqr()
            .map_err(|e| KagamiError::embedding(e.to_string()))?
            .sum_keepdim(1)
            .map_err(|e| KagamiError::embedding(e.to_string()))?
            .sqrt()
            .map_err(|e| KagamiError::embedding(e.to_string()))?;

        tensor
            .broadcast_div(&norm)
            .map_err(|e| KagamiError::embedding(e.to_string()))
    }
}

#[async_trait]
impl ImageEmbedder for ClipImageEmbedder {
    /// Generate an embedding vector for the given image.
    ///
    /// Runs the image through the CLIP vision tower and projection, then
    /// L2-normalizes the result.
    async fn embed(&self, image_path: &str) -> Result<Vector> {
        let image_tensor = self.preprocess_image(image_path)?;

        let vision_features = self
            .vision_model
            .forward(&image_tensor)
            .map_err(|e| KagamiError::embedding(format!("Vision model forward failed: {e}")))?;

        let projected = self
            .vision_projection
            .forward(&vision_features)
            .map_err(|e| KagamiError::embedding(format!("Vision projection failed: {e}")))?;

        let normalized = self.normalize(&projected)?;

        let vector_data: Vec<f32> = normalized
            .squeeze(0)
            .map_err(|e| KagamiError::embedding(e.to_string()))?
            .to_vec1()
            .map_err(|e| KagamiError::embedding(e.to_string()))?;

        Ok(Vector::new(vector_data))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
