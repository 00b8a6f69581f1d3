//! Command line argument parsing for the Kagami CLI using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{AppConfig, EmbedderConfig, EmbedderKind};
use crate::error::Result;

/// Kagami - reverse image search
#[derive(Parser, Debug, Clone)]
#[command(name = "kagami")]
#[command(about = "A small reverse image search service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct KagamiArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl KagamiArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Output formats for CLI results
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build the image index from a dataset directory
    Index(IndexArgs),

    /// Search an existing index with a query image
    Search(SearchArgs),

    /// Run the web front end
    Serve(ServeArgs),

    /// Show index statistics
    Stats(StatsArgs),

    /// Download sample images into the dataset directory
    #[command(name = "fetch-samples")]
    FetchSamples(FetchSamplesArgs),
}

/// Embedder selection shared by commands that embed images
#[derive(Args, Debug, Clone)]
pub struct EmbedderArgs {
    /// Embedder to use (histogram or clip)
    #[arg(long, default_value = "histogram", env = "KAGAMI_EMBEDDER")]
    pub embedder: String,

    /// HuggingFace model identifier for the clip embedder
    #[arg(long, default_value = "openai/clip-vit-base-patch32")]
    pub clip_model: String,

    /// Bins per channel for the histogram embedder
    #[arg(long, default_value = "8")]
    pub histogram_bins: usize,
}

impl EmbedderArgs {
    /// Convert the flags into an embedder configuration.
    pub fn to_config(&self) -> Result<EmbedderConfig> {
        Ok(EmbedderConfig {
            kind: EmbedderKind::parse_str(&self.embedder)?,
            clip_model: self.clip_model.clone(),
            histogram_bins: self.histogram_bins,
        })
    }
}

/// Arguments for building the index
#[derive(Parser, Debug, Clone)]
pub struct IndexArgs {
    /// Path to the dataset directory
    #[arg(short, long, default_value = "static/dataset")]
    pub dataset: PathBuf,

    /// Path to the index directory
    #[arg(short, long, default_value = "static/index")]
    pub index: PathBuf,

    /// Distance metric (euclidean or cosine)
    #[arg(long, default_value = "euclidean")]
    pub metric: String,

    /// Rebuild even if an index already exists
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub embedder: EmbedderArgs,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Path to the query image
    #[arg(value_name = "QUERY_IMAGE")]
    pub query_image: PathBuf,

    /// Path to the index directory
    #[arg(short, long, default_value = "static/index")]
    pub index: PathBuf,

    /// Number of results to return
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    #[command(flatten)]
    pub embedder: EmbedderArgs,
}

/// Arguments for the web server
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, default_value = "127.0.0.1", env = "KAGAMI_HOST")]
    pub host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "8080", env = "KAGAMI_PORT")]
    pub port: u16,

    /// Path to the dataset directory
    #[arg(short, long, default_value = "static/dataset")]
    pub dataset: PathBuf,

    /// Path to the index directory
    #[arg(short, long, default_value = "static/index")]
    pub index: PathBuf,

    /// Directory where uploaded query images are stored
    #[arg(short, long, default_value = "static/uploads")]
    pub uploads: PathBuf,

    /// Number of results shown per search
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    /// Maximum upload size in bytes
    #[arg(long, default_value = "16777216")]
    pub max_upload_bytes: usize,

    /// Distance metric (euclidean or cosine)
    #[arg(long, default_value = "euclidean")]
    pub metric: String,

    #[command(flatten)]
    pub embedder: EmbedderArgs,
}

impl ServeArgs {
    /// Convert the flags into an application configuration.
    pub fn to_config(&self) -> Result<AppConfig> {
        Ok(AppConfig {
            dataset_dir: self.dataset.clone(),
            index_dir: self.index.clone(),
            upload_dir: self.uploads.clone(),
            top_k: self.top_k,
            max_upload_bytes: self.max_upload_bytes,
            host: self.host.clone(),
            port: self.port,
            metric: crate::vector::DistanceMetric::parse_str(&self.metric)?,
            embedder: self.embedder.to_config()?,
        })
    }
}

/// Arguments for showing index statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Path to the index directory
    #[arg(short, long, default_value = "static/index")]
    pub index: PathBuf,
}

/// Arguments for downloading sample images
#[derive(Parser, Debug, Clone)]
pub struct FetchSamplesArgs {
    /// Path to the dataset directory
    #[arg(short, long, default_value = "static/dataset")]
    pub dataset: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let args = KagamiArgs::parse_from(["kagami", "stats"]);
        assert_eq!(args.verbosity(), 1);

        let args = KagamiArgs::parse_from(["kagami", "-vv", "stats"]);
        assert_eq!(args.verbosity(), 2);

        let args = KagamiArgs::parse_from(["kagami", "--quiet", "-v", "stats"]);
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_index_defaults() {
        let args = KagamiArgs::parse_from(["kagami", "index"]);
        match args.command {
            Command::Index(index_args) => {
                assert_eq!(index_args.dataset, PathBuf::from("static/dataset"));
                assert_eq!(index_args.index, PathBuf::from("static/index"));
                assert!(!index_args.force);
                assert_eq!(index_args.embedder.histogram_bins, 8);
            }
            _ => panic!("Expected index command"),
        }
    }

    #[test]
    fn test_serve_args_to_config() {
        let args = KagamiArgs::parse_from(["kagami", "serve", "--port", "9000"]);
        match args.command {
            Command::Serve(serve_args) => {
                let config = serve_args.to_config().unwrap();
                assert_eq!(config.port, 9000);
                assert!(config.validate().is_ok());
            }
            _ => panic!("Expected serve command"),
        }
    }
}
