//! # Kagami
//!
//! A small reverse image search service: index a directory of images with a
//! pretrained embedder, then find the closest matches for an uploaded query
//! image through a web form or the CLI.
//!
//! ## Features
//!
//! - Pluggable image embedders (CLIP via Candle, offline color histogram)
//! - Exact nearest-neighbor search over a flat vector index
//! - Two-file index persistence (vector blob + path list)
//! - Web front end with upload form and similarity-scored results

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod fetch;
pub mod index;
pub mod indexer;
pub mod searcher;
pub mod storage;
pub mod vector;
pub mod web;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
