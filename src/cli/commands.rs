//! Command implementations for the Kagami CLI.

use std::time::Instant;

use tokio::runtime::Runtime;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::embedding::create_embedder;
use crate::error::{KagamiError, Result};
use crate::fetch::fetch_samples;
use crate::index::store::{INDEX_FILE, PATHS_FILE};
use crate::index::IndexStore;
use crate::indexer::Indexer;
use crate::searcher::{similarity_scores, ImageSearcher};
use crate::storage::{FileStorage, Storage};
use crate::vector::DistanceMetric;
use crate::web;

/// Execute a CLI command.
pub fn execute_command(args: KagamiArgs) -> Result<()> {
    match &args.command {
        Command::Index(index_args) => build_index(index_args.clone(), &args),
        Command::Search(search_args) => search_index(search_args.clone(), &args),
        Command::Serve(serve_args) => serve(serve_args.clone(), &args),
        Command::Stats(stats_args) => show_stats(stats_args.clone(), &args),
        Command::FetchSamples(fetch_args) => fetch_sample_images(fetch_args.clone(), &args),
    }
}

fn runtime() -> Result<Runtime> {
    Ok(Runtime::new()?)
}

/// Build the image index from a dataset directory.
fn build_index(args: IndexArgs, cli_args: &KagamiArgs) -> Result<()> {
    if cli_args.verbosity() > 0 {
        println!("Indexing images from: {}", args.dataset.display());
    }

    let storage = FileStorage::new(&args.index)?;
    if IndexStore::exists(&storage) && !args.force {
        return Err(KagamiError::InvalidOperation(
            "Index already exists. Use --force to rebuild.".to_string(),
        ));
    }

    let embedder = create_embedder(&args.embedder.to_config()?)?;
    let metric = DistanceMetric::parse_str(&args.metric)?;
    let indexer = Indexer::new(embedder, metric);

    let (_store, stats) = runtime()?.block_on(indexer.index_directory(&args.dataset, &storage))?;

    output_result(
        "Index built successfully",
        &IndexingReport {
            dataset: args.dataset.to_string_lossy().to_string(),
            index_path: args.index.to_string_lossy().to_string(),
            indexed: stats.indexed,
            skipped: stats.skipped,
            duration_ms: stats.duration_ms,
        },
        cli_args,
    )
}

/// Search an existing index with a query image.
fn search_index(args: SearchArgs, cli_args: &KagamiArgs) -> Result<()> {
    let storage = FileStorage::new(&args.index)?;
    let store = IndexStore::load(&storage)?;
    let embedder = create_embedder(&args.embedder.to_config()?)?;
    let searcher = ImageSearcher::new(embedder, store);

    let query_image = args.query_image.to_string_lossy().to_string();
    let start = Instant::now();
    let hits = runtime()?.block_on(searcher.search(&query_image, args.top_k))?;
    let duration_ms = start.elapsed().as_millis() as u64;

    let scores = similarity_scores(&hits);
    let hits = hits
        .iter()
        .zip(scores)
        .enumerate()
        .map(|(i, (hit, similarity))| SearchReportHit {
            rank: i + 1,
            path: hit.path.clone(),
            distance: hit.distance,
            similarity,
        })
        .collect();

    output_result(
        "Search completed",
        &SearchReport {
            query_image,
            hits,
            duration_ms,
        },
        cli_args,
    )
}

/// Run the web front end.
fn serve(args: ServeArgs, cli_args: &KagamiArgs) -> Result<()> {
    let config = args.to_config()?;
    if cli_args.verbosity() > 0 {
        println!("Starting server on http://{}:{}", config.host, config.port);
    }
    runtime()?.block_on(web::serve(config))
}

/// Show index statistics.
fn show_stats(args: StatsArgs, cli_args: &KagamiArgs) -> Result<()> {
    let storage = FileStorage::new(&args.index)?;
    let store = IndexStore::load(&storage)?;

    output_result(
        "Index statistics",
        &StatsReport {
            index_path: args.index.to_string_lossy().to_string(),
            indexed_images: store.len(),
            dimension: store.dimension(),
            metric: store.metric().name().to_string(),
            index_size_bytes: storage.file_size(INDEX_FILE)?,
            paths_size_bytes: storage.file_size(PATHS_FILE)?,
        },
        cli_args,
    )
}

/// Download sample images into the dataset directory.
fn fetch_sample_images(args: FetchSamplesArgs, cli_args: &KagamiArgs) -> Result<()> {
    let stats = runtime()?.block_on(fetch_samples(&args.dataset))?;

    output_result(
        "Sample images fetched",
        &FetchReport {
            dataset: args.dataset.to_string_lossy().to_string(),
            downloaded: stats.downloaded,
            skipped: stats.skipped,
            failed: stats.failed,
        },
        cli_args,
    )
}
