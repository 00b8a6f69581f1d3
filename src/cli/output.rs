//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{KagamiArgs, OutputFormat};
use crate::error::Result;

/// A result that can be reported to the user in human or JSON form.
pub trait CliReport: Serialize {
    /// Print the result in human-readable form.
    fn print_human(&self);
}

/// Output a result in the format selected on the command line.
pub fn output_result<T: CliReport>(message: &str, result: &T, args: &KagamiArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                println!("{message}");
                println!();
            }
            result.print_human();
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &KagamiArgs) -> Result<()> {
    let output = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{output}");
    Ok(())
}

/// Result structure for index builds.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexingReport {
    pub dataset: String,
    pub index_path: String,
    pub indexed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

impl CliReport for IndexingReport {
    fn print_human(&self) {
        println!("Dataset:   {}", self.dataset);
        println!("Index:     {}", self.index_path);
        println!("Indexed:   {}", self.indexed);
        println!("Skipped:   {}", self.skipped);
        println!("Duration:  {} ms", self.duration_ms);
    }
}

/// One row of a search result.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchReportHit {
    pub rank: usize,
    pub path: String,
    pub distance: f32,
    pub similarity: f32,
}

/// Result structure for search operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchReport {
    pub query_image: String,
    pub hits: Vec<SearchReportHit>,
    pub duration_ms: u64,
}

impl CliReport for SearchReport {
    fn print_human(&self) {
        println!("Query: {}", self.query_image);
        println!();

        if self.hits.is_empty() {
            println!("No results.");
        } else {
            for hit in &self.hits {
                println!(
                    "  {}. {} (similarity: {:.1}%, distance: {:.4})",
                    hit.rank, hit.path, hit.similarity, hit.distance
                );
            }
        }

        println!();
        println!("Search time: {} ms", self.duration_ms);
    }
}

/// Index statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsReport {
    pub index_path: String,
    pub indexed_images: usize,
    pub dimension: usize,
    pub metric: String,
    pub index_size_bytes: u64,
    pub paths_size_bytes: u64,
}

impl CliReport for StatsReport {
    fn print_human(&self) {
        println!("Index:          {}", self.index_path);
        println!("Images:         {}", self.indexed_images);
        println!("Dimension:      {}", self.dimension);
        println!("Metric:         {}", self.metric);
        println!("Index blob:     {} bytes", self.index_size_bytes);
        println!("Path list blob: {} bytes", self.paths_size_bytes);
    }
}

/// Result structure for sample downloads.
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchReport {
    pub dataset: String,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl CliReport for FetchReport {
    fn print_human(&self) {
        println!("Dataset:    {}", self.dataset);
        println!("Downloaded: {}", self.downloaded);
        println!("Skipped:    {}", self.skipped);
        println!("Failed:     {}", self.failed);
    }
}
