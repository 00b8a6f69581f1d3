//! Sample dataset downloader.
//!
//! Populates the dataset directory with a small set of free Unsplash images
//! spanning several visual categories, so the demo has something to search
//! against out of the box.

use std::path::Path;

use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{KagamiError, Result};

/// Sample image URLs (nature, architecture, food, people).
pub const SAMPLE_IMAGE_URLS: &[&str] = &[
    // Nature
    "https://images.unsplash.com/photo-1501854140801-50d01698950b?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1441974231531-c6227db76b6e?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1470071459604-3b5ec3a7fe05?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1472214103451-9374bd1c798e?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1469474968028-56623f02e42e?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    // Urban/Architecture
    "https://images.unsplash.com/photo-1480714378408-67cf0d13bc1b?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1449824913935-59a10b8d2000?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1444723121867-7a241cacace9?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1490644658840-3f2e3f8c5625?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1496588152823-86ff7695e68f?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    // Food
    "https://images.unsplash.com/photo-1482049016688-2d3e1b311543?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1484723091739-30a097e8f929?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1498837167922-ddd27525d352?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1504674900247-0877df9cc836?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1473093295043-cdd812d0e601?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    // People
    "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1494790108377-be9c29b29330?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1504257432389-52343af06ae3?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1501196354995-cbb51c65aaea?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1463453091185-61582044d556?ixlib=rb-1.2.1&auto=format&fit=crop&w=600&q=80",
];

/// Statistics from a fetch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchStats {
    /// Number of images downloaded.
    pub downloaded: usize,
    /// Number of images already present and left untouched.
    pub skipped: usize,
    /// Number of downloads that failed.
    pub failed: usize,
}

/// Download the sample images into `dataset_dir`.
///
/// Files that already exist are skipped; individual download failures are
/// logged and counted but do not abort the run.
pub async fn fetch_samples(dataset_dir: &Path) -> Result<FetchStats> {
    std::fs::create_dir_all(dataset_dir)
        .map_err(|e| KagamiError::storage(format!("Failed to create dataset directory: {e}")))?;

    let client = Client::new();
    let mut stats = FetchStats {
        downloaded: 0,
        skipped: 0,
        failed: 0,
    };

    info!(
        "Downloading {} sample images to {}",
        SAMPLE_IMAGE_URLS.len(),
        dataset_dir.display()
    );

    for (i, url) in SAMPLE_IMAGE_URLS.iter().enumerate() {
        let path = dataset_dir.join(format!("sample_{}.jpg", i + 1));
        if path.exists() {
            stats.skipped += 1;
            continue;
        }

        match download_image(&client, url, &path).await {
            Ok(()) => stats.downloaded += 1,
            Err(e) => {
                warn!("Failed to download {url}: {e}");
                stats.failed += 1;
            }
        }
    }

    info!(
        "Sample fetch finished: {} downloaded, {} skipped, {} failed",
        stats.downloaded, stats.skipped, stats.failed
    );
    Ok(stats)
}

async fn download_image(client: &Client, url: &str, path: &Path) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| KagamiError::other(format!("Request failed: {e}")))?
        .error_for_status()
        .map_err(|e| KagamiError::other(format!("Request failed: {e}")))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| KagamiError::other(format!("Response read failed: {e}")))?;

    tokio::fs::write(path, &bytes).await?;
    Ok(())
}
