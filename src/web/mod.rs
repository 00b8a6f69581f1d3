//! Web front end: upload form, search endpoint, and static file serving.

pub mod handlers;
pub mod pages;
pub mod upload;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;

use crate::config::AppConfig;
use crate::embedding::{create_embedder, ImageEmbedder};
use crate::error::Result;
use crate::index::IndexStore;
use crate::indexer::Indexer;
use crate::searcher::ImageSearcher;
use crate::storage::FileStorage;

/// Shared state behind every request handler.
pub struct AppState {
    /// Application configuration.
    pub config: AppConfig,
    /// Embedder used for queries and for lazily building the index.
    pub embedder: Arc<dyn ImageEmbedder>,
    /// Storage holding the persisted index files.
    pub storage: FileStorage,
    /// Lazily initialized searcher. `None` until the first search either
    /// loads the persisted index or builds it from the dataset.
    pub searcher: RwLock<Option<Arc<ImageSearcher>>>,
}

/// Create the application state from a configuration.
pub fn create_app_state(config: AppConfig) -> Result<Arc<AppState>> {
    config.validate()?;
    let embedder = create_embedder(&config.embedder)?;
    let storage = FileStorage::new(&config.index_dir)?;

    Ok(Arc::new(AppState {
        config,
        embedder,
        storage,
        searcher: RwLock::new(None),
    }))
}

/// Get the searcher, loading the persisted index or building it from the
/// dataset on first use.
pub async fn ensure_searcher(state: &AppState) -> Result<Arc<ImageSearcher>> {
    if let Some(searcher) = state.searcher.read().await.as_ref() {
        return Ok(Arc::clone(searcher));
    }

    let mut slot = state.searcher.write().await;
    // Another request may have initialized the slot while we waited.
    if let Some(searcher) = slot.as_ref() {
        return Ok(Arc::clone(searcher));
    }

    let store = if IndexStore::exists(&state.storage) {
        IndexStore::load(&state.storage)?
    } else {
        info!("No persisted index found, building one from the dataset");
        let indexer = Indexer::new(Arc::clone(&state.embedder), state.config.metric);
        let (store, _stats) = indexer
            .index_directory(&state.config.dataset_dir, &state.storage)
            .await?;
        store
    };

    let searcher = Arc::new(ImageSearcher::new(Arc::clone(&state.embedder), store));
    *slot = Some(Arc::clone(&searcher));
    Ok(searcher)
}

/// Create the application router with all endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index_page))
        .route("/about", get(handlers::about_page))
        .route("/search", post(handlers::search))
        .route("/health", get(handlers::health))
        .nest_service(
            "/static/dataset",
            ServeDir::new(&state.config.dataset_dir),
        )
        .nest_service(
            "/static/uploads",
            ServeDir::new(&state.config.upload_dir),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Run the web server until interrupted.
pub async fn serve(config: AppConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = create_app_state(config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
