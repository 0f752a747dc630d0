use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use availability_server::cache::{CacheConfig, CachedTimetableStore};
use availability_server::config::ServerConfig;
use availability_server::download::{DocumentDownloader, DownloaderConfig};
use availability_server::harvest::Harvester;
use availability_server::query::{AvailabilityQueryEngine, QueryConfig};
use availability_server::store::FileTimetableStore;
use availability_server::web::{AppState, SharedStore, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    // File store behind a short-lived lookup cache
    let files = FileTimetableStore::new(&config.data_dir).with_tag(&config.store_tag);
    let store: SharedStore = Arc::new(CachedTimetableStore::new(files, &CacheConfig::default()));

    let query_config = QueryConfig::default().with_utc_offset_secs(config.utc_offset_secs);
    let engine = AvailabilityQueryEngine::new(store.clone(), query_config);

    let downloader_config = DownloaderConfig::new().with_timeout(config.download_timeout_secs);
    let downloader = DocumentDownloader::new(downloader_config).expect("Failed to create HTTP client");
    let harvester = Harvester::new(downloader, store);

    let app = create_router(AppState::new(engine, harvester));

    let addr = config.bind_addr;
    info!(%addr, data_dir = %config.data_dir.display(), "facility availability server listening");
    info!("  GET  /health                                   - Health check");
    info!("  GET  /api/availability                         - Point or period availability");
    info!("  GET  /api/timetable/:facility/:year/:month     - Latest stored timetable");
    info!("  POST /api/timetable/harvest                    - Harvest published timetables");
    info!("  POST /api/timetable/compact                    - Drop superseded timetables");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
