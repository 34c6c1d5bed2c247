//! Sectional Tiles - A tile server for aeronautical sectional charts.
//!
//! This binary starts the HTTP server and configures all components.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sectional_tiles::{
    archive::{HandleCache, MbtilesSource},
    config::Config,
    server::{create_router, RouterConfig, TileBackends},
    store::{ArchiveStore, FilesystemStore},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Sectional Tiles v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");

    let mut backends = TileBackends::<MbtilesSource>::new();

    if let Some(ref dir) = config.tiles_dir {
        info!("  Tile tree: {}", dir.display());
        report_charts(dir, None).await;
        backends = backends.with_filesystem(FilesystemStore::new(dir));
    }

    if let Some(ref dir) = config.archive_dir {
        info!("  Archives: {}/*.{}", dir.display(), config.archive_ext);
        info!(
            "  Archive open timeout: {}s, retry backoff: {}s",
            config.open_timeout_secs, config.open_retry_backoff_secs
        );
        report_charts(dir, Some(&config.archive_ext)).await;

        let source = MbtilesSource::with_extension(dir, &config.archive_ext);
        let handles =
            HandleCache::with_settings(source, config.open_timeout(), config.open_retry_backoff());
        backends = backends.with_archive(ArchiveStore::new(handles));
    }

    info!(
        "  Cache-Control max-age: {}s, missing tiles: {}",
        config.cache_max_age,
        config.missing_tile_status.status_code()
    );
    if config.cors_origins.is_empty() {
        info!("  CORS: disabled");
    } else {
        info!("  CORS origins: {}", config.cors_origins.join(", "));
    }

    let router = create_router(backends, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    if config.tiles_dir.is_some() {
        info!("    curl http://{}/tiles/<chart>/0/0/0.png", addr);
    }
    if config.archive_dir.is_some() {
        info!("    curl http://{}/api/sectionals/<chart>/metadata", addr);
        info!("    curl http://{}/api/sectionals/<chart>/tiles/0/0/0.png", addr);
    }
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Count the charts under `dir` and log them.
///
/// Without an extension every subdirectory is a chart; with one, every file
/// carrying it is. Failure to list is only a warning since charts may be
/// added while the server runs.
async fn report_charts(dir: &Path, extension: Option<&str>) {
    match count_charts(dir, extension).await {
        Ok(0) => warn!("  No charts found in {}", dir.display()),
        Ok(count) => info!("  Found {} chart(s)", count),
        Err(e) => warn!("  Could not list {}: {}", dir.display(), e),
    }
}

async fn count_charts(dir: &Path, extension: Option<&str>) -> std::io::Result<usize> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut count = 0;

    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        let is_chart = match extension {
            None => file_type.is_dir(),
            Some(ext) => {
                file_type.is_file()
                    && entry.path().extension().and_then(|e| e.to_str()) == Some(ext)
            }
        };
        if is_chart {
            count += 1;
        }
    }

    Ok(count)
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "sectional_tiles=debug,tower_http=debug"
    } else {
        "sectional_tiles=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    RouterConfig::new()
        .with_cors_origins(config.cors_origins.clone())
        .with_cache_max_age(config.cache_max_age)
        .with_missing_tile_status(config.missing_tile_status)
        .with_tracing(!config.no_tracing)
}
