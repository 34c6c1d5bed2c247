//! Integration tests for tiles served from the directory tree.
//!
//! Tests verify:
//! - Tile retrieval with content and cache headers
//! - Row-flipped fallback for TMS-ordered trees
//! - Validation errors never touch the disk
//! - Missing tile status (404 default, 204 configured)

use axum::http::StatusCode;
use axum::Router;

use sectional_tiles::archive::MbtilesSource;
use sectional_tiles::config::MissingTileStatus;
use sectional_tiles::store::FilesystemStore;
use sectional_tiles::{create_router, RouterConfig, TileBackends};

use super::test_utils::{fake_png, get, TileTree};

fn router_for(tree: &TileTree, config: RouterConfig) -> Router {
    let backends = TileBackends::<MbtilesSource>::new()
        .with_filesystem(FilesystemStore::new(tree.path()));
    create_router(backends, config.with_tracing(false))
}

fn default_router(tree: &TileTree) -> Router {
    router_for(tree, RouterConfig::new())
}

// =============================================================================
// Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_tile_retrieval_success() {
    let tile = fake_png("chicago-5-10-3");
    let tree = TileTree::new().with_tile("chicago", 5, 10, 3, &tile);
    let router = default_router(&tree);

    let response = get(&router, "/tiles/chicago/5/10/3.png").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("image/png"));
    assert_eq!(
        response.header("cache-control"),
        Some("public, max-age=31536000, immutable")
    );
    assert_eq!(response.header("x-tile-fallback"), Some("false"));
    assert_eq!(response.body.as_ref(), tile.as_slice());
}

#[tokio::test]
async fn test_tile_without_extension() {
    let tile = fake_png("no-ext");
    let tree = TileTree::new().with_tile("chicago", 5, 10, 3, &tile);
    let router = default_router(&tree);

    let response = get(&router, "/tiles/chicago/5/10/3").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_ref(), tile.as_slice());
}

#[tokio::test]
async fn test_fallback_to_flipped_row() {
    // Tree written in TMS order: XYZ row 3 at zoom 5 lives in file 28.png
    let tile = fake_png("tms-row-28");
    let tree = TileTree::new().with_tile("chicago", 5, 10, 28, &tile);
    let router = default_router(&tree);

    let response = get(&router, "/tiles/chicago/5/10/3.png").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-tile-fallback"), Some("true"));
    assert_eq!(response.body.as_ref(), tile.as_slice());
}

#[tokio::test]
async fn test_primary_preferred_over_fallback() {
    let tree = TileTree::new()
        .with_tile("chicago", 5, 10, 3, &fake_png("primary"))
        .with_tile("chicago", 5, 10, 28, &fake_png("fallback"));
    let router = default_router(&tree);

    let response = get(&router, "/tiles/chicago/5/10/3.png").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-tile-fallback"), Some("false"));
    assert_eq!(response.body.as_ref(), fake_png("primary").as_slice());
}

#[tokio::test]
async fn test_zoom_zero_tile() {
    let tile = fake_png("world");
    let tree = TileTree::new().with_tile("chicago", 0, 0, 0, &tile);
    let router = default_router(&tree);

    let response = get(&router, "/tiles/chicago/0/0/0.png").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-tile-fallback"), Some("false"));
}

#[tokio::test]
async fn test_repeated_requests_identical() {
    let tile = fake_png("stable");
    let tree = TileTree::new().with_tile("chicago", 7, 33, 47, &tile);
    let router = default_router(&tree);

    let first = get(&router, "/tiles/chicago/7/33/47.png").await;
    let second = get(&router, "/tiles/chicago/7/33/47.png").await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.status, second.status);
    assert_eq!(first.body, second.body);
    for name in ["content-type", "cache-control", "x-tile-fallback"] {
        assert!(first.header(name).is_some(), "{}", name);
        assert_eq!(first.header(name), second.header(name), "{}", name);
    }
}

#[tokio::test]
async fn test_custom_cache_max_age() {
    let tree = TileTree::new().with_tile("chicago", 1, 0, 0, &fake_png("t"));
    let router = router_for(&tree, RouterConfig::new().with_cache_max_age(600));

    let response = get(&router, "/tiles/chicago/1/0/0.png").await;

    assert_eq!(
        response.header("cache-control"),
        Some("public, max-age=600, immutable")
    );
}

// =============================================================================
// Missing Tiles
// =============================================================================

#[tokio::test]
async fn test_missing_tile_default_not_found() {
    let tree = TileTree::new().with_tile("chicago", 5, 10, 3, &fake_png("t"));
    let router = default_router(&tree);

    let response = get(&router, "/tiles/chicago/5/11/3.png").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = get(&router, "/tiles/seattle/5/10/3.png").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_tile_no_content() {
    let tree = TileTree::new();
    let router = router_for(
        &tree,
        RouterConfig::new().with_missing_tile_status(MissingTileStatus::NoContent),
    );

    let response = get(&router, "/tiles/chicago/5/10/3.png").await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_invalid_coordinates_rejected() {
    // A file literally named "abc" must never be served for a garbage x
    let tree = TileTree::new();
    std::fs::create_dir_all(tree.path().join("chicago/5/abc")).unwrap();
    std::fs::write(tree.path().join("chicago/5/abc/3.png"), fake_png("x")).unwrap();
    let router = default_router(&tree);

    for uri in [
        "/tiles/chicago/-1/0/0.png",
        "/tiles/chicago/5/abc/3.png",
        "/tiles/chicago/5/10/3.jpg",
        "/tiles/chicago/5/10/+3.png",
        "/tiles/chicago/31/0/0.png",
        "/tiles/chicago/5/32/3.png",
        "/tiles/chicago/5/10/32.png",
    ] {
        let response = get(&router, uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);

        let json = response.json();
        assert_eq!(json["error"], "invalid_coordinates", "{}", uri);
        assert_eq!(json["status"], 400);
    }
}

#[tokio::test]
async fn test_chart_path_traversal_rejected() {
    let tree = TileTree::new().with_tile("chicago", 0, 0, 0, &fake_png("t"));
    let router = default_router(&tree);

    for uri in [
        "/tiles/%2E%2E/0/0/0.png",
        "/tiles/..%2Fchicago/0/0/0.png",
        "/tiles/chi.cago/0/0/0.png",
    ] {
        let response = get(&router, uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(response.json()["error"], "invalid_chart", "{}", uri);
    }
}

#[tokio::test]
async fn test_archive_routes_absent_without_archive_backend() {
    let tree = TileTree::new().with_tile("chicago", 0, 0, 0, &fake_png("t"));
    let router = default_router(&tree);

    let response = get(&router, "/api/sectionals/chicago/tiles/0/0/0.png").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.is_empty());
}
