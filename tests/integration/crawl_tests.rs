//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the place-search provider and
//! drive the full batch loop end-to-end, including interruption and resume.

use plan_ville::checkpoint::CheckpointStore;
use plan_ville::config::{
    AreaConfig, Config, CostConfig, GridConfig, OutputConfig, SearchConfig,
};
use plan_ville::crawler::Coordinator;
use plan_ville::grid::{generate_grid, GridPoint};
use plan_ville::storage::{RunStatus, SqliteStorage, Storage};
use plan_ville::ScanError;
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const CENTER_LAT: f64 = 40.7831;
const CENTER_LNG: f64 = -73.9712;
const RADIUS_KM: f64 = 5.0;
const SPACING_M: f64 = 900.0;

/// Matches requests whose `location` query parameter is in the set
struct LocationIn(HashSet<String>);

impl LocationIn {
    fn points(points: &[GridPoint]) -> Self {
        Self(points.iter().map(GridPoint::location).collect())
    }
}

impl Match for LocationIn {
    fn matches(&self, request: &Request) -> bool {
        location_of(request).is_some_and(|location| self.0.contains(&location))
    }
}

fn location_of(request: &Request) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(key, _)| key == "location")
        .map(|(_, value)| value.into_owned())
}

fn test_grid() -> Vec<GridPoint> {
    generate_grid(CENTER_LAT, CENTER_LNG, RADIUS_KM, SPACING_M)
}

/// Creates a test configuration pointing at the given provider
fn create_test_config(endpoint: &str, dir: &Path) -> Config {
    Config {
        area: AreaConfig {
            center_lat: CENTER_LAT,
            center_lng: CENTER_LNG,
            radius_km: RADIUS_KM,
        },
        grid: GridConfig {
            spacing_meters: SPACING_M,
        },
        search: SearchConfig {
            endpoint: endpoint.to_string(),
            radius_meters: 100,
            field_mask: "places.id,places.displayName".to_string(),
            calls_per_minute: 100_000,
            page_cooldown_ms: 0,
            batch_size: 50,
            batch_pause_ms: 0,
            api_key_env: "GOOGLE_API_KEY".to_string(),
            request_timeout_secs: 5,
        },
        cost: CostConfig::default(),
        output: OutputConfig {
            database_path: dir.join("places.db").display().to_string(),
            checkpoint_path: dir.join("checkpoint.json").display().to_string(),
        },
    }
}

/// Responds with one place whose id is derived from the request location
async fn mount_place_per_location(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(|request: &Request| {
            let location = location_of(request).unwrap_or_default();
            ResponseTemplate::new(200).set_body_json(json!({
                "places": [{
                    "id": format!("place-{}", location),
                    "displayName": {"text": "Corner Shop"},
                    "primaryType": "store",
                    "rating": 4.2,
                    "userRatingCount": 10
                }]
            }))
        })
        .mount(server)
        .await;
}

async fn requested_locations(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(location_of)
        .collect()
}

#[tokio::test]
async fn test_full_crawl_covers_grid() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_place_per_location(&server).await;

    let config = create_test_config(&server.uri(), dir.path());
    let mut coordinator = Coordinator::new(config, "test-key", false).unwrap();
    let total = coordinator.grid().len();
    assert!(total > 100, "expected a grid larger than two batches");

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.points_searched, total);
    assert_eq!(requested_locations(&server).await.len(), total);

    let storage = SqliteStorage::new(&dir.path().join("places.db")).unwrap();
    assert_eq!(storage.count_places().unwrap(), total as u64);
    assert_eq!(storage.count_searched(100).unwrap(), total as u64);
    assert_eq!(
        storage.get_latest_run().unwrap().unwrap().status,
        RunStatus::Completed
    );
}

#[tokio::test]
async fn test_ledger_prevents_refetch_without_checkpoint() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_place_per_location(&server).await;
    let config = create_test_config(&server.uri(), dir.path());

    let mut first = Coordinator::new(config.clone(), "test-key", false).unwrap();
    let total = first.grid().len();
    first.run().await.unwrap();
    drop(first);

    // Lose the checkpoint entirely
    std::fs::remove_file(dir.path().join("checkpoint.json")).unwrap();

    let mut second = Coordinator::new(config, "test-key", false).unwrap();
    assert_eq!(second.checkpoint().processed_count(), 0);

    let report = second.run().await.unwrap();

    assert_eq!(report.points_searched, 0);
    assert_eq!(report.points_skipped, total);
    assert_eq!(requested_locations(&server).await.len(), total);

    // Ledger hits are folded into the new checkpoint
    assert_eq!(second.checkpoint().processed_count(), total);
}

#[tokio::test]
async fn test_partial_batch_failure_keeps_offset_and_successes() {
    let dir = TempDir::new().unwrap();
    let grid = test_grid();
    let failing = grid[60];

    let flaky = MockServer::start().await;
    Mock::given(method("GET"))
        .and(LocationIn::points(&[failing]))
        .respond_with(ResponseTemplate::new(500))
        .mount(&flaky)
        .await;
    mount_place_per_location(&flaky).await;

    let config = create_test_config(&flaky.uri(), dir.path());
    let mut first = Coordinator::new(config.clone(), "test-key", false).unwrap();
    let err = first.run().await.unwrap_err();

    match &err {
        ScanError::BatchFailed { offset, failed, .. } => {
            assert_eq!(*offset, 50);
            assert_eq!(*failed, 1);
        }
        other => panic!("unexpected error: {}", other),
    }
    drop(first);

    // Persisted state: offset unchanged, every succeeded point recorded
    let saved = CheckpointStore::new(dir.path().join("checkpoint.json")).load();
    let batch_end = 100usize.min(grid.len());
    assert_eq!(saved.batch_offset, 50);
    assert_eq!(saved.processed_count(), batch_end - 1);
    assert!(!saved.is_processed(&failing));
    assert!(grid[..batch_end]
        .iter()
        .filter(|p| **p != failing)
        .all(|p| saved.is_processed(p)));

    // Resume against a healthy provider
    let healthy = MockServer::start().await;
    mount_place_per_location(&healthy).await;
    let mut config = config;
    config.search.endpoint = healthy.uri();

    let mut second = Coordinator::new(config, "test-key", false).unwrap();
    let report = second.run().await.unwrap();

    let resumed: HashSet<String> = requested_locations(&healthy).await.into_iter().collect();
    let expected: HashSet<String> = std::iter::once(failing)
        .chain(grid[batch_end..].iter().copied())
        .map(|p| p.location())
        .collect();

    assert_eq!(resumed, expected);
    assert_eq!(report.points_searched, expected.len());
    assert_eq!(second.checkpoint().processed_count(), grid.len());
}

#[tokio::test]
async fn test_resume_at_offset_does_not_requery_first_batch() {
    let dir = TempDir::new().unwrap();
    let grid = test_grid();

    // First run: batch 0 succeeds, every point of batch 1 fails
    let first_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(LocationIn::points(&grid[50..]))
        .respond_with(ResponseTemplate::new(503))
        .mount(&first_server)
        .await;
    mount_place_per_location(&first_server).await;

    let config = create_test_config(&first_server.uri(), dir.path());
    let mut first = Coordinator::new(config.clone(), "test-key", false).unwrap();
    assert!(first.run().await.is_err());
    assert_eq!(first.checkpoint().batch_offset, 50);
    assert_eq!(first.checkpoint().processed_count(), 50);
    drop(first);

    let second_server = MockServer::start().await;
    mount_place_per_location(&second_server).await;
    let mut config = config;
    config.search.endpoint = second_server.uri();

    let mut second = Coordinator::new(config, "test-key", false).unwrap();
    assert_eq!(second.checkpoint().batch_offset, 50);
    second.run().await.unwrap();

    let first_batch: HashSet<String> = grid[..50].iter().map(GridPoint::location).collect();
    let requested = requested_locations(&second_server).await;

    assert_eq!(requested.len(), grid.len() - 50);
    assert!(requested.iter().all(|l| !first_batch.contains(l)));
}

#[tokio::test]
async fn test_places_are_upserted_not_duplicated() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "places": [
                {"id": "same-1", "displayName": {"text": "Bakery"}, "primaryType": "bakery"},
                {"id": "same-2"}
            ]
        })))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dir.path());
    let mut coordinator = Coordinator::new(config, "test-key", false).unwrap();
    coordinator.run().await.unwrap();
    drop(coordinator);

    let storage = SqliteStorage::new(&dir.path().join("places.db")).unwrap();
    assert_eq!(storage.count_places().unwrap(), 2);

    let bakery = storage.get_place("same-1").unwrap().unwrap();
    assert_eq!(bakery.name, "Bakery");
    assert_eq!(bakery.category, "bakery");

    let bare = storage.get_place("same-2").unwrap().unwrap();
    assert_eq!(bare.name, "unknown");
    assert_eq!(bare.address, "unknown");
    assert!(bare.rating.is_none());
}

#[tokio::test]
async fn test_fresh_keeps_ledger() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_place_per_location(&server).await;
    let config = create_test_config(&server.uri(), dir.path());

    let mut first = Coordinator::new(config.clone(), "test-key", false).unwrap();
    let total = first.grid().len();
    first.run().await.unwrap();
    drop(first);

    let mut fresh = Coordinator::new(config, "test-key", true).unwrap();
    assert_eq!(fresh.checkpoint().batch_offset, 0);

    let report = fresh.run().await.unwrap();
    assert_eq!(report.points_skipped, total);
    assert_eq!(requested_locations(&server).await.len(), total);
}
