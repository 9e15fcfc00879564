//! Share Link Resolution Integration Tests
//!
//! Runs the CLI driver against a mock HTTP server:
//! - resolving a link with layer config and extent
//! - gestures and the hash they write
//! - download and validation failures

use serde_json::json;
use visualizer_cli::{run, CliArgs, CliError, Command};
use visualizer_core::{LoadError, ValidationError, ViewerError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_with_world() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sources/world.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projection": "EPSG:3857",
            "layers": [
                {"id": "osm", "title": "OpenStreetMap", "zIndex": 0, "visible": true,
                 "opacity": 1, "source": {"type": "OSM", "options": {}}},
                {"id": "rivers", "title": "Rivers", "zIndex": 1, "visible": true,
                 "opacity": 0.8,
                 "source": {"type": "GeoJSON", "options": {"jsonFile": {"url": "rivers.geojson"}}}}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sources/broken.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"layers": []})))
        .mount(&server)
        .await;
    server
}

fn args(server: &MockServer, hash: &str, command: Option<Command>) -> CliArgs {
    CliArgs {
        hash: hash.to_string(),
        base_url: Some(format!("{}/sources/", server.uri())),
        timeout_secs: 5,
        config: None,
        json: false,
        command,
    }
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_resolve_applies_config_and_extent() {
    let server = server_with_world().await;
    let report = run(&args(
        &server,
        "#source=world.json&config=osm___5_0_0.5&extent=-20_-10_20_10",
        None,
    ))
    .await
    .expect("resolves");

    assert_eq!(report.source_url, "world.json");
    assert_eq!(report.projection.as_deref(), Some("EPSG:3857"));
    let ids: Vec<&str> = report.layers.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["osm", "rivers"]);
    assert!(!report.layers[0].visible);
    assert_eq!(report.layers[1].source_type.as_deref(), Some("Vector"));
    assert!(report
        .hash
        .starts_with("source=world.json&config=osm___5_0_0.5_-_rivers___1_1_0.8&extent="));
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_promote_writes_swapped_config() {
    let server = server_with_world().await;
    let report = run(&args(
        &server,
        "source=world.json",
        Some(Command::Promote { id: "osm".into() }),
    ))
    .await
    .expect("resolves");

    let ids: Vec<&str> = report.layers.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["osm", "rivers"]);
    assert_eq!(report.hash, "source=world.json&config=osm___1_1_1_-_rivers___0_1_0.8");
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_unknown_layer_gesture_fails() {
    let server = server_with_world().await;
    let err = run(&args(
        &server,
        "source=world.json",
        Some(Command::Hide { id: "ghost".into() }),
    ))
    .await
    .unwrap_err();
    assert!(matches!(err, CliError::Viewer(ViewerError::OutOfRange { .. })));
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_failures_surface_their_messages() {
    let server = server_with_world().await;

    let err = run(&args(&server, "source=missing.json", None)).await.unwrap_err();
    assert!(matches!(
        err,
        CliError::Viewer(ViewerError::Download(LoadError::Status { status: 404, .. }))
    ));

    let err = run(&args(&server, "source=broken.json", None)).await.unwrap_err();
    assert!(matches!(
        err,
        CliError::Viewer(ViewerError::Validation(ValidationError::NoLayers))
    ));
    assert_eq!(err.to_string(), "There is no layer to load.");

    let err = run(&args(&server, "config=osm___1_1_1", None)).await.unwrap_err();
    assert_eq!(err.to_string(), "No source url available.");
}
