//! # Map Visualizer CLI
//!
//! Headless driver for the map visualizer. Resolves a share-link hash
//! against the real source document, prints the resulting layer stack and
//! the canonical hash, and can apply a layer list gesture to show the hash
//! it would write.
//!
//! ## Usage
//!
//! ```bash
//! map-visualizer --hash '#source=world.json&config=osm___1_1_0.5' \
//!     --base-url https://maps.example.com/ resolve
//! map-visualizer --hash '#source=https://maps.example.com/world.json' promote osm
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `HttpLoader` - `SourceLoader` over reqwest
//! - `run` - drives a `SyncController` with the headless map backend

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod loader;

pub use loader::HttpLoader;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use visualizer_core::config::fields;
use visualizer_core::{
    extent, hash, CycleOutcome, Extent, Gesture, HashStore, HeadlessMap, MemoryHashStore,
    MessageLog, RecordingView, SyncController, ViewerConfig, ViewerError,
};

/// Command-line arguments for map-visualizer.
#[derive(Debug, Clone, Parser)]
#[command(name = "map-visualizer")]
#[command(about = "Resolve Map Visualizer share links headlessly")]
#[command(version)]
pub struct CliArgs {
    /// URL hash to resolve, with or without the leading `#`
    #[arg(long, env = "MAP_VISUALIZER_HASH", default_value = "")]
    pub hash: String,

    /// Base URL for relative source references (e.g., <https://maps.example.com/>)
    #[arg(long, env = "MAP_VISUALIZER_BASE_URL")]
    pub base_url: Option<String>,

    /// Download timeout in seconds
    #[arg(long, env = "MAP_VISUALIZER_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Path to a JSON viewer config
    #[arg(long, env = "MAP_VISUALIZER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// What to do once the source is loaded
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Gestures that can be applied after loading.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Only load and print (default)
    Resolve,
    /// Move a layer up one step
    Promote {
        /// Layer id
        id: String,
    },
    /// Move a layer down one step
    Demote {
        /// Layer id
        id: String,
    },
    /// Toggle a layer's visibility
    Hide {
        /// Layer id
        id: String,
    },
    /// Set a layer's opacity slider
    Opacity {
        /// Layer id
        id: String,
        /// Slider value in percent (clamped to 10..=100)
        percent: u32,
    },
}

impl Command {
    fn gesture(&self) -> Option<Gesture> {
        match self {
            Self::Resolve => None,
            Self::Promote { id } => Some(Gesture::Promote { id: id.clone() }),
            Self::Demote { id } => Some(Gesture::Demote { id: id.clone() }),
            Self::Hide { id } => Some(Gesture::ToggleVisibility { id: id.clone() }),
            Self::Opacity { id, percent } => Some(Gesture::SetOpacity {
                id: id.clone(),
                percent: *percent,
                suppress_feedback: false,
            }),
        }
    }
}

/// Errors reported by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// A URL argument is malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The config file is not a valid viewer config.
    #[error("invalid config: {0}")]
    ConfigJson(#[from] serde_json::Error),
    /// Loading or applying the share link failed.
    #[error(transparent)]
    Viewer(#[from] ViewerError),
}

type Controller = SyncController<HeadlessMap, RecordingView, MessageLog, MemoryHashStore>;

/// One layer in the report, topmost first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLayer {
    /// Layer id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Stacking order.
    pub z_index: i32,
    /// Visibility.
    pub visible: bool,
    /// Opacity.
    pub opacity: f64,
    /// Source type the map was given.
    pub source_type: Option<String>,
}

/// Result of resolving a share link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Source document URL.
    pub source_url: String,
    /// Projection of the view.
    pub projection: Option<String>,
    /// Extent the view was fitted to.
    pub extent: Option<Extent>,
    /// Layer stack, topmost first.
    pub layers: Vec<ReportLayer>,
    /// Hash with the full layer config and extent written out.
    pub hash: String,
}

/// Load a viewer config from a JSON file, or the defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<ViewerConfig, CliError> {
    let Some(path) = path else {
        return Ok(ViewerConfig::default());
    };
    let json = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ViewerConfig::from_json(&json)?)
}

/// Resolve the share link in `args` and apply its gesture.
///
/// # Errors
///
/// Returns an error if the source is missing, cannot be downloaded or is
/// invalid, or if the gesture names an unknown layer.
pub async fn run(args: &CliArgs) -> Result<Report, CliError> {
    let config = load_config(args.config.as_deref())?;
    let loader = HttpLoader::new(args.base_url.as_deref(), Duration::from_secs(args.timeout_secs))?;
    let map = HeadlessMap::new(config.viewport_width, config.viewport_height);
    let mut controller = SyncController::new(
        config,
        map,
        RecordingView::default(),
        MessageLog::new(),
        MemoryHashStore::new(args.hash.as_str()),
    );

    let outcome = controller.handle_hash_change(&args.hash, &loader).await?;
    if outcome != CycleOutcome::Loaded {
        return Err(ViewerError::MissingSource.into());
    }
    tracing::info!(layers = controller.presenter().model().len(), "source loaded");

    if let Some(gesture) = args.command.as_ref().and_then(Command::gesture) {
        tracing::info!(?gesture, "applying gesture");
        controller.gesture(gesture)?;
        // Feed the written hash back the way a hashchange would.
        let written = controller.store().read_hash();
        controller.handle_hash_change(&written, &loader).await?;
    }

    Ok(report(&controller))
}

fn report(controller: &Controller) -> Report {
    let map = controller.map();
    let layers = controller
        .presenter()
        .model()
        .iter()
        .map(|record| ReportLayer {
            id: record.id.clone(),
            title: record.title.clone(),
            z_index: record.z_index,
            visible: record.visible,
            opacity: record.opacity,
            source_type: map
                .layer(&record.id)
                .and_then(|layer| layer.source_type())
                .map(str::to_string),
        })
        .collect();

    let mut canonical = controller.store().clone();
    let mut values = vec![(fields::CONFIG, controller.presenter().config_string())];
    if let Some(fitted) = controller.fitted_extent() {
        values.push((fields::EXTENT, extent::build(fitted.as_slice())));
    }
    hash::set_values(&mut canonical, values);

    Report {
        source_url: controller.loaded_source_url().unwrap_or_default().to_string(),
        projection: map.projection().map(str::to_string),
        extent: controller.fitted_extent(),
        layers,
        hash: canonical.hash().to_string(),
    }
}

/// Plain-text rendering of a report.
#[must_use]
pub fn format_report(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "source:     {}", report.source_url);
    let _ = writeln!(
        out,
        "projection: {}",
        report.projection.as_deref().unwrap_or("-")
    );
    let _ = writeln!(
        out,
        "extent:     {}",
        report
            .extent
            .map_or_else(|| "-".to_string(), |e| extent::build(e.as_slice()))
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<16} {:>6} {:>7} {:>7}  {:<12} {}",
        "ID", "Z", "VISIBLE", "OPACITY", "SOURCE", "TITLE"
    );
    for layer in &report.layers {
        let _ = writeln!(
            out,
            "{:<16} {:>6} {:>7} {:>7}  {:<12} {}",
            layer.id,
            layer.z_index,
            if layer.visible { "yes" } else { "no" },
            layer.opacity,
            layer.source_type.as_deref().unwrap_or("-"),
            layer.title
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "#{}", report.hash);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_subcommands() {
        let args = CliArgs::parse_from([
            "map-visualizer",
            "--hash",
            "#source=a.json",
            "opacity",
            "osm",
            "35",
        ]);
        assert_eq!(args.hash, "#source=a.json");
        assert_eq!(args.timeout_secs, 30);
        assert_eq!(
            args.command,
            Some(Command::Opacity {
                id: "osm".into(),
                percent: 35
            })
        );
    }

    #[test]
    fn resolve_has_no_gesture() {
        assert_eq!(Command::Resolve.gesture(), None);
        assert_eq!(
            Command::Hide { id: "osm".into() }.gesture(),
            Some(Gesture::ToggleVisibility { id: "osm".into() })
        );
    }

    #[test]
    fn config_defaults_without_path() {
        assert_eq!(load_config(None).expect("defaults"), ViewerConfig::default());
    }

    #[test]
    fn config_reads_partial_json() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        std::io::Write::write_all(&mut file, br#"{"viewport_width": 1024}"#).expect("write");
        let config = load_config(Some(file.path())).expect("valid config");
        assert!((config.viewport_width - 1024.0).abs() < f64::EPSILON);
        assert_eq!(config.extent_update_delay_ms, 200);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = load_config(Some(Path::new("/nonexistent/viewer.json"))).unwrap_err();
        assert!(matches!(err, CliError::ConfigRead { .. }));
    }

    #[test]
    fn format_report_lists_layers_and_hash() {
        let report = Report {
            source_url: "world.json".into(),
            projection: Some("EPSG:3857".into()),
            extent: None,
            layers: vec![ReportLayer {
                id: "osm".into(),
                title: "OpenStreetMap".into(),
                z_index: 1,
                visible: false,
                opacity: 0.5,
                source_type: Some("OSM".into()),
            }],
            hash: "source=world.json&config=osm___1_0_0.5".into(),
        };
        let text = format_report(&report);
        assert!(text.contains("projection: EPSG:3857"));
        assert!(text.contains("extent:     -"));
        assert!(text.contains("OpenStreetMap"));
        assert!(text.ends_with("#source=world.json&config=osm___1_0_0.5\n"));
    }
}
