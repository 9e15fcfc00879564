//! # Map Visualizer Core
//!
//! Layer ordering and URL hash synchronization for a browser map viewer.
//! Compiles to WASM for the browser front-end and natively for tooling.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                SyncController                │
//! │   busy flag · loaded source · fitted extent  │
//! ├──────────────────────┬───────────────────────┤
//! │  LayerListPresenter  │  MapBackend           │
//! │  - LayerOrderModel   │  - layers from        │
//! │  - LayerListView     │    SourceDocument     │
//! ├──────────────────────┴───────────────────────┤
//! │  hash · layer_config · extent codecs         │
//! └──────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod extent;
pub mod hash;
pub mod layer_config;
pub mod loader;
pub mod model;
pub mod overlay;
pub mod presenter;
pub mod registry;
pub mod source;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use backend::headless::{HeadlessLayer, HeadlessMap};
pub use backend::{MapBackend, MapLayer};
pub use config::ViewerConfig;
pub use controller::{Cycle, CycleOutcome, LoadTicket, SyncController};
pub use debounce::ExtentDebouncer;
pub use error::{LoadError, ValidationError, ViewerError, ViewerResult};
pub use extent::Extent;
pub use hash::{HashState, HashStore, HashValue, MemoryHashStore};
pub use layer_config::{LayerOverride, LayerOverrides};
pub use loader::{SourceLoader, StaticLoader};
pub use model::{LayerOrderModel, LayerRecord, LayerSeed, MoveOutcome};
pub use overlay::{MessageLog, Overlay};
pub use presenter::{Gesture, LayerListPresenter, LayerListView, LayerRow, RecordingView};
pub use registry::{LayerKind, SourceRegistry, SourceSpec};
pub use source::{LayerBlueprint, SourceDocument};

/// Visualizer core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
