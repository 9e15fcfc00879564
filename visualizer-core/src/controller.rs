//! Hash change handling.
//!
//! A [`SyncController`] turns each hash change into either an in-place
//! update of the loaded source or a full reload from a freshly downloaded
//! document. The download is the only suspension point, so a cycle is split
//! into [`SyncController::begin`] and [`SyncController::finish_load`];
//! [`SyncController::handle_hash_change`] runs both with a [`SourceLoader`].
//!
//! Only one cycle runs at a time. A hash change that arrives while a
//! download is in flight yields [`Cycle::ForcedReload`], and the front-end
//! is expected to restart the page.

use crate::backend::{apply_records, MapBackend};
use crate::config::{fields, ViewerConfig};
use crate::debounce::ExtentDebouncer;
use crate::hash::{self, HashStore};
use crate::layer_config::{self, LayerOverrides};
use crate::loader::SourceLoader;
use crate::model::LayerSeed;
use crate::overlay::Overlay;
use crate::presenter::{Gesture, LayerListPresenter, LayerListView};
use crate::registry::SourceRegistry;
use crate::source::SourceDocument;
use crate::{extent, Extent, LoadError, ViewerError, ViewerResult};

/// A pending source download.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    source_url: String,
    overrides: LayerOverrides,
    extent: Option<Extent>,
    generation: u64,
}

impl LoadTicket {
    /// URL to download.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }
}

/// What [`SyncController::begin`] did with a hash.
#[derive(Debug, Clone, PartialEq)]
pub enum Cycle {
    /// The loaded source was updated in place.
    Updated,
    /// Nothing to load; the controller is idle.
    Idle,
    /// Download the ticket's URL and pass the result to
    /// [`SyncController::finish_load`].
    Download(LoadTicket),
    /// A cycle was already running; the page must be reloaded.
    ForcedReload,
}

/// What [`SyncController::handle_hash_change`] did with a hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The loaded source was updated in place.
    Updated,
    /// A new source was downloaded and loaded.
    Loaded,
    /// Nothing to load.
    Idle,
    /// A cycle was already running; the page must be reloaded.
    ForcedReload,
}

#[derive(Debug, Clone)]
struct LoadedSource {
    url: String,
    extent: Option<Extent>,
}

/// Keeps the map, the layer list and the hash in sync.
#[derive(Debug)]
pub struct SyncController<M, V, O, H> {
    config: ViewerConfig,
    registry: SourceRegistry,
    map: M,
    presenter: LayerListPresenter<V>,
    overlay: O,
    store: H,
    busy: bool,
    generation: u64,
    loaded: Option<LoadedSource>,
    fitted_extent: Option<Extent>,
    debouncer: ExtentDebouncer,
}

impl<M, V, O, H> SyncController<M, V, O, H>
where
    M: MapBackend,
    V: LayerListView,
    O: Overlay,
    H: HashStore,
{
    /// Create an idle controller with nothing loaded.
    #[must_use]
    pub fn new(config: ViewerConfig, map: M, view: V, overlay: O, store: H) -> Self {
        let debouncer = ExtentDebouncer::new(config.extent_update_delay());
        Self {
            config,
            registry: SourceRegistry::standard(),
            map,
            presenter: LayerListPresenter::new(view),
            overlay,
            store,
            busy: false,
            generation: 0,
            loaded: None,
            fitted_extent: None,
            debouncer,
        }
    }

    /// Use a custom source registry.
    #[must_use]
    pub fn with_registry(mut self, registry: SourceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// The map backend.
    #[must_use]
    pub const fn map(&self) -> &M {
        &self.map
    }

    /// Mutable access to the map backend.
    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    /// The layer list presenter.
    #[must_use]
    pub const fn presenter(&self) -> &LayerListPresenter<V> {
        &self.presenter
    }

    /// The status overlay.
    #[must_use]
    pub const fn overlay(&self) -> &O {
        &self.overlay
    }

    /// The hash store.
    #[must_use]
    pub const fn store(&self) -> &H {
        &self.store
    }

    /// Mutable access to the hash store.
    pub fn store_mut(&mut self) -> &mut H {
        &mut self.store
    }

    /// Whether a cycle is running.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// URL of the loaded source.
    #[must_use]
    pub fn loaded_source_url(&self) -> Option<&str> {
        self.loaded.as_ref().map(|loaded| loaded.url.as_str())
    }

    /// Last extent the view was fitted to or settled at.
    #[must_use]
    pub const fn fitted_extent(&self) -> Option<Extent> {
        self.fitted_extent
    }

    /// Start a cycle for the hash currently in the store.
    pub fn begin_current(&mut self) -> Cycle {
        let hash = self.store.read_hash();
        self.begin(&hash)
    }

    /// Start a cycle for `hash`.
    pub fn begin(&mut self, hash: &str) -> Cycle {
        if self.busy {
            tracing::warn!("hash update while busy, forcing reload");
            return Cycle::ForcedReload;
        }
        self.busy = true;
        self.debouncer.cancel();

        let state = hash::parse(hash);
        let source_url = state.get_str(fields::SOURCE).unwrap_or_default().trim().to_string();
        let overrides =
            layer_config::parse(state.get_str(fields::CONFIG).unwrap_or_default().trim());
        let extent = extent::parse(state.get_str(fields::EXTENT).unwrap_or_default().trim());
        tracing::debug!(%source_url, ?overrides, ?extent, "hash decoded");

        if !source_url.is_empty() && self.loaded_source_url() == Some(source_url.as_str()) {
            self.update(&overrides, extent);
            self.busy = false;
            return Cycle::Updated;
        }

        self.reset();
        self.overlay.append_text(&format!("source: {source_url}"));
        self.overlay.append_text(&format!(
            "config: {}",
            serde_json::to_string(&overrides).unwrap_or_default()
        ));
        self.overlay.append_text(&format!(
            "extent: {}",
            serde_json::to_string(&extent).unwrap_or_default()
        ));

        if source_url.is_empty() {
            tracing::warn!("no source url available");
            self.overlay.append_text(&ViewerError::MissingSource.to_string());
            self.busy = false;
            return Cycle::Idle;
        }

        tracing::info!(%source_url, "downloading source file");
        self.overlay.append_text("Downloading source file...");
        self.generation += 1;
        Cycle::Download(LoadTicket {
            source_url,
            overrides,
            extent,
            generation: self.generation,
        })
    }

    /// Complete a download started by [`Self::begin`].
    ///
    /// The controller is idle afterwards whatever the result.
    ///
    /// # Errors
    ///
    /// Returns the download, parse or validation error after showing it on
    /// the overlay.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        body: Result<String, LoadError>,
    ) -> ViewerResult<()> {
        if !self.busy || ticket.generation != self.generation {
            tracing::warn!(source_url = %ticket.source_url, "stale download ignored");
            return Ok(());
        }

        let result = match body {
            Err(err) => {
                tracing::error!(source_url = %ticket.source_url, error = %err, "download failed");
                Err(ViewerError::from(err))
            }
            Ok(body) => {
                self.overlay.clear();
                self.load(ticket, &body).inspect_err(|err| {
                    tracing::error!(error = %err, "source file rejected");
                })
            }
        };
        if let Err(err) = &result {
            self.overlay.append_text(&err.to_string());
        }

        self.busy = false;
        result
    }

    /// Run a full cycle, downloading with `loader` when needed.
    ///
    /// # Errors
    ///
    /// See [`Self::finish_load`].
    pub async fn handle_hash_change<L>(
        &mut self,
        hash: &str,
        loader: &L,
    ) -> ViewerResult<CycleOutcome>
    where
        L: SourceLoader + ?Sized,
    {
        match self.begin(hash) {
            Cycle::Updated => Ok(CycleOutcome::Updated),
            Cycle::Idle => Ok(CycleOutcome::Idle),
            Cycle::ForcedReload => Ok(CycleOutcome::ForcedReload),
            Cycle::Download(ticket) => {
                let body = loader.load(ticket.source_url()).await;
                self.finish_load(ticket, body)?;
                Ok(CycleOutcome::Loaded)
            }
        }
    }

    /// Apply a layer list gesture and mirror the result on the map.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::OutOfRange`] for an unknown layer id.
    pub fn gesture(&mut self, gesture: Gesture) -> ViewerResult<()> {
        if self.presenter.handle(gesture, &mut self.store)? {
            apply_records(self.map.layers_mut(), self.presenter.model().iter());
        }
        Ok(())
    }

    /// The user started moving the map.
    pub fn interaction_start(&mut self) {
        self.debouncer.cancel();
    }

    /// The user stopped moving the map.
    ///
    /// Returns the deadline of the scheduled extent write, if one was
    /// scheduled; call [`Self::flush_extent`] once it has passed.
    pub fn interaction_end(&mut self, now_ms: u64) -> Option<u64> {
        if self.loaded.is_none() {
            return None;
        }
        let view = self.map.view_extent()?;
        if self
            .fitted_extent
            .is_some_and(|fitted| extent::is_identical(fitted.as_slice(), view.as_slice()))
        {
            return None;
        }
        self.fitted_extent = Some(view);
        Some(self.debouncer.schedule(view, now_ms))
    }

    /// Write the settled extent to the hash if its deadline has passed.
    ///
    /// Returns whether the hash was written.
    pub fn flush_extent(&mut self, now_ms: u64) -> bool {
        let Some(view) = self.debouncer.take_due(now_ms) else {
            return false;
        };
        if self.loaded.is_none() {
            return false;
        }
        hash::set_values(&mut self.store, [(fields::EXTENT, extent::build(view.as_slice()))]);
        true
    }

    fn update(&mut self, overrides: &LayerOverrides, extent: Option<Extent>) {
        tracing::debug!("updating loaded source");
        self.presenter.update(overrides);
        apply_records(self.map.layers_mut(), self.presenter.model().iter());

        let target = extent.or_else(|| self.loaded.as_ref().and_then(|loaded| loaded.extent));
        if let Some(target) = target {
            let unchanged = self
                .fitted_extent
                .is_some_and(|fitted| extent::is_identical(fitted.as_slice(), target.as_slice()));
            if !unchanged {
                self.fitted_extent = Some(self.map.fit_extent(&target));
            }
        }
    }

    fn reset(&mut self) {
        tracing::debug!("resetting viewer");
        self.loaded = None;
        self.fitted_extent = None;
        self.map.set_layers(Vec::new());
        if let Err(err) = self.map.set_projection(None) {
            tracing::error!(error = %err, "failed to reset projection");
        }
        self.presenter.clear();
        self.overlay.clear();
    }

    fn load(&mut self, ticket: LoadTicket, body: &str) -> ViewerResult<()> {
        let document = SourceDocument::from_json(body, &self.registry)?;

        let projection = document.projection_or(&self.config.default_projection);
        self.map.set_projection(Some(projection))?;

        if let Some(target) = ticket.extent.or(document.extent) {
            self.fitted_extent = Some(self.map.fit_extent(&target));
        }

        let layers = document
            .layers
            .iter()
            .map(|blueprint| self.map.create_layer(blueprint))
            .collect::<ViewerResult<Vec<_>>>()?;
        self.map.set_layers(layers);
        self.presenter
            .reload(document.layers.iter().map(LayerSeed::from), &ticket.overrides);
        apply_records(self.map.layers_mut(), self.presenter.model().iter());

        tracing::info!(
            source_url = %ticket.source_url,
            layers = document.layers.len(),
            "source loaded"
        );
        self.loaded = Some(LoadedSource {
            url: ticket.source_url,
            extent: document.extent,
        });
        Ok(())
    }
}
