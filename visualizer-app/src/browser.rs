//! `window.location` hash store and `fetch` source loader.

use async_trait::async_trait;
use visualizer_core::{HashStore, LoadError, SourceLoader};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Location, Response, Window};

use crate::map::js_error_text;

/// URL hash of the current page.
pub struct LocationHashStore {
    location: Location,
}

impl LocationHashStore {
    /// Read and write the hash of `window`.
    #[must_use]
    pub fn new(window: &Window) -> Self {
        Self {
            location: window.location(),
        }
    }
}

impl HashStore for LocationHashStore {
    fn read_hash(&self) -> String {
        self.location.hash().unwrap_or_default()
    }

    fn write_hash(&mut self, hash: &str) {
        if let Err(err) = self.location.set_hash(hash) {
            tracing::error!(error = %js_error_text(&err), "failed to write location hash");
        }
    }
}

/// Downloads source documents with `window.fetch`.
pub struct FetchLoader {
    window: Window,
}

impl FetchLoader {
    /// Fetch through `window`.
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

#[async_trait(?Send)]
impl SourceLoader for FetchLoader {
    async fn load(&self, url: &str) -> Result<String, LoadError> {
        let response = JsFuture::from(self.window.fetch_with_str(url))
            .await
            .map_err(|err| LoadError::Transport(js_error_text(&err)))?
            .dyn_into::<Response>()
            .map_err(|_| LoadError::Transport("fetch did not return a Response".to_string()))?;

        if !response.ok() {
            return Err(LoadError::Status {
                status: response.status(),
                status_text: response.status_text(),
            });
        }

        let text = response
            .text()
            .map_err(|err| LoadError::Parse(js_error_text(&err)))?;
        JsFuture::from(text)
            .await
            .map_err(|err| LoadError::Parse(js_error_text(&err)))?
            .as_string()
            .ok_or_else(|| LoadError::Parse("response body is not text".to_string()))
    }
}
