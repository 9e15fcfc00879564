//! Source document download.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::LoadError;

/// Fetches source documents.
///
/// Implementations run on a single-threaded executor in the browser, so the
/// future is not required to be `Send`.
#[async_trait(?Send)]
pub trait SourceLoader {
    /// Download the document at `url` and return its body.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] describing the transport or HTTP failure.
    async fn load(&self, url: &str) -> Result<String, LoadError>;
}

/// Loader serving documents from memory.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    documents: HashMap<String, String>,
}

impl StaticLoader {
    /// Create an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    #[must_use]
    pub fn with_document(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.documents.insert(url.into(), body.into());
        self
    }
}

#[async_trait(?Send)]
impl SourceLoader for StaticLoader {
    async fn load(&self, url: &str) -> Result<String, LoadError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| LoadError::Status {
                status: 404,
                status_text: "Not Found".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_known_documents() {
        let loader = StaticLoader::new().with_document("a.json", "{}");
        assert_eq!(loader.load("a.json").await.as_deref(), Ok("{}"));
    }

    #[tokio::test]
    async fn unknown_documents_are_404() {
        let err = StaticLoader::new().load("b.json").await.unwrap_err();
        assert_eq!(err.to_string(), "error, 404 Not Found");
    }
}
