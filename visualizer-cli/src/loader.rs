//! HTTP source loader.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;
use visualizer_core::{LoadError, SourceLoader};

use crate::CliError;

/// Downloads source documents over HTTP.
///
/// Relative source URLs, as found in share links made on the page that
/// hosts them, are resolved against an optional base URL.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    http: Client,
    base: Option<Url>,
}

impl HttpLoader {
    /// Create a loader.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InvalidUrl`] if `base_url` is malformed and
    /// [`CliError::Http`] if the HTTP client fails to build.
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self, CliError> {
        let base = base_url
            .map(|raw| Url::parse(raw).map_err(|e| CliError::InvalidUrl(format!("{raw}: {e}"))))
            .transpose()?;

        let http = Client::builder()
            .user_agent(concat!("map-visualizer/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy()
            .build()?;

        Ok(Self { http, base })
    }

    /// Absolute URL for a source reference.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Transport`] for a relative reference without a
    /// base URL, or one that cannot be joined.
    pub fn resolve(&self, reference: &str) -> Result<Url, LoadError> {
        match Url::parse(reference) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base
                .as_ref()
                .ok_or_else(|| {
                    LoadError::Transport(format!(
                        "relative source url '{reference}' needs --base-url"
                    ))
                })?
                .join(reference)
                .map_err(|e| LoadError::Transport(e.to_string())),
            Err(e) => Err(LoadError::Transport(e.to_string())),
        }
    }
}

#[async_trait(?Send)]
impl SourceLoader for HttpLoader {
    async fn load(&self, url: &str) -> Result<String, LoadError> {
        let url = self.resolve(url)?;
        tracing::debug!(%url, "GET source document");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| LoadError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loader(base: Option<&str>) -> HttpLoader {
        HttpLoader::new(base, Duration::from_secs(5)).expect("loader")
    }

    #[test]
    fn resolve_joins_relative_references() {
        let loader = loader(Some("https://maps.example.com/viewer/index.html"));
        assert_eq!(
            loader.resolve("sources/world.json").expect("joins").as_str(),
            "https://maps.example.com/viewer/sources/world.json"
        );
        assert_eq!(
            loader.resolve("https://cdn.example.com/a.json").expect("absolute").as_str(),
            "https://cdn.example.com/a.json"
        );
    }

    #[test]
    fn resolve_without_base_rejects_relative_references() {
        let err = loader(None).resolve("world.json").unwrap_err();
        assert!(matches!(err, LoadError::Transport(_)));
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        let err = HttpLoader::new(Some("not a url"), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, CliError::InvalidUrl(_)));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn load_returns_the_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/world.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"layers":[]}"#))
            .mount(&server)
            .await;

        let body = loader(Some(&server.uri()))
            .load("world.json")
            .await
            .expect("body");
        assert_eq!(body, r#"{"layers":[]}"#);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn load_maps_http_errors_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = loader(None)
            .load(&format!("{}/missing.json", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "error, 404 Not Found");
    }
}
