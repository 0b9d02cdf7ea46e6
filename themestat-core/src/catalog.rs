//! Read-only access to the media server's catalog.
//!
//! Two queries are issued: the library listing and the item listing of a
//! single library. Both return the raw response body; parsing lives in
//! [`crate::coverage`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;

/// Header carrying the access credential on every request.
pub const TOKEN_HEADER: &str = "X-Plex-Token";

const USER_AGENT: &str = concat!("themestat/", env!("CARGO_PKG_VERSION"));

/// Errors from a single catalog request. No retries happen at this layer.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("network error requesting {path}: {message}")]
    Network { path: String, message: String },
    #[error("server returned HTTP {status} for {path}")]
    HttpStatus { path: String, status: u16 },
    #[error("request to {path} timed out")]
    Timeout { path: String },
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl CatalogError {
    fn from_reqwest(path: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout {
                path: path.to_string(),
            }
        } else {
            CatalogError::Network {
                path: path.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// A source of catalog documents.
///
/// Implemented by [`CatalogClient`] over HTTP; cycles can be driven by any
/// other implementation.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the document listing every library on the server.
    async fn list_libraries(&self) -> Result<String, CatalogError>;

    /// Fetch the document listing every item in the library with `library_key`.
    async fn list_items(&self, library_key: &str) -> Result<String, CatalogError>;
}

/// HTTP client for the media server's library endpoints.
pub struct CatalogClient {
    base_url: String,
    token: String,
    http: Client,
}

impl CatalogClient {
    pub fn new(config: &Config) -> Result<Self, CatalogError> {
        let http = build_http_client(config.request_timeout, USER_AGENT)?;

        Ok(Self {
            base_url: config.server_url.as_str().trim_end_matches('/').to_string(),
            token: config.token.clone(),
            http,
        })
    }

    /// GET `path` relative to the server URL and return the body as text.
    async fn get(&self, path: &str) -> Result<String, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let resp = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| CatalogError::from_reqwest(path, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::HttpStatus {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text()
            .await
            .map_err(|e| CatalogError::from_reqwest(path, e))
    }
}

fn build_http_client(timeout: Duration, user_agent: &str) -> Result<Client, CatalogError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| CatalogError::ClientBuild(e.to_string()))
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn list_libraries(&self) -> Result<String, CatalogError> {
        let body = self.get("/library/sections").await?;
        info!("Fetched library sections");
        Ok(body)
    }

    async fn list_items(&self, library_key: &str) -> Result<String, CatalogError> {
        let body = self
            .get(&format!("/library/sections/{library_key}/all"))
            .await?;
        info!("Fetched media items for library key: {}", library_key);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::Router;

    const SECTIONS_XML: &str = r#"<MediaContainer size="1"><Directory key="1" title="Movies"/></MediaContainer>"#;

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("x-plex-token")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "secret")
    }

    async fn sections(headers: HeaderMap) -> Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        SECTIONS_XML.into_response()
    }

    async fn items(Path(key): Path<String>, headers: HeaderMap) -> Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        match key.as_str() {
            "1" => r#"<MediaContainer><Video title="A" theme="/t/1"/></MediaContainer>"#
                .into_response(),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "<MediaContainer/>".into_response()
            }
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    /// Spawn a fake media server on an ephemeral port and return its base URL.
    async fn spawn_fake_server() -> String {
        let app = Router::new()
            .route("/library/sections", get(sections))
            .route("/library/sections/:key/all", get(items));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str, token: &str, timeout_secs: u64) -> CatalogClient {
        let config = Config::new(base_url, token, 300, timeout_secs).unwrap();
        CatalogClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn list_libraries_sends_token() {
        let base = spawn_fake_server().await;
        let body = client(&base, "secret", 5).list_libraries().await.unwrap();
        assert_eq!(body, SECTIONS_XML);
    }

    #[tokio::test]
    async fn list_items_for_key() {
        let base = spawn_fake_server().await;
        let body = client(&base, "secret", 5).list_items("1").await.unwrap();
        assert!(body.contains(r#"theme="/t/1""#));
    }

    #[tokio::test]
    async fn wrong_token_is_http_status_failure() {
        let base = spawn_fake_server().await;
        let err = client(&base, "wrong", 5).list_libraries().await.unwrap_err();
        match err {
            CatalogError::HttpStatus { status, path } => {
                assert_eq!(status, 401);
                assert_eq!(path, "/library/sections");
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_library_is_http_status_failure() {
        let base = spawn_fake_server().await;
        let err = client(&base, "secret", 5).list_items("99").await.unwrap_err();
        assert!(matches!(err, CatalogError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn hung_server_times_out() {
        let base = spawn_fake_server().await;
        let err = client(&base, "secret", 1)
            .list_items("slow")
            .await
            .unwrap_err();
        assert!(
            matches!(err, CatalogError::Timeout { .. }),
            "expected Timeout, got {:?}",
            err
        );
    }

    #[test]
    fn invalid_client_settings_are_build_failures() {
        let err = build_http_client(Duration::from_secs(5), "themestat\nbroken").unwrap_err();
        assert!(
            matches!(err, CatalogError::ClientBuild(_)),
            "expected ClientBuild, got {:?}",
            err
        );
        assert!(build_http_client(Duration::from_secs(5), USER_AGENT).is_ok());
    }

    #[tokio::test]
    async fn refused_connection_is_network_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}"), "secret", 5)
            .list_libraries()
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Network { .. }));
    }
}
