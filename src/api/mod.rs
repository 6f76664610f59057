//! HTTP transport for the news backend API.
//!
//! All requests go through [`ApiTransport`], which resolves paths against the
//! configured base URL, speaks JSON, and classifies failures into a small
//! error taxonomy. Errors are logged here, once, so callers don't have to.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Failure taxonomy for backend requests.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The request went out but no response came back (connect/timeout).
    #[error("no response from server: {0}")]
    NoResponse(String),

    /// The request could not be built or sent.
    #[error("request failed: {0}")]
    Request(String),

    /// The response body was not the JSON we expected.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Transport seam for the backend API.
///
/// Paths are relative to the base URL, e.g. `articles/public`.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError>;
    async fn post_json(&self, path: &str, body: Value) -> Result<Value, ApiError>;
}

/// reqwest-backed transport.
pub struct HttpClient {
    client: Client,
    base: Url,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let mut base =
            Url::parse(base_url).map_err(|e| ApiError::Request(format!("bad base URL: {e}")))?;
        // Joining relative paths only works when the base ends with a slash.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("kiosk/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Request(format!("bad request path {path:?}: {e}")))
    }

    async fn read_json(&self, url: Url, response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(classify)?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            tracing::error!(%url, status = status.as_u16(), "API request rejected by server");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(%url, "API response was not valid JSON: {e}");
            ApiError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl ApiTransport for HttpClient {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }

        let response = self.client.get(url.clone()).send().await.map_err(classify)?;
        self.read_json(url, response).await
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        let url = self.endpoint(path)?;

        let response = self
            .client
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(classify)?;
        self.read_json(url, response).await
    }
}

/// Map a reqwest error into the taxonomy and log it.
///
/// Timeouts and refused connections mean the backend never answered; anything
/// else is a problem with the request itself.
fn classify(error: reqwest::Error) -> ApiError {
    if error.is_timeout() || error.is_connect() {
        tracing::error!("API unreachable (is the backend running?): {error}");
        ApiError::NoResponse(error.to_string())
    } else {
        tracing::error!("API request failed: {error}");
        ApiError::Request(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_json_resolves_path_and_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/articles/public")
                .query_param("page", "2")
                .query_param("limit", "12");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "articles": [], "pagination": { "total": 0 } }));
        });

        let client = HttpClient::new(&format!("{}/api", server.base_url()), 10).unwrap();
        let value = client
            .get_json(
                "articles/public",
                &[("page", "2".to_string()), ("limit", "12".to_string())],
            )
            .await
            .unwrap();

        mock.assert();
        assert!(value.get("articles").is_some());
    }

    #[tokio::test]
    async fn test_non_success_status_maps_to_status_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/articles/public/99");
            then.status(404)
                .header("content-type", "application/json")
                .json_body(json!({ "error": "Article not found" }));
        });

        let client = HttpClient::new(&format!("{}/api", server.base_url()), 10).unwrap();
        let err = client
            .get_json("articles/public/99", &[])
            .await
            .unwrap_err();

        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("Article not found"));
            }
            other => panic!("expected Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_post_json_sends_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/newsletter/subscribe")
                .json_body(json!({ "email": "reader@example.com" }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "message": "Subscribed" }));
        });

        let client = HttpClient::new(&format!("{}/api", server.base_url()), 10).unwrap();
        let value = client
            .post_json("newsletter/subscribe", json!({ "email": "reader@example.com" }))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(value["message"], "Subscribed");
    }

    #[tokio::test]
    async fn test_garbage_body_maps_to_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/settings/public");
            then.status(200).body("<html>not json</html>");
        });

        let client = HttpClient::new(&format!("{}/api", server.base_url()), 10).unwrap();
        let err = client.get_json("settings/public", &[]).await.unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_base_url_keeps_api_prefix() {
        let client = HttpClient::new("http://localhost:9988/api", 10).unwrap();
        let url = client.endpoint("articles/public").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9988/api/articles/public");

        // A leading slash on the path must not escape the prefix.
        let url = client.endpoint("/categories/public").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9988/api/categories/public");
    }

    #[test]
    fn test_base_url_with_trailing_slash() {
        let client = HttpClient::new("http://localhost:9988/api/", 10).unwrap();
        let url = client.endpoint("settings/public").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9988/api/settings/public");
    }
}
