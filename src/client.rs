//! HTTP client for the Kling API.
//!
//! One client is built per tool invocation, which is also where the single
//! per-invocation signed token is issued. Calls carry fixed timeouts and are
//! never retried; classification of the response happens in the tool flows.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::auth;
use crate::config::Credentials;
use crate::error::{CredentialError, TransportError};

/// Timeout for create/query calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout for fetching generated media content.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Raw HTTP outcome before any envelope interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Raw bytes outcome for media downloads.
#[derive(Debug, Clone)]
pub struct RawBytes {
    pub status: u16,
    pub bytes: Vec<u8>,
}

/// Client for Kling API requests, carrying one freshly issued bearer token.
#[must_use]
#[derive(Debug)]
pub struct KlingClient {
    http: reqwest::Client,
    media_http: reqwest::Client,
    base_url: String,
}

impl KlingClient {
    /// Build a client for one invocation, issuing the signed token.
    pub fn new(credentials: &Credentials, base_url: &str) -> Result<Self, CredentialError> {
        if credentials.access_key.trim().is_empty() {
            return Err(CredentialError::MissingAccessKey);
        }
        if credentials.secret_key.trim().is_empty() {
            return Err(CredentialError::MissingSecretKey);
        }

        let token = auth::issue_token(&credentials.access_key, &credentials.secret_key)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| CredentialError::Client(e.to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| CredentialError::Client(e.to_string()))?;

        // Media URLs are plain fetches; the bearer token stays off them.
        let media_http = reqwest::Client::builder()
            .build()
            .map_err(|e| CredentialError::Client(e.to_string()))?;

        Ok(Self {
            http,
            media_http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON payload to an API path.
    pub async fn post(&self, path: &str, payload: &Value) -> Result<RawResponse, TransportError> {
        let response = self
            .http
            .post(self.url(path))
            .json(payload)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }

    /// GET an API path.
    pub async fn get(&self, path: &str) -> Result<RawResponse, TransportError> {
        let response = self
            .http
            .get(self.url(path))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }

    /// Fetch generated media content from an absolute URL.
    pub async fn download(&self, url: &str) -> Result<RawBytes, TransportError> {
        let response = self
            .media_http
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?.to_vec();
        Ok(RawBytes { status, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_credentials() -> Credentials {
        Credentials::new("ak-test", "sk-test")
    }

    #[test]
    fn empty_keys_are_rejected_before_any_network_use() {
        let err = KlingClient::new(&Credentials::new("", "sk"), "http://localhost").unwrap_err();
        assert!(matches!(err, CredentialError::MissingAccessKey));

        let err = KlingClient::new(&Credentials::new("ak", " "), "http://localhost").unwrap_err();
        assert!(matches!(err, CredentialError::MissingSecretKey));
    }

    #[tokio::test]
    async fn post_sends_bearer_token_and_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/videos/text2video"))
            .and(header_regex("authorization", r"^Bearer [\w-]+\.[\w-]+\.[\w-]+$"))
            .and(body_json(json!({"model_name": "kling-v1", "prompt": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let client = KlingClient::new(&test_credentials(), &server.uri()).expect("client");
        let response = client
            .post(
                "/v1/videos/text2video",
                &json!({"model_name": "kling-v1", "prompt": "hello"}),
            )
            .await
            .expect("post");
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn get_returns_raw_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/videos/text2video/t1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = KlingClient::new(&test_credentials(), &server.uri()).expect("client");
        let response = client.get("/v1/videos/text2video/t1").await.expect("get");
        assert_eq!(response.status, 500);
        assert_eq!(response.body, "boom");
    }

    #[tokio::test]
    async fn download_returns_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"MP4DATA".to_vec()))
            .mount(&server)
            .await;

        let client = KlingClient::new(&test_credentials(), &server.uri()).expect("client");
        let result = client
            .download(&format!("{}/video.mp4", server.uri()))
            .await
            .expect("download");
        assert_eq!(result.status, 200);
        assert_eq!(result.bytes, b"MP4DATA");
    }
}
