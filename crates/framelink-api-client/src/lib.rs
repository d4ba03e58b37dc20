//! HTTP client for the Framelink gallery backend.
//!
//! Provides a minimal client with configurable auth (Bearer token or X-API-Key)
//! and generic GET/POST/PUT helpers that map HTTP failures onto `AppError`.
//! The [`GalleryBackend`](framelink_core::GalleryBackend) implementation lives
//! in [`api`].

pub mod api;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use framelink_core::models::Identity;
use framelink_core::{AppError, AppResult, BackendConnector, ClientConfig, GalleryBackend};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

pub use api::{CanUploadResponse, CreateShortLinkRequest, IsAdminResponse, RoleResponse, ShortLinkTarget};

/// HTTP client for the gallery API, bound to one identity.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    prefix: String,
    identity: Identity,
}

impl ApiClient {
    pub fn new(base_url: &str, prefix: &str, identity: Identity, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            prefix: prefix.trim_end_matches('/').to_string(),
            identity,
        })
    }

    /// Create a client from configuration, using the configured credential.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(
            &config.api_url,
            &config.api_prefix(),
            config.identity(),
            config.request_timeout(),
        )
    }

    /// Same connection settings, different identity.
    pub fn with_identity(&self, identity: Identity) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            prefix: self.prefix.clone(),
            identity,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/photos`.
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.prefix, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.identity {
            Identity::Anonymous => request,
            Identity::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Identity::ApiKey(key) => request.header("X-API-Key", key.as_str()),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> AppResult<Response> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to send request: {}", e)))?;
        debug!(status = %response.status(), url = %response.url(), "Gallery API response");
        Ok(response)
    }

    /// GET and deserialize a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let response = self.send(self.client.get(self.build_url(path))).await?;
        let response = ensure_success(response).await?;
        parse_json(response).await
    }

    /// GET where 404 means "absent" rather than an error.
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> AppResult<Option<T>> {
        let response = self.send(self.client.get(self.build_url(path))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response).await?;
        parse_json(response).await
    }

    /// POST a JSON body, ignoring the response body.
    pub async fn post_json<B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<()> {
        let request = self.client.post(self.build_url(path)).json(body);
        let response = self.send(request).await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// PUT a JSON body, ignoring the response body.
    pub async fn put_json<B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<()> {
        let request = self.client.put(self.build_url(path)).json(body);
        let response = self.send(request).await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// POST a multipart form, ignoring the response body.
    pub async fn post_multipart(&self, path: &str, form: reqwest::multipart::Form) -> AppResult<()> {
        let request = self.client.post(self.build_url(path)).multipart(form);
        let response = self.send(request).await?;
        ensure_success(response).await?;
        Ok(())
    }
}

impl BackendConnector for ApiClient {
    fn connect(&self, identity: &Identity) -> AppResult<Arc<dyn GalleryBackend>> {
        Ok(Arc::new(self.with_identity(identity.clone())))
    }
}

/// Map a non-success status onto the error taxonomy.
pub fn error_for_status(status: StatusCode, body: String) -> AppError {
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        body
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(detail),
        StatusCode::NOT_FOUND => AppError::NotFound(detail),
        StatusCode::CONFLICT => AppError::Collision(detail),
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(detail),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::InvalidInput(detail),
        StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => AppError::Unavailable(detail),
        _ => AppError::Internal(format!("API request failed with status {}: {}", status, detail)),
    }
}

async fn ensure_success(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(error_for_status(status, error_text))
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    response
        .json()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to parse response as JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_taxonomy() {
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, "Unauthorized: admin only".into()),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, String::new()),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, "Photo does not exist".into()),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::CONFLICT, String::new()),
            AppError::Collision(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::SERVICE_UNAVAILABLE, String::new()),
            AppError::Unavailable(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::IM_A_TEAPOT, String::new()),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn empty_body_falls_back_to_status_text() {
        match error_for_status(StatusCode::NOT_FOUND, "  ".into()) {
            AppError::NotFound(detail) => assert!(detail.contains("404")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn build_url_joins_prefix() {
        let client = ApiClient::new(
            "http://localhost:4000/",
            "/api/v1",
            Identity::Anonymous,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.build_url("/photos"), "http://localhost:4000/api/v1/photos");
    }

    #[test]
    fn with_identity_keeps_connection_settings() {
        let client = ApiClient::new(
            "http://localhost:4000",
            "/api/v1",
            Identity::Anonymous,
            Duration::from_secs(5),
        )
        .unwrap();
        let authed = client.with_identity(Identity::Bearer("t".to_string()));
        assert_eq!(authed.base_url(), client.base_url());
        assert!(!authed.identity().is_anonymous());
    }
}
