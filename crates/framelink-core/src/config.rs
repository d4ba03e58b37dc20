//! Configuration module
//!
//! Client configuration is read from the environment (after loading `.env`)
//! with defaults for everything except credentials.

use std::env;
use std::time::Duration;

use crate::models::Identity;
use crate::validation::DEFAULT_MAX_UPLOAD_BYTES;

const DEFAULT_API_URL: &str = "http://localhost:4000";
const DEFAULT_API_VERSION: &str = "v1";
const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_SHORT_LINK_PARAM: &str = "s";
const DEFAULT_SECRET_PARAM: &str = "caffeineAdminToken";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const SHORT_LINK_STALE_SECS: u64 = 300;
const AUTHORIZATION_STALE_SECS: u64 = 0;
const PHOTOS_STALE_SECS: u64 = 30;
const SHARE_ATTEMPTS: u32 = 3;

/// How the credential is sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    ApiKey,
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_version: String,
    pub api_token: Option<String>,
    pub auth_scheme: AuthScheme,
    pub request_timeout_secs: u64,
    /// Origin share URLs are composed against
    pub public_origin: String,
    /// Fragment key carrying a short code (`#s=<code>`)
    pub short_link_param: String,
    /// Query-string key of the one-time secret
    pub secret_param: String,
    pub max_upload_bytes: u64,
    pub photos_stale_secs: u64,
    pub short_link_stale_secs: u64,
    pub authorization_stale_secs: u64,
    /// Caller-side retry budget when a generated code collides
    pub share_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_token: None,
            auth_scheme: AuthScheme::Bearer,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            public_origin: DEFAULT_PUBLIC_ORIGIN.to_string(),
            short_link_param: DEFAULT_SHORT_LINK_PARAM.to_string(),
            secret_param: DEFAULT_SECRET_PARAM.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            photos_stale_secs: PHOTOS_STALE_SECS,
            short_link_stale_secs: SHORT_LINK_STALE_SECS,
            authorization_stale_secs: AUTHORIZATION_STALE_SECS,
            share_attempts: SHARE_ATTEMPTS,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let auth_scheme = match var("FRAMELINK_AUTH_SCHEME")
            .unwrap_or_else(|| "bearer".to_string())
            .to_lowercase()
            .as_str()
        {
            "bearer" => AuthScheme::Bearer,
            "api-key" | "api_key" | "apikey" => AuthScheme::ApiKey,
            other => {
                return Err(anyhow::anyhow!(
                    "FRAMELINK_AUTH_SCHEME must be 'bearer' or 'api-key', got '{}'",
                    other
                ))
            }
        };

        let max_upload_bytes = var("FRAMELINK_MAX_UPLOAD_MB")
            .map(|s| -> Result<u64, anyhow::Error> {
                s.parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("FRAMELINK_MAX_UPLOAD_MB must be a valid number"))?
                    .checked_mul(1024 * 1024)
                    .ok_or_else(|| anyhow::anyhow!("FRAMELINK_MAX_UPLOAD_MB is too large"))
            })
            .transpose()?;

        let config = ClientConfig {
            api_url: var("FRAMELINK_API_URL")
                .or_else(|| var("API_URL"))
                .unwrap_or(defaults.api_url)
                .trim_end_matches('/')
                .to_string(),
            api_version: var("FRAMELINK_API_VERSION").unwrap_or(defaults.api_version),
            api_token: var("FRAMELINK_API_TOKEN").or_else(|| var("FRAMELINK_API_KEY")),
            auth_scheme,
            request_timeout_secs: var("FRAMELINK_REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            public_origin: var("FRAMELINK_PUBLIC_ORIGIN")
                .unwrap_or(defaults.public_origin)
                .trim_end_matches('/')
                .to_string(),
            short_link_param: var("FRAMELINK_SHORT_LINK_PARAM")
                .unwrap_or(defaults.short_link_param),
            secret_param: var("FRAMELINK_SECRET_PARAM").unwrap_or(defaults.secret_param),
            max_upload_bytes: max_upload_bytes.unwrap_or(defaults.max_upload_bytes),
            photos_stale_secs: var("FRAMELINK_PHOTOS_STALE_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.photos_stale_secs),
            short_link_stale_secs: var("FRAMELINK_SHORT_LINK_STALE_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.short_link_stale_secs),
            authorization_stale_secs: var("FRAMELINK_AUTHORIZATION_STALE_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.authorization_stale_secs),
            share_attempts: var("FRAMELINK_SHARE_ATTEMPTS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.share_attempts),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        for (name, url) in [
            ("FRAMELINK_API_URL", &self.api_url),
            ("FRAMELINK_PUBLIC_ORIGIN", &self.public_origin),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow::anyhow!("{} must be an http(s) URL", name));
            }
        }

        if self.short_link_param.is_empty()
            || self
                .short_link_param
                .contains(['/', '&', '=', '#', '?'])
        {
            return Err(anyhow::anyhow!(
                "FRAMELINK_SHORT_LINK_PARAM must be a plain key without '/', '&', '=', '#' or '?'"
            ));
        }

        if self.secret_param.is_empty() {
            return Err(anyhow::anyhow!("FRAMELINK_SECRET_PARAM must not be empty"));
        }

        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!(
                "FRAMELINK_MAX_UPLOAD_MB must be greater than zero"
            ));
        }

        if self.share_attempts == 0 {
            return Err(anyhow::anyhow!("FRAMELINK_SHARE_ATTEMPTS must be at least 1"));
        }

        Ok(())
    }

    /// API path prefix, e.g. `/api/v1`.
    pub fn api_prefix(&self) -> String {
        format!("/api/{}", self.api_version)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn photos_stale_time(&self) -> Duration {
        Duration::from_secs(self.photos_stale_secs)
    }

    pub fn short_link_stale_time(&self) -> Duration {
        Duration::from_secs(self.short_link_stale_secs)
    }

    pub fn authorization_stale_time(&self) -> Duration {
        Duration::from_secs(self.authorization_stale_secs)
    }

    /// Identity described by the configured credential.
    pub fn identity(&self) -> Identity {
        match (&self.api_token, self.auth_scheme) {
            (None, _) => Identity::Anonymous,
            (Some(token), AuthScheme::Bearer) => Identity::Bearer(token.clone()),
            (Some(key), AuthScheme::ApiKey) => Identity::ApiKey(key.clone()),
        }
    }
}
