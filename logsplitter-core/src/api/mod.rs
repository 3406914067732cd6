//! LogSplitter REST API access
//!
//! Two layers:
//! - [`HttpClient`] performs one request and normalizes the outcome to an
//!   [`ApiResponse`] envelope. It never fails to its caller.
//! - [`Api`] wraps it with a fresh bearer token from the
//!   [`IdentityProvider`](crate::identity::IdentityProvider) on every call.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use logsplitter_core::api::{Api, ApiRequest};
//! use logsplitter_core::identity::StaticIdentity;
//! use logsplitter_core::Config;
//!
//! # async fn run() -> logsplitter_core::Result<()> {
//! let config = Config::load()?;
//! let identity = Arc::new(StaticIdentity::from_config(&config.identity));
//! let api = Api::new(&config, identity)?;
//! let res: logsplitter_core::api::ApiResponse<serde_json::Value> =
//!     api.call(ApiRequest::get("/api/analytics/stats")).await;
//! # Ok(())
//! # }
//! ```

mod client;
mod envelope;

use std::sync::Arc;

use serde::de::DeserializeOwned;

pub use client::{ApiRequest, HttpClient, MultipartFile};
pub use envelope::{ApiResponse, API_ERROR, INVALID_JSON, INVALID_JSON_MESSAGE};

use crate::config::Config;
use crate::error::Result;
use crate::identity::IdentityProvider;

/// Authenticated API handle
#[derive(Clone)]
pub struct Api {
    http: HttpClient,
    identity: Arc<dyn IdentityProvider>,
    token_template: Option<String>,
}

impl Api {
    pub fn new(config: &Config, identity: Arc<dyn IdentityProvider>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(&config.api)?,
            identity,
            token_template: config.identity.jwt_template.clone(),
        })
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Mint a token for the next call. Failure degrades to `None`.
    pub async fn token(&self) -> Option<String> {
        match self.identity.token(self.token_template.as_deref()).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Token acquisition failed, sending unauthenticated request");
                None
            }
        }
    }

    /// Send a request carrying the current user's bearer token
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResponse<T> {
        let token = self.token().await;
        self.http.send(request, token.as_deref()).await
    }

    /// Send a request without any credentials
    pub async fn call_public<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResponse<T> {
        self.http.send(request, None).await
    }
}

/// Percent-encode one path segment (ids are opaque server strings)
pub fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Append `key=value` pairs to `path`, encoding values
pub fn with_query(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect();
    format!("{}?{}", path, query.join("&"))
}
