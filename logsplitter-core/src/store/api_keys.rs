//! API key management
//!
//! Requires the `api-access` feature. Key secrets are returned from
//! [`ApiKeysStore::create_key`] and never enter store state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::{segment, Api, ApiRequest};
use crate::auth::AuthContext;
use crate::types::{features, ApiKey, CreatedApiKey};
use crate::validation;

use super::{Lifecycle, Outcome, Settle, Shared};

pub const UPGRADE_MESSAGE: &str = "Upgrade to access API keys";

const KEYS_ENDPOINT: &str = "/api/users/api-keys";

#[derive(Debug, Deserialize)]
struct KeysPage {
    keys: Vec<ApiKey>,
}

#[derive(Debug, Serialize)]
struct CreateKeyBody<'a> {
    name: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiKeysState {
    pub lifecycle: Lifecycle,
    /// Active keys only; revoked keys are dropped
    pub keys: Vec<ApiKey>,
    pub loading: bool,
    pub error: Option<String>,
    pub creating: bool,
    pub create_error: Option<String>,
    /// Id of the key currently being revoked
    pub revoking: Option<String>,
}

impl Settle for ApiKeysState {
    fn settle(&mut self) {
        self.loading = false;
        self.creating = false;
        self.revoking = None;
    }
}

/// Store for `/api/users/api-keys`
#[derive(Clone)]
pub struct ApiKeysStore {
    shared: Arc<Shared<ApiKeysState>>,
}

impl ApiKeysStore {
    pub fn new(api: Api, auth: Arc<AuthContext>) -> Self {
        Self {
            shared: Shared::new(api, auth, ApiKeysState::default()),
        }
    }

    pub fn state(&self) -> ApiKeysState {
        self.shared.snapshot()
    }

    pub fn has_api_access(&self) -> bool {
        self.shared.auth.has_feature(features::API_ACCESS)
    }

    /// Initial fetch, skipped entirely without `api-access`
    pub async fn ensure_loaded(&self) -> bool {
        if !self.has_api_access() || !self.shared.with(|s| s.lifecycle.try_begin()) {
            return false;
        }
        let ok = self.fetch_keys().await.success;
        self.shared.with(|s| s.lifecycle.finish(ok));
        ok
    }

    pub async fn fetch_keys(&self) -> Outcome {
        if !self.has_api_access() {
            self.shared.with(|s| s.error = Some(UPGRADE_MESSAGE.to_string()));
            return Outcome::failed(UPGRADE_MESSAGE);
        }

        self.shared.with(|s| {
            s.loading = true;
            s.error = None;
        });

        let Some(response) = self.shared.call::<KeysPage>(ApiRequest::get(KEYS_ENDPOINT)).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to fetch API keys");
        let page = response.into_data();
        self.shared
            .apply(|s| {
                s.loading = false;
                match page {
                    Some(page) => {
                        s.keys = page.keys.into_iter().filter(|k| !k.is_revoked).collect();
                        Outcome::done()
                    }
                    None => {
                        s.error = Some(error.clone());
                        Outcome::failed(error)
                    }
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Mint a key. The secret is only in the returned outcome.
    pub async fn create_key(&self, name: &str) -> Outcome<CreatedApiKey> {
        if !self.has_api_access() {
            return Outcome::failed(UPGRADE_MESSAGE);
        }
        let name = match validation::validate_key_name(name) {
            Ok(name) => name,
            Err(e) => {
                self.shared.with(|s| s.create_error = Some(e.to_string()));
                return e.into();
            }
        };

        self.shared.with(|s| {
            s.creating = true;
            s.create_error = None;
        });

        let request = ApiRequest::post(KEYS_ENDPOINT).json(&CreateKeyBody { name: &name });
        let Some(response) = self.shared.call::<CreatedApiKey>(request).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to create API key");
        let created = response.into_data();
        self.shared
            .apply(|s| {
                s.creating = false;
                match created {
                    Some(created) => {
                        tracing::info!(key_id = %created.key.id, prefix = %created.key.prefix, "Created API key");
                        s.keys.insert(0, ApiKey::from(created.key.clone()));
                        Outcome::ok(created)
                    }
                    None => {
                        s.create_error = Some(error.clone());
                        Outcome::failed(error)
                    }
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    pub async fn revoke_key(&self, id: &str) -> Outcome {
        self.shared.with(|s| s.revoking = Some(id.to_string()));

        let request = ApiRequest::delete(format!("{}/{}", KEYS_ENDPOINT, segment(id)));
        let Some(response) = self.shared.call::<serde_json::Value>(request).await else {
            return Outcome::cancelled();
        };

        self.shared
            .apply(|s| {
                s.revoking = None;
                if response.success {
                    tracing::info!(key_id = %id, "Revoked API key");
                    s.keys.retain(|k| k.id != id);
                    Outcome::done()
                } else {
                    Outcome::failed(response.error_or("Failed to revoke API key"))
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    pub fn close(&self) {
        self.shared.scope.cancel();
    }
}
