//! Session-wide entry point
//!
//! [`LogSplitter`] owns the authenticated [`Api`] and the shared
//! [`AuthContext`], and hands out stores wired to both.

use std::sync::Arc;

use crate::api::Api;
use crate::auth::{AuthContext, AuthPhase};
use crate::config::Config;
use crate::error::Result;
use crate::identity::IdentityProvider;
use crate::store::{
    AnalyticsStore, ApiKeysStore, BillingStore, DashboardStore, ProfileStore, SearchStore, UploadStore,
    UploadsStore, WebhooksStore,
};

#[derive(Clone)]
pub struct LogSplitter {
    api: Api,
    auth: Arc<AuthContext>,
}

impl LogSplitter {
    /// Build the API handle and auth context. No request is sent yet.
    pub fn new(config: &Config, identity: Arc<dyn IdentityProvider>) -> Result<Self> {
        let api = Api::new(config, identity)?;
        let auth = AuthContext::new(api.clone());
        Ok(Self { api, auth })
    }

    /// Build, then sync the session (fetching permissions when signed in)
    pub async fn connect(config: &Config, identity: Arc<dyn IdentityProvider>) -> Result<Self> {
        let client = Self::new(config, identity)?;
        let phase = client.auth.sync_session().await;
        tracing::debug!(?phase, "Connected");
        Ok(client)
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn auth(&self) -> &Arc<AuthContext> {
        &self.auth
    }

    pub fn phase(&self) -> AuthPhase {
        self.auth.phase()
    }

    pub fn uploads(&self) -> UploadsStore {
        UploadsStore::new(self.api.clone(), self.auth.clone())
    }

    /// Upload store; pass the list store to have new uploads prepended to it
    pub fn upload(&self, list: Option<UploadsStore>) -> UploadStore {
        let store = UploadStore::new(self.api.clone(), self.auth.clone());
        match list {
            Some(list) => store.with_list(list),
            None => store,
        }
    }

    pub fn search(&self) -> SearchStore {
        SearchStore::new(self.api.clone(), self.auth.clone())
    }

    pub fn analytics(&self) -> AnalyticsStore {
        AnalyticsStore::new(self.api.clone(), self.auth.clone())
    }

    pub fn api_keys(&self) -> ApiKeysStore {
        ApiKeysStore::new(self.api.clone(), self.auth.clone())
    }

    pub fn webhooks(&self) -> WebhooksStore {
        WebhooksStore::new(self.api.clone(), self.auth.clone())
    }

    pub fn profile(&self) -> ProfileStore {
        ProfileStore::new(self.api.clone(), self.auth.clone())
    }

    pub fn dashboard(&self) -> DashboardStore {
        DashboardStore::new(self.api.clone(), self.auth.clone())
    }

    pub fn billing(&self) -> BillingStore {
        BillingStore::new(self.api.clone(), self.auth.clone())
    }

    /// Cancel the permissions fetch and every store handed out by this client
    pub fn close(&self) {
        self.auth.close();
    }
}
