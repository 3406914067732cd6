//! Resource stores
//!
//! One store per API resource. Each store owns its list/detail state, issues
//! calls through [`Api`], and reconciles local state with server responses:
//! - list pages fetched at offset 0 replace, later pages append ([`PagedList`])
//! - creates prepend, deletes filter out, updates merge into list and detail
//! - every action returns an [`Outcome`] instead of failing
//! - failures set a store-local error and leave loaded state untouched
//!
//! Stores are cheap `Clone` handles over shared state. State is behind a
//! `std::sync::Mutex` that is never held across an `.await`; read it through
//! each store's `state()` snapshot. Every store owns a [`Scope`], a child of
//! the auth context's: after the store's `close()`, the client's `close()`,
//! or when the last handle drops, in-flight responses are discarded rather
//! than written into state.

mod lifecycle;
mod outcome;
mod paged;
mod scope;

pub mod analytics;
pub mod api_keys;
pub mod billing;
pub mod dashboard;
pub mod profile;
pub mod search;
pub mod upload;
pub mod uploads;
pub mod webhooks;

use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;

pub use lifecycle::{Lifecycle, INITIAL_FETCH_RETRIES};
pub use outcome::{Outcome, CANCELLED_MESSAGE};
pub use paged::{PageRequest, PagedList};
pub use scope::Scope;

pub use analytics::AnalyticsStore;
pub use api_keys::ApiKeysStore;
pub use billing::BillingStore;
pub use dashboard::DashboardStore;
pub use profile::ProfileStore;
pub use search::SearchStore;
pub use upload::UploadStore;
pub use uploads::UploadsStore;
pub use webhooks::WebhooksStore;

use crate::api::{Api, ApiRequest, ApiResponse};
use crate::auth::AuthContext;

/// Store state that can clear its in-flight markers.
///
/// Run when a request is cut off by the scope, so a closed store never
/// reports work as still loading.
pub(crate) trait Settle {
    fn settle(&mut self);
}

/// State and collaborators shared by all handles of one store
pub(crate) struct Shared<S> {
    pub(crate) api: Api,
    pub(crate) auth: Arc<AuthContext>,
    pub(crate) scope: Scope,
    state: Mutex<S>,
}

impl<S: Settle> Shared<S> {
    pub(crate) fn new(api: Api, auth: Arc<AuthContext>, state: S) -> Arc<Self> {
        let scope = auth.child_scope();
        Arc::new(Self {
            api,
            auth,
            scope,
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mutate state under the lock
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.lock())
    }

    /// Mutate state with a response, unless the scope was cancelled meanwhile
    pub(crate) fn apply<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        let mut state = self.lock();
        if self.scope.is_cancelled() {
            state.settle();
            return None;
        }
        Some(f(&mut state))
    }

    pub(crate) fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.lock().clone()
    }

    /// Authenticated call raced against the store's scope
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Option<ApiResponse<T>> {
        let response = self.scope.run(self.api.call(request)).await;
        if response.is_none() {
            self.with(S::settle);
        }
        response
    }

    /// Unauthenticated call raced against the store's scope
    pub(crate) async fn call_public<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Option<ApiResponse<T>> {
        let response = self.scope.run(self.api.call_public(request)).await;
        if response.is_none() {
            self.with(S::settle);
        }
        response
    }
}

impl<S> Drop for Shared<S> {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
