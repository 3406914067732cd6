//! Dashboard aggregate

use std::sync::Arc;

use crate::api::{Api, ApiRequest};
use crate::auth::AuthContext;
use crate::types::DashboardData;

use super::{Lifecycle, Outcome, Settle, Shared};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub lifecycle: Lifecycle,
    pub data: Option<DashboardData>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Settle for DashboardState {
    fn settle(&mut self) {
        self.loading = false;
    }
}

/// Store for `GET /api/dashboard`
#[derive(Clone)]
pub struct DashboardStore {
    shared: Arc<Shared<DashboardState>>,
}

impl DashboardStore {
    pub fn new(api: Api, auth: Arc<AuthContext>) -> Self {
        Self {
            shared: Shared::new(api, auth, DashboardState::default()),
        }
    }

    pub fn state(&self) -> DashboardState {
        self.shared.snapshot()
    }

    pub async fn ensure_loaded(&self) -> bool {
        if !self.shared.with(|s| s.lifecycle.try_begin()) {
            return false;
        }
        let ok = self.fetch_dashboard().await.success;
        self.shared.with(|s| s.lifecycle.finish(ok));
        ok
    }

    pub async fn fetch_dashboard(&self) -> Outcome {
        self.shared.with(|s| {
            s.loading = true;
            s.error = None;
        });

        let Some(response) = self
            .shared
            .call::<DashboardData>(ApiRequest::get("/api/dashboard"))
            .await
        else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to fetch dashboard data");
        let data = response.into_data();
        self.shared
            .apply(|s| {
                s.loading = false;
                match data {
                    Some(data) => {
                        s.data = Some(data);
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

    pub fn close(&self) {
        self.shared.scope.cancel();
    }
}
