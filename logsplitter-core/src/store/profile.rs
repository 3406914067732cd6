//! User profile and preferences

use std::sync::Arc;

use crate::api::{Api, ApiRequest};
use crate::auth::AuthContext;
use crate::types::{SettingsUpdate, UserProfile, UserSettings};

use super::lifecycle::with_initial_retries;
use super::{Lifecycle, Outcome, Settle, Shared, INITIAL_FETCH_RETRIES};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileState {
    pub lifecycle: Lifecycle,
    pub profile: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
    pub saving: bool,
}

impl Settle for ProfileState {
    fn settle(&mut self) {
        self.loading = false;
        self.saving = false;
    }
}

/// Store for `/api/users/profile` and `/api/users/settings`
#[derive(Clone)]
pub struct ProfileStore {
    shared: Arc<Shared<ProfileState>>,
}

impl ProfileStore {
    pub fn new(api: Api, auth: Arc<AuthContext>) -> Self {
        Self {
            shared: Shared::new(api, auth, ProfileState::default()),
        }
    }

    pub fn state(&self) -> ProfileState {
        self.shared.snapshot()
    }

    /// First fetch; runs once per store, with bounded retries.
    pub async fn ensure_loaded(&self) -> bool {
        if !self.shared.with(|s| s.lifecycle.try_begin()) {
            return false;
        }
        let ok = with_initial_retries("profile", INITIAL_FETCH_RETRIES, || async {
            let out = self.fetch_profile().await;
            (!out.is_cancelled()).then_some(out.success)
        })
        .await;
        self.shared.with(|s| s.lifecycle.finish(ok));
        ok
    }

    pub async fn fetch_profile(&self) -> Outcome {
        self.shared.with(|s| {
            s.loading = true;
            s.error = None;
        });

        let Some(response) = self
            .shared
            .call::<UserProfile>(ApiRequest::get("/api/users/profile"))
            .await
        else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to fetch profile");
        let profile = response.into_data();
        self.shared
            .apply(|s| {
                s.loading = false;
                match profile {
                    Some(profile) => {
                        s.profile = Some(profile);
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

    /// Save a partial settings change and merge the server's settings back.
    ///
    /// Permissions are refreshed afterwards since plan-dependent values may
    /// have moved.
    pub async fn update_settings(&self, update: SettingsUpdate) -> Outcome<UserSettings> {
        if update.is_empty() {
            return Outcome::failed("No settings to update");
        }

        self.shared.with(|s| s.saving = true);

        let request = ApiRequest::put("/api/users/settings").json(&update);
        let Some(response) = self.shared.call::<UserSettings>(request).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to update settings");
        let settings = response.into_data();
        let out = self
            .shared
            .apply(|s| {
                s.saving = false;
                match settings {
                    Some(settings) => {
                        if let Some(profile) = s.profile.as_mut() {
                            profile.settings = settings.clone();
                        }
                        Outcome::ok(settings)
                    }
                    None => Outcome::failed(error),
                }
            })
            .unwrap_or_else(Outcome::cancelled);

        if out.success {
            let _ = self.shared.auth.refresh_permissions().await;
        }
        out
    }

    pub fn close(&self) {
        self.shared.scope.cancel();
    }
}
