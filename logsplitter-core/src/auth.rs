//! Auth/permissions context
//!
//! Holds the identity provider's session and the permissions snapshot (feature
//! flags + usage limits) for the signed-in user. It is the snapshot's only
//! writer; stores read it through [`AuthContext::has_feature`] and
//! [`AuthContext::check_limit`] and ask for a refresh after actions known to
//! change usage. There is no push invalidation.
//!
//! ```text
//! Uninitialized ──► SignedOut
//!       │
//!       └─────────► SignedIn(Loading) ──► SignedIn(Ready | Unavailable)
//! ```

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::api::{Api, ApiRequest};
use crate::identity::Session;
use crate::store::{Outcome, Scope};
use crate::types::{Permissions, UsageLimit};

const PERMISSIONS_ENDPOINT: &str = "/api/users/permissions";

/// Where the permissions snapshot stands for a signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionsStatus {
    Loading,
    Ready,
    /// The last fetch failed and no snapshot was ever loaded
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Uninitialized,
    SignedOut,
    SignedIn(PermissionsStatus),
}

/// Allowance left under a usage limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Unlimited,
    Count(i64),
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remaining::Unlimited => f.write_str("unlimited"),
            Remaining::Count(n) => write!(f, "{}", n),
        }
    }
}

/// Answer to "may I consume one more unit of this limit?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitCheck {
    pub allowed: bool,
    pub remaining: Remaining,
    pub max: i64,
    pub used: i64,
}

impl LimitCheck {
    /// Limits the server does not configure are treated as unlimited.
    pub fn from_limit(limit: Option<&UsageLimit>) -> Self {
        match limit {
            None => LimitCheck {
                allowed: true,
                remaining: Remaining::Unlimited,
                max: -1,
                used: 0,
            },
            Some(limit) if limit.is_unlimited() => LimitCheck {
                allowed: true,
                remaining: Remaining::Unlimited,
                max: limit.max,
                used: limit.used,
            },
            Some(limit) => LimitCheck {
                allowed: limit.remaining > 0,
                remaining: Remaining::Count(limit.remaining.max(0)),
                max: limit.max,
                used: limit.used,
            },
        }
    }
}

#[derive(Debug)]
struct AuthState {
    session: Session,
    phase: AuthPhase,
    permissions: Option<Permissions>,
    permissions_loading: bool,
    last_error: Option<String>,
}

/// Session-lifetime auth state shared by every store
pub struct AuthContext {
    api: Api,
    state: RwLock<AuthState>,
    scope: Scope,
}

impl AuthContext {
    pub fn new(api: Api) -> Arc<Self> {
        Arc::new(Self {
            api,
            state: RwLock::new(AuthState {
                session: Session::default(),
                phase: AuthPhase::Uninitialized,
                permissions: None,
                permissions_loading: false,
                last_error: None,
            }),
            scope: Scope::new(),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, AuthState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, AuthState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Pull the session from the identity provider and react to transitions.
    ///
    /// Entering the signed-in state (or switching users) triggers exactly one
    /// permissions fetch; staying signed in as the same user triggers none.
    pub async fn sync_session(&self) -> AuthPhase {
        let session = self.api.identity().session().await;

        let needs_fetch = {
            let mut state = self.write();
            let was_signed_in = matches!(state.phase, AuthPhase::SignedIn(_));
            let same_user = state.session.user_id == session.user_id;

            let needs_fetch = if !session.is_loaded {
                state.phase = AuthPhase::Uninitialized;
                false
            } else if !session.is_signed_in {
                state.phase = AuthPhase::SignedOut;
                state.permissions = None;
                false
            } else if !was_signed_in || !same_user {
                state.phase = AuthPhase::SignedIn(PermissionsStatus::Loading);
                state.permissions = None;
                true
            } else {
                false
            };
            state.session = session;
            needs_fetch
        };

        if needs_fetch {
            tracing::info!("Session signed in, fetching permissions");
            let _ = self.refresh_permissions().await;
        }
        self.phase()
    }

    /// Re-fetch the permissions snapshot.
    ///
    /// Success replaces the snapshot wholesale; failure leaves the previous
    /// snapshot in place.
    pub async fn refresh_permissions(&self) -> Outcome {
        {
            let mut state = self.write();
            if !state.session.is_signed_in {
                state.permissions = None;
                return Outcome::failed("Not signed in");
            }
            state.permissions_loading = true;
        }

        let response = self
            .scope
            .run(self.api.call::<Permissions>(ApiRequest::get(PERMISSIONS_ENDPOINT)))
            .await;

        let mut state = self.write();
        state.permissions_loading = false;

        let Some(response) = response else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to fetch permissions");
        match response.into_data() {
            Some(permissions) => {
                tracing::debug!(
                    plan = permissions.plan.as_deref().unwrap_or("unknown"),
                    features = permissions.features.len(),
                    limits = permissions.limits.len(),
                    "Permissions refreshed"
                );
                state.permissions = Some(permissions);
                state.last_error = None;
                state.phase = AuthPhase::SignedIn(PermissionsStatus::Ready);
                Outcome::done()
            }
            None => {
                tracing::warn!(error = %error, "Failed to fetch permissions");
                if state.permissions.is_none() {
                    state.phase = AuthPhase::SignedIn(PermissionsStatus::Unavailable);
                }
                state.last_error = Some(error.clone());
                Outcome::failed(error)
            }
        }
    }

    /// Feature flag lookup; missing or unloaded flags are off
    pub fn has_feature(&self, slug: &str) -> bool {
        self.read()
            .permissions
            .as_ref()
            .and_then(|p| p.features.get(slug))
            .copied()
            .unwrap_or(false)
    }

    pub fn check_limit(&self, slug: &str) -> LimitCheck {
        let state = self.read();
        LimitCheck::from_limit(state.permissions.as_ref().and_then(|p| p.limits.get(slug)))
    }

    pub fn permissions(&self) -> Option<Permissions> {
        self.read().permissions.clone()
    }

    pub fn permissions_loading(&self) -> bool {
        self.read().permissions_loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    pub fn session(&self) -> Session {
        self.read().session.clone()
    }

    pub fn phase(&self) -> AuthPhase {
        self.read().phase
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.phase(), AuthPhase::SignedIn(_))
    }

    /// Bearer token for the current user, `None` on failure
    pub async fn token(&self) -> Option<String> {
        self.api.token().await
    }

    /// Scope for a new store, cancelled along with this context
    pub(crate) fn child_scope(&self) -> Scope {
        self.scope.child()
    }

    /// Cancel the permissions fetch and every store created from this context
    pub fn close(&self) {
        self.scope.cancel();
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
