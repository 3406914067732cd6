//! Identity provider seam
//!
//! Sign-in, sign-up and token issuance belong to an external identity
//! provider. This crate only asks it two things: who is signed in, and a
//! short-lived bearer token for the next request.

use async_trait::async_trait;

use crate::config::IdentityConfig;
use crate::error::{Error, Result};

/// Session as reported by the identity provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub is_loaded: bool,
    pub is_signed_in: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
}

impl Session {
    pub fn signed_out() -> Self {
        Self {
            is_loaded: true,
            ..Default::default()
        }
    }

    pub fn signed_in(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            is_loaded: true,
            is_signed_in: true,
            user_id: Some(user_id.into()),
            email,
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current session state
    async fn session(&self) -> Session;

    /// Mint a bearer token, optionally using a named template.
    ///
    /// `Ok(None)` means there is no signed-in user.
    async fn token(&self, template: Option<&str>) -> Result<Option<String>>;
}

/// Identity backed by a pre-issued token from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    token: Option<String>,
    user_id: Option<String>,
    email: Option<String>,
}

impl StaticIdentity {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
            user_id: None,
            email: None,
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        let mut identity = Self::new(config.token.clone());
        identity.user_id = config.user_id.clone();
        identity.email = config.email.clone();
        identity
    }

    pub fn with_user(mut self, user_id: impl Into<String>, email: Option<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.email = email;
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn session(&self) -> Session {
        match &self.token {
            Some(_) => Session::signed_in(
                self.user_id.clone().unwrap_or_else(|| "me".to_string()),
                self.email.clone(),
            ),
            None => Session::signed_out(),
        }
    }

    async fn token(&self, _template: Option<&str>) -> Result<Option<String>> {
        Ok(self.token.clone())
    }
}

/// Identity whose token source always fails; used to exercise degraded paths
#[derive(Debug, Clone, Default)]
pub struct UnavailableIdentity;

#[async_trait]
impl IdentityProvider for UnavailableIdentity {
    async fn session(&self) -> Session {
        Session::signed_in("unknown", None)
    }

    async fn token(&self, _template: Option<&str>) -> Result<Option<String>> {
        Err(Error::Identity("identity provider unreachable".to_string()))
    }
}
