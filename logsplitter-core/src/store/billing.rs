//! Plans catalog, checkout and customer portal
//!
//! Checkout and portal actions return the URL to open; the caller decides how
//! to get the user there.

use std::sync::Arc;

use serde::Serialize;

use crate::api::{Api, ApiRequest};
use crate::auth::AuthContext;
use crate::types::{CheckoutSession, Plan, PortalSession};

use super::{Outcome, Settle, Shared};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutBody<'a> {
    plan_slug: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillingState {
    pub plans: Vec<Plan>,
    pub plans_loading: bool,
    pub plans_error: Option<String>,
    /// A checkout or portal request is in flight
    pub loading: bool,
}

impl Settle for BillingState {
    fn settle(&mut self) {
        self.plans_loading = false;
        self.loading = false;
    }
}

/// Store for `/api/stripe/*`
#[derive(Clone)]
pub struct BillingStore {
    shared: Arc<Shared<BillingState>>,
}

impl BillingStore {
    pub fn new(api: Api, auth: Arc<AuthContext>) -> Self {
        Self {
            shared: Shared::new(api, auth, BillingState::default()),
        }
    }

    pub fn state(&self) -> BillingState {
        self.shared.snapshot()
    }

    /// Public catalog; sent without credentials
    pub async fn fetch_plans(&self) -> Outcome {
        self.shared.with(|s| {
            s.plans_loading = true;
            s.plans_error = None;
        });

        let Some(response) = self
            .shared
            .call_public::<Vec<Plan>>(ApiRequest::get("/api/stripe/plans"))
            .await
        else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to fetch plans");
        let plans = response.into_data();
        self.shared
            .apply(|s| {
                s.plans_loading = false;
                match plans {
                    Some(plans) => {
                        s.plans = plans;
                        Outcome::done()
                    }
                    None => {
                        s.plans_error = Some(error.clone());
                        Outcome::failed(error)
                    }
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Start a plan change. Yields the redirect for free plans or the hosted
    /// checkout URL for paid ones.
    pub async fn create_checkout_session(&self, plan_slug: &str) -> Outcome<String> {
        self.shared.with(|s| s.loading = true);

        let request =
            ApiRequest::post("/api/stripe/create-checkout-session").json(&CheckoutBody { plan_slug });
        let Some(response) = self.shared.call::<CheckoutSession>(request).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to create checkout");
        let session = response.into_data();
        self.shared
            .apply(|s| {
                s.loading = false;
                match session.as_ref().and_then(CheckoutSession::destination) {
                    Some(url) => {
                        tracing::info!(plan = plan_slug, "Checkout session created");
                        Outcome::ok(url.to_string())
                    }
                    None => Outcome::failed(error),
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// URL of the billing self-service portal
    pub async fn open_customer_portal(&self) -> Outcome<String> {
        self.shared.with(|s| s.loading = true);

        let request = ApiRequest::post("/api/stripe/create-portal-session");
        let Some(response) = self.shared.call::<PortalSession>(request).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to open portal");
        let session = response.into_data();
        self.shared
            .apply(|s| {
                s.loading = false;
                match session.map(|p| p.url).filter(|url| !url.is_empty()) {
                    Some(url) => Outcome::ok(url),
                    None => Outcome::failed(error),
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    pub fn close(&self) {
        self.shared.scope.cancel();
    }
}
