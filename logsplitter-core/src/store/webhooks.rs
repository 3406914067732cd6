//! Webhook endpoints, their delivery history and signing secrets
//!
//! Requires the `api-access` feature for listing and creation. Delivery
//! statistics are computed server-side: a webhook created locally shows
//! zeroed stats until the next list fetch. Signing secrets are returned from
//! create/regenerate and never enter store state.

use std::sync::Arc;

use serde::Deserialize;

use crate::api::{segment, with_query, Api, ApiRequest};
use crate::auth::AuthContext;
use crate::logging;
use crate::types::{
    features, CreateWebhookRequest, CreatedWebhook, Pagination, TestWebhookResult, UpdateWebhookRequest, Webhook,
    WebhookDelivery, WebhookDeliveryStats, WebhookEvent, WebhookWithStats,
};
use crate::validation;

use super::{Lifecycle, Outcome, PagedList, Settle, Shared};

pub const UPGRADE_MESSAGE: &str = "Upgrade to access webhooks";
pub const DEFAULT_DELIVERIES_LIMIT: u32 = 20;

const WEBHOOKS_ENDPOINT: &str = "/api/users/webhooks";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhooksPage {
    webhooks: Vec<WebhookWithStats>,
    #[serde(default)]
    available_events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookDetailPage {
    webhook: Webhook,
    #[serde(default)]
    delivery_stats: WebhookDeliveryStats,
    #[serde(default)]
    available_events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
struct DeliveriesPage {
    deliveries: Vec<WebhookDelivery>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct UpdatedWebhook {
    webhook: Webhook,
}

#[derive(Debug, Deserialize)]
struct RegeneratedSecret {
    secret: String,
}

/// Events the server offers that this client can subscribe to
fn known_events(events: Vec<WebhookEvent>) -> Vec<WebhookEvent> {
    events.into_iter().filter(|e| *e != WebhookEvent::Unknown).collect()
}

/// The webhook open in the detail view and its delivery log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookDetail {
    pub webhook: Option<Webhook>,
    pub stats: Option<WebhookDeliveryStats>,
    pub loading: bool,
    pub error: Option<String>,
    pub deliveries: PagedList<WebhookDelivery>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhooksState {
    pub lifecycle: Lifecycle,
    pub webhooks: Vec<WebhookWithStats>,
    pub available_events: Vec<WebhookEvent>,
    pub loading: bool,
    pub error: Option<String>,
    pub detail: WebhookDetail,
    pub creating: bool,
    /// Ids with an action in flight
    pub updating: Option<String>,
    pub deleting: Option<String>,
    pub testing: Option<String>,
    pub regenerating: Option<String>,
}

impl Settle for WebhooksState {
    fn settle(&mut self) {
        self.loading = false;
        self.detail.loading = false;
        self.detail.deliveries.abandon();
        self.creating = false;
        self.updating = None;
        self.deleting = None;
        self.testing = None;
        self.regenerating = None;
    }
}

/// Store for `/api/users/webhooks`
#[derive(Clone)]
pub struct WebhooksStore {
    shared: Arc<Shared<WebhooksState>>,
}

impl WebhooksStore {
    pub fn new(api: Api, auth: Arc<AuthContext>) -> Self {
        Self {
            shared: Shared::new(api, auth, WebhooksState::default()),
        }
    }

    pub fn state(&self) -> WebhooksState {
        self.shared.snapshot()
    }

    pub fn has_webhook_access(&self) -> bool {
        self.shared.auth.has_feature(features::API_ACCESS)
    }

    fn webhook_endpoint(id: &str) -> String {
        format!("{}/{}", WEBHOOKS_ENDPOINT, segment(id))
    }

    /// Initial list fetch, skipped entirely without `api-access`
    pub async fn ensure_loaded(&self) -> bool {
        if !self.has_webhook_access() || !self.shared.with(|s| s.lifecycle.try_begin()) {
            return false;
        }
        let ok = self.fetch_webhooks().await.success;
        self.shared.with(|s| s.lifecycle.finish(ok));
        ok
    }

    pub async fn fetch_webhooks(&self) -> Outcome {
        if !self.has_webhook_access() {
            self.shared.with(|s| {
                s.loading = false;
                s.error = Some(UPGRADE_MESSAGE.to_string());
            });
            return Outcome::failed(UPGRADE_MESSAGE);
        }

        self.shared.with(|s| {
            s.loading = true;
            s.error = None;
        });

        let Some(response) = self.shared.call::<WebhooksPage>(ApiRequest::get(WEBHOOKS_ENDPOINT)).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to fetch webhooks");
        let page = response.into_data();
        self.shared
            .apply(|s| {
                s.loading = false;
                match page {
                    Some(page) => {
                        s.webhooks = page.webhooks;
                        s.available_events = known_events(page.available_events);
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

    pub async fn fetch_webhook_detail(&self, id: &str) -> Outcome {
        self.shared.with(|s| {
            s.detail.loading = true;
            s.detail.error = None;
        });

        let request = ApiRequest::get(Self::webhook_endpoint(id));
        let Some(response) = self.shared.call::<WebhookDetailPage>(request).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to fetch webhook details");
        let page = response.into_data();
        self.shared
            .apply(|s| {
                s.detail.loading = false;
                match page {
                    Some(page) => {
                        if s.detail.webhook.as_ref().is_some_and(|w| w.id != id) {
                            s.detail.deliveries.clear();
                        }
                        s.detail.webhook = Some(page.webhook);
                        s.detail.stats = Some(page.delivery_stats);
                        let events = known_events(page.available_events);
                        if !events.is_empty() {
                            s.available_events = events;
                        }
                        Outcome::done()
                    }
                    None => {
                        s.detail.error = Some(error.clone());
                        Outcome::failed(error)
                    }
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// One page of a webhook's delivery log. Offset 0 replaces, later offsets append.
    pub async fn fetch_deliveries(&self, id: &str, limit: u32, offset: u32) -> Outcome {
        self.shared.with(|s| s.detail.deliveries.begin());
        self.fetch_deliveries_page(id, limit, offset).await
    }

    async fn fetch_deliveries_page(&self, id: &str, limit: u32, offset: u32) -> Outcome {
        let endpoint = with_query(
            &format!("{}/deliveries", Self::webhook_endpoint(id)),
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        );
        let Some(response) = self.shared.call::<DeliveriesPage>(ApiRequest::get(endpoint)).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to fetch deliveries");
        let page = response.into_data();
        self.shared
            .apply(|s| match page {
                Some(page) => {
                    s.detail.deliveries.apply_page(offset, page.deliveries, Some(page.pagination));
                    Outcome::done()
                }
                None => {
                    s.detail.deliveries.fail(error.clone());
                    Outcome::failed(error)
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Append the next page of deliveries, continuing from what is loaded.
    ///
    /// Returns `None` without any request when there is no next page or a
    /// deliveries fetch is already running.
    pub async fn load_more_deliveries(&self, id: &str) -> Option<Outcome> {
        let offset = self.shared.with(|s| {
            let list = &mut s.detail.deliveries;
            if list.loading || !list.has_more() {
                return None;
            }
            list.begin();
            Some(list.items.len() as u32)
        })?;
        Some(self.fetch_deliveries_page(id, DEFAULT_DELIVERIES_LIMIT, offset).await)
    }

    /// Create a webhook. The signing secret is only in the returned outcome.
    pub async fn create_webhook(&self, request: CreateWebhookRequest) -> Outcome<CreatedWebhook> {
        if !self.has_webhook_access() {
            return Outcome::failed(UPGRADE_MESSAGE);
        }
        let request = match validation::normalize_create_webhook(request) {
            Ok(request) => request,
            Err(e) => return e.into(),
        };

        self.shared.with(|s| s.creating = true);

        let Some(response) = self
            .shared
            .call::<CreatedWebhook>(ApiRequest::post(WEBHOOKS_ENDPOINT).json(&request))
            .await
        else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to create webhook");
        let created = response.into_data();
        self.shared
            .apply(|s| {
                s.creating = false;
                match created {
                    Some(created) => {
                        tracing::info!(webhook_id = %created.webhook.id, url = %logging::redact_url(&created.webhook.url), "Created webhook");
                        s.webhooks.insert(
                            0,
                            WebhookWithStats {
                                webhook: created.webhook.clone(),
                                delivery_stats: WebhookDeliveryStats::default(),
                            },
                        );
                        Outcome::ok(created)
                    }
                    None => Outcome::failed(error),
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Partial update; the returned webhook is merged into the list (keeping
    /// its stats) and into the detail view when it is the one shown.
    pub async fn update_webhook(&self, id: &str, update: UpdateWebhookRequest) -> Outcome {
        let update = match validation::normalize_update_webhook(update) {
            Ok(update) => update,
            Err(e) => return e.into(),
        };

        self.shared.with(|s| s.updating = Some(id.to_string()));

        let request = ApiRequest::put(Self::webhook_endpoint(id)).json(&update);
        let Some(response) = self.shared.call::<UpdatedWebhook>(request).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to update webhook");
        let updated = response.into_data();
        self.shared
            .apply(|s| {
                s.updating = None;
                let Some(UpdatedWebhook { webhook }) = updated else {
                    return Outcome::failed(error);
                };
                if let Some(entry) = s.webhooks.iter_mut().find(|w| w.webhook.id == id) {
                    entry.webhook = webhook.clone();
                }
                if s.detail.webhook.as_ref().is_some_and(|w| w.id == id) {
                    s.detail.webhook = Some(webhook);
                }
                Outcome::done()
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Enable or disable delivery
    pub async fn toggle_active(&self, id: &str, is_active: bool) -> Outcome {
        self.update_webhook(
            id,
            UpdateWebhookRequest {
                is_active: Some(is_active),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete_webhook(&self, id: &str) -> Outcome {
        self.shared.with(|s| s.deleting = Some(id.to_string()));

        let request = ApiRequest::delete(Self::webhook_endpoint(id));
        let Some(response) = self.shared.call::<serde_json::Value>(request).await else {
            return Outcome::cancelled();
        };

        self.shared
            .apply(|s| {
                s.deleting = None;
                if !response.success {
                    return Outcome::failed(response.error_or("Failed to delete webhook"));
                }
                tracing::info!(webhook_id = %id, "Deleted webhook");
                s.webhooks.retain(|w| w.webhook.id != id);
                if s.detail.webhook.as_ref().is_some_and(|w| w.id == id) {
                    s.detail = WebhookDetail::default();
                }
                Outcome::done()
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Ask the server to send a test event
    pub async fn test_webhook(&self, id: &str) -> Outcome<TestWebhookResult> {
        self.shared.with(|s| s.testing = Some(id.to_string()));

        let request = ApiRequest::post(format!("{}/test", Self::webhook_endpoint(id)));
        let Some(response) = self.shared.call::<TestWebhookResult>(request).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to test webhook");
        let result = response.into_data();
        self.shared
            .apply(|s| {
                s.testing = None;
                match result {
                    Some(result) => Outcome::ok(result),
                    None => Outcome::failed(error),
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Rotate the signing secret; the new secret is only in the returned outcome.
    pub async fn regenerate_secret(&self, id: &str) -> Outcome<String> {
        self.shared.with(|s| s.regenerating = Some(id.to_string()));

        let request = ApiRequest::post(format!("{}/regenerate-secret", Self::webhook_endpoint(id)));
        let Some(response) = self.shared.call::<RegeneratedSecret>(request).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to regenerate secret");
        let regenerated = response.into_data();
        self.shared
            .apply(|s| {
                s.regenerating = None;
                match regenerated {
                    Some(RegeneratedSecret { secret }) => {
                        tracing::info!(webhook_id = %id, "Regenerated webhook secret");
                        Outcome::ok(secret)
                    }
                    None => Outcome::failed(error),
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    pub fn clear_detail(&self) {
        self.shared.with(|s| s.detail = WebhookDetail::default());
    }

    pub fn close(&self) {
        self.shared.scope.cancel();
    }
}
