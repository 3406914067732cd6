//! Analytics feeds
//!
//! Five independent feeds, each with its own loading/error flags. The
//! upload-frequency and error-trend feeds require `advanced-analytics`; the
//! flag is checked before any request goes out.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::api::{with_query, Api, ApiRequest};
use crate::auth::AuthContext;
use crate::types::{features, AnalyticsStats, ErrorTrendItem, RecentUpload, TopError, UploadFrequencyItem};

use super::{Lifecycle, Outcome, Settle, Shared};

pub const DEFAULT_TOP_ERRORS_LIMIT: u32 = 10;
pub const DEFAULT_RECENT_LIMIT: u32 = 10;
pub const DEFAULT_FREQUENCY_DAYS: u32 = 30;
pub const DEFAULT_TREND_HOURS: u32 = 24;

pub const UPGRADE_MESSAGE: &str = "Upgrade to access advanced analytics";

#[derive(Debug, Deserialize)]
struct TopErrorsPage {
    errors: Vec<TopError>,
}

#[derive(Debug, Deserialize)]
struct FrequencyPage {
    frequency: Vec<UploadFrequencyItem>,
}

#[derive(Debug, Deserialize)]
struct TrendPage {
    trend: Vec<ErrorTrendItem>,
}

#[derive(Debug, Deserialize)]
struct RecentPage {
    activity: Vec<RecentUpload>,
}

/// One feed's data with its own flags
#[derive(Debug, Clone, PartialEq)]
pub struct Feed<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T: Default> Default for Feed<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            loading: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsState {
    pub lifecycle: Lifecycle,
    pub stats: Feed<Option<AnalyticsStats>>,
    pub top_errors: Feed<Vec<TopError>>,
    pub upload_frequency: Feed<Vec<UploadFrequencyItem>>,
    pub error_trend: Feed<Vec<ErrorTrendItem>>,
    pub recent: Feed<Vec<RecentUpload>>,
}

impl Settle for AnalyticsState {
    fn settle(&mut self) {
        self.stats.loading = false;
        self.top_errors.loading = false;
        self.upload_frequency.loading = false;
        self.error_trend.loading = false;
        self.recent.loading = false;
    }
}

/// Store for `/api/analytics/*`
#[derive(Clone)]
pub struct AnalyticsStore {
    shared: Arc<Shared<AnalyticsState>>,
}

impl AnalyticsStore {
    pub fn new(api: Api, auth: Arc<AuthContext>) -> Self {
        Self {
            shared: Shared::new(api, auth, AnalyticsState::default()),
        }
    }

    pub fn state(&self) -> AnalyticsState {
        self.shared.snapshot()
    }

    pub fn has_advanced_analytics(&self) -> bool {
        self.shared.auth.has_feature(features::ADVANCED_ANALYTICS)
    }

    /// Fetch one feed: mark it loading, call, then store `extract(data)` or the error
    async fn fetch_feed<R, T, F>(
        &self,
        endpoint: String,
        fallback: &str,
        feed: fn(&mut AnalyticsState) -> &mut Feed<T>,
        extract: F,
    ) -> Outcome
    where
        R: DeserializeOwned,
        F: FnOnce(R) -> T,
    {
        self.shared.with(|s| {
            let f = feed(s);
            f.loading = true;
            f.error = None;
        });

        let Some(response) = self.shared.call::<R>(ApiRequest::get(endpoint.as_str())).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or(fallback);
        let data = response.into_data();
        self.shared
            .apply(|s| {
                let f = feed(s);
                f.loading = false;
                match data {
                    Some(data) => {
                        f.data = extract(data);
                        Outcome::done()
                    }
                    None => {
                        tracing::warn!(endpoint = %endpoint, error = %error, "Analytics feed failed");
                        f.error = Some(error.clone());
                        Outcome::failed(error)
                    }
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Refuse a gated feed locally, without a request
    fn gate<T>(&self, feed: fn(&mut AnalyticsState) -> &mut Feed<T>) -> Option<Outcome> {
        if self.has_advanced_analytics() {
            return None;
        }
        self.shared.with(|s| feed(s).error = Some(UPGRADE_MESSAGE.to_string()));
        Some(Outcome::failed(UPGRADE_MESSAGE))
    }

    pub async fn fetch_stats(&self) -> Outcome {
        self.fetch_feed(
            "/api/analytics/stats".to_string(),
            "Failed to fetch stats",
            |s| &mut s.stats,
            |stats: AnalyticsStats| Some(stats),
        )
        .await
    }

    pub async fn fetch_top_errors(&self, limit: u32) -> Outcome {
        self.fetch_feed(
            with_query("/api/analytics/top-errors", &[("limit", limit.to_string())]),
            "Failed to fetch top errors",
            |s| &mut s.top_errors,
            |page: TopErrorsPage| page.errors,
        )
        .await
    }

    pub async fn fetch_upload_frequency(&self, days: u32) -> Outcome {
        if let Some(refused) = self.gate(|s| &mut s.upload_frequency) {
            return refused;
        }
        self.fetch_feed(
            with_query("/api/analytics/upload-frequency", &[("days", days.to_string())]),
            "Failed to fetch upload frequency",
            |s| &mut s.upload_frequency,
            |page: FrequencyPage| page.frequency,
        )
        .await
    }

    pub async fn fetch_error_trend(&self, hours: u32) -> Outcome {
        if let Some(refused) = self.gate(|s| &mut s.error_trend) {
            return refused;
        }
        self.fetch_feed(
            with_query("/api/analytics/error-trend", &[("hours", hours.to_string())]),
            "Failed to fetch error trend",
            |s| &mut s.error_trend,
            |page: TrendPage| page.trend,
        )
        .await
    }

    pub async fn fetch_recent(&self, limit: u32) -> Outcome {
        self.fetch_feed(
            with_query("/api/analytics/recent", &[("limit", limit.to_string())]),
            "Failed to fetch recent uploads",
            |s| &mut s.recent,
            |page: RecentPage| page.activity,
        )
        .await
    }

    /// Fetch every feed the plan allows, concurrently.
    ///
    /// Succeeds only when every attempted feed succeeded.
    pub async fn fetch_all(&self) -> Outcome {
        let advanced = self.has_advanced_analytics();
        let gated = async {
            if !advanced {
                return Vec::new();
            }
            let (frequency, trend) = tokio::join!(
                self.fetch_upload_frequency(DEFAULT_FREQUENCY_DAYS),
                self.fetch_error_trend(DEFAULT_TREND_HOURS),
            );
            vec![frequency, trend]
        };

        let (stats, top, recent, gated) = tokio::join!(
            self.fetch_stats(),
            self.fetch_top_errors(DEFAULT_TOP_ERRORS_LIMIT),
            self.fetch_recent(DEFAULT_RECENT_LIMIT),
            gated,
        );
        let mut outcomes = vec![stats, top, recent];
        outcomes.extend(gated);

        outcomes
            .into_iter()
            .find(|o| !o.success)
            .unwrap_or_else(Outcome::done)
    }

    /// First `fetch_all`; runs once per store
    pub async fn ensure_loaded(&self) -> bool {
        if !self.shared.with(|s| s.lifecycle.try_begin()) {
            return false;
        }
        let ok = self.fetch_all().await.success;
        self.shared.with(|s| s.lifecycle.finish(ok));
        ok
    }

    pub fn close(&self) {
        self.shared.scope.cancel();
    }
}
