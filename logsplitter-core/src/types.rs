//! Domain types as served by the LogSplitter REST API
//!
//! These types are consumed, never authored, by this crate: uploads, log
//! groups, analytics aggregates, billing plans and delivery records are all
//! computed server-side. Field names follow the API's camelCase JSON.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Upload** | One submitted log file and its per-level line counts |
//! | **LogGroup** | A server-computed pattern grouping similar lines of one upload |
//! | **Fingerprint** | Identifier shared by all lines of one pattern |
//! | **Permissions** | Feature flags plus usage limits granted by the current plan |
//! | **One-shot secret** | A credential shown exactly once at creation/regeneration |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================
// Feature and limit slugs
// ============================================

/// Feature slugs (match backend permission config)
pub mod features {
    pub const UPLOAD_LOGS: &str = "upload-logs";
    pub const EXPORT_LOGS: &str = "export-logs";
    pub const API_ACCESS: &str = "api-access";
    pub const ADVANCED_ANALYTICS: &str = "advanced-analytics";
    pub const MAX_FILE_SIZE_MB: &str = "max-file-size-mb";
}

/// Usage limit slugs
pub mod limits {
    pub const MONTHLY_UPLOADS: &str = "monthly-uploads";
}

// ============================================
// Permissions
// ============================================

/// One named usage counter. `max == -1` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLimit {
    pub max: i64,
    pub used: i64,
    pub remaining: i64,
}

impl UsageLimit {
    pub fn is_unlimited(&self) -> bool {
        self.max == -1
    }
}

/// Snapshot of what the current plan entitles the user to do
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub features: HashMap<String, bool>,
    #[serde(default)]
    pub limits: HashMap<String, UsageLimit>,
    #[serde(default)]
    pub plan: Option<String>,
}

// ============================================
// Logs
// ============================================

/// Severity bucket assigned by the server's parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Unknown,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ERROR" => Ok(LogLevel::Error),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            "UNKNOWN" => Ok(LogLevel::Unknown),
            _ => Err(format!("unknown log level: {}", s)),
        }
    }
}

/// Line counts per level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct LevelCounts {
    #[serde(default)]
    pub error: u64,
    #[serde(default)]
    pub warn: u64,
    #[serde(default)]
    pub info: u64,
    #[serde(default)]
    pub debug: u64,
    #[serde(default)]
    pub unknown: u64,
}

impl LevelCounts {
    pub fn get(&self, level: LogLevel) -> u64 {
        match level {
            LogLevel::Error => self.error,
            LogLevel::Warn => self.warn,
            LogLevel::Info => self.info,
            LogLevel::Debug => self.debug,
            LogLevel::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> u64 {
        LogLevel::ALL.iter().map(|l| self.get(*l)).sum()
    }
}

/// Offset pagination block returned with every list page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

impl Pagination {
    /// Offset of the page after this one
    pub fn next_offset(&self) -> u32 {
        self.offset.saturating_add(self.limit)
    }
}

/// One uploaded log file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    pub id: String,
    #[serde(alias = "originalFilename")]
    pub filename: String,
    pub total_lines: u64,
    #[serde(default)]
    pub level_counts: LevelCounts,
    #[serde(default)]
    pub patterns_found: u64,
    pub created_at: DateTime<Utc>,
}

/// A server-computed pattern; child of exactly one upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogGroup {
    pub id: String,
    pub fingerprint: String,
    pub level: LogLevel,
    pub message_sample: String,
    pub count: u64,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Upload record as returned by the upload endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadData {
    pub id: String,
    pub original_filename: String,
    pub total_lines: u64,
    #[serde(default)]
    pub level_counts: LevelCounts,
    pub created_at: DateTime<Utc>,
}

/// Parse summary returned with a fresh upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub total_lines: u64,
    pub processed_lines: u64,
    pub unique_patterns: u64,
    #[serde(default)]
    pub by_level: LevelCounts,
}

/// Response of `POST /api/uploads`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub upload: UploadData,
    pub summary: UploadSummary,
    pub groups_count: u64,
}

// ============================================
// Search
// ============================================

/// Cross-upload projection of a log group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub fingerprint: String,
    pub level: LogLevel,
    pub message_sample: String,
    pub count: u64,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub upload_id: String,
    pub filename: String,
    #[serde(default)]
    pub rank: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSuggestion {
    pub message: String,
    pub level: LogLevel,
    pub count: u64,
}

/// Global search filters. Dates are passed through as the API expects them
/// (ISO 8601 strings).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub query: String,
    pub level: Option<LogLevel>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl SearchFilters {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// True when no scoping filter is set; such a search is never sent.
    pub fn is_unscoped(&self) -> bool {
        self.query.trim().is_empty() && self.level.is_none() && !self.has_date_range()
    }

    /// Date-filtered search is served by a separate endpoint
    pub fn has_date_range(&self) -> bool {
        self.start_date.as_deref().is_some_and(|d| !d.trim().is_empty())
    }
}

// ============================================
// Analytics
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStats {
    pub total_uploads: u64,
    pub total_lines: u64,
    pub total_errors: u64,
    pub total_warnings: u64,
    pub total_info: u64,
    pub total_debug: u64,
    pub total_patterns: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopError {
    pub id: String,
    pub fingerprint: String,
    pub level: String,
    pub message_sample: String,
    pub count: u64,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFrequencyItem {
    pub date: String,
    pub uploads: u64,
    pub lines: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorTrendItem {
    pub hour: String,
    pub errors: u64,
    pub warnings: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentUpload {
    pub id: String,
    pub filename: String,
    pub total_lines: u64,
    #[serde(default)]
    pub patterns_found: Option<u64>,
    #[serde(default)]
    pub level_counts: LevelCounts,
    pub created_at: DateTime<Utc>,
}

// ============================================
// Dashboard
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_uploads: u64,
    pub total_lines: u64,
    pub total_patterns: u64,
    pub error_rate: f64,
    pub avg_lines_per_upload: f64,
    #[serde(default)]
    pub level_counts: LevelCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTopError {
    pub id: String,
    pub message_sample: String,
    pub count: u64,
    pub filename: String,
    pub last_seen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadActivity {
    pub date: String,
    pub uploads: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub stats: DashboardStats,
    #[serde(default)]
    pub recent_uploads: Vec<RecentUpload>,
    #[serde(default)]
    pub top_errors: Vec<DashboardTopError>,
    #[serde(default)]
    pub upload_activity: Vec<UploadActivity>,
}

// ============================================
// API keys
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    pub prefix: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_revoked: bool,
}

/// Key metadata returned alongside a freshly minted secret
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeySummary {
    pub id: String,
    pub name: String,
    pub prefix: String,
    pub created_at: DateTime<Utc>,
}

impl From<ApiKeySummary> for ApiKey {
    fn from(key: ApiKeySummary) -> Self {
        ApiKey {
            id: key.id,
            name: key.name,
            prefix: key.prefix,
            created_at: key.created_at,
            last_used_at: None,
            is_revoked: false,
        }
    }
}

/// Response of key creation. `secret` is only ever seen here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedApiKey {
    pub key: ApiKeySummary,
    pub secret: String,
}

// ============================================
// Webhooks
// ============================================

/// Events a webhook can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEvent {
    #[serde(rename = "upload.completed")]
    UploadCompleted,
    #[serde(rename = "error.new")]
    ErrorNew,
    #[serde(rename = "error.repeated")]
    ErrorRepeated,
    #[serde(rename = "error.spike")]
    ErrorSpike,
    #[serde(rename = "export.ready")]
    ExportReady,
    #[serde(rename = "plan.limit_reached")]
    PlanLimitReached,
    /// An event kind this client does not know yet. Never sent.
    #[serde(other)]
    Unknown,
}

impl WebhookEvent {
    pub const ALL: [WebhookEvent; 6] = [
        WebhookEvent::UploadCompleted,
        WebhookEvent::ErrorNew,
        WebhookEvent::ErrorRepeated,
        WebhookEvent::ErrorSpike,
        WebhookEvent::ExportReady,
        WebhookEvent::PlanLimitReached,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::UploadCompleted => "upload.completed",
            WebhookEvent::ErrorNew => "error.new",
            WebhookEvent::ErrorRepeated => "error.repeated",
            WebhookEvent::ErrorSpike => "error.spike",
            WebhookEvent::ExportReady => "export.ready",
            WebhookEvent::PlanLimitReached => "plan.limit_reached",
            WebhookEvent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WebhookEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WebhookEvent::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("unknown webhook event: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: String,
    pub url: String,
    pub events: Vec<WebhookEvent>,
    pub is_active: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_spike_threshold: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Server-computed delivery counters. Unknown (zero) until the next refresh
/// for webhooks created locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookDeliveryStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub pending: u64,
}

impl WebhookDeliveryStats {
    /// Percentage of successful deliveries, if any were attempted
    pub fn success_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.successful as f64 / self.total as f64 * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookWithStats {
    #[serde(flatten)]
    pub webhook: Webhook,
    #[serde(default)]
    pub delivery_stats: WebhookDeliveryStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Success,
    Failed,
    Retrying,
    #[serde(other)]
    Unknown,
}

/// Immutable historical delivery record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDelivery {
    pub id: String,
    pub event_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub response_status: Option<u16>,
    #[serde(default)]
    pub response_body: Option<String>,
    pub attempt_count: u32,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebhookRequest {
    pub url: String,
    pub events: Vec<WebhookEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_spike_threshold: Option<u32>,
}

/// Partial update; only set fields are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWebhookRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<WebhookEvent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_spike_threshold: Option<u32>,
}

/// Response of webhook creation. `secret` is only ever seen here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedWebhook {
    pub webhook: Webhook,
    pub secret: String,
}

/// Result of a test delivery; the server decides which fields it reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestWebhookResult {
    #[serde(default)]
    pub delivery_id: Option<String>,
    #[serde(default)]
    pub status: Option<DeliveryStatus>,
    #[serde(default)]
    pub response_status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================
// Plans & billing
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    /// `-1` = unlimited
    pub monthly_uploads: i64,
    pub max_file_size_mb: u64,
}

/// Static catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub price_id: Option<String>,
    /// Cents, 0 for free
    pub price: u64,
    pub interval: BillingInterval,
    #[serde(default)]
    pub features: Vec<String>,
    pub limits: PlanLimits,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub redirect: Option<String>,
}

impl CheckoutSession {
    /// Where the user should be sent next: the direct redirect for free plans,
    /// the hosted checkout page for paid ones.
    pub fn destination(&self) -> Option<&str> {
        self.redirect.as_deref().or(self.url.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalSession {
    pub url: String,
}

// ============================================
// Profile
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub email_notifications: bool,
    pub dark_mode: bool,
    pub timezone: String,
}

/// Partial settings change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.email_notifications.is_none() && self.dark_mode.is_none() && self.timezone.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub settings: UserSettings,
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse_and_display() {
        assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!("Warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("fatal".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Debug.to_string(), "DEBUG");
        assert_eq!(serde_json::to_string(&LogLevel::Unknown).unwrap(), "\"UNKNOWN\"");
    }

    #[test]
    fn test_level_counts_uppercase_keys() {
        let counts: LevelCounts =
            serde_json::from_str(r#"{"ERROR":3,"WARN":2,"INFO":10,"DEBUG":0,"UNKNOWN":1}"#).unwrap();
        assert_eq!(counts.get(LogLevel::Error), 3);
        assert_eq!(counts.total(), 16);
    }

    #[test]
    fn test_upload_accepts_original_filename() {
        let upload: Upload = serde_json::from_str(
            r#"{"id":"u1","originalFilename":"app.log","totalLines":4,"createdAt":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(upload.filename, "app.log");
        assert_eq!(upload.patterns_found, 0);
    }

    #[test]
    fn test_search_filters_scoping() {
        assert!(SearchFilters::default().is_unscoped());
        assert!(SearchFilters::query("   ").is_unscoped());
        assert!(!SearchFilters::query("timeout").is_unscoped());

        let by_level = SearchFilters {
            level: Some(LogLevel::Error),
            ..Default::default()
        };
        assert!(!by_level.is_unscoped());
        assert!(!by_level.has_date_range());

        let by_date = SearchFilters {
            start_date: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        assert!(!by_date.is_unscoped());
        assert!(by_date.has_date_range());

        let blank_date = SearchFilters {
            start_date: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank_date.is_unscoped());
        assert!(!blank_date.has_date_range());
    }

    #[test]
    fn test_webhook_event_names() {
        assert_eq!(
            serde_json::to_string(&WebhookEvent::PlanLimitReached).unwrap(),
            "\"plan.limit_reached\""
        );
        assert_eq!("error.spike".parse::<WebhookEvent>().unwrap(), WebhookEvent::ErrorSpike);
        assert!("error.storm".parse::<WebhookEvent>().is_err());

        let events: Vec<WebhookEvent> = serde_json::from_str(r#"["error.new","digest.weekly"]"#).unwrap();
        assert_eq!(events, vec![WebhookEvent::ErrorNew, WebhookEvent::Unknown]);
        let status: DeliveryStatus = serde_json::from_str(r#""throttled""#).unwrap();
        assert_eq!(status, DeliveryStatus::Unknown);
    }

    #[test]
    fn test_update_request_sends_only_set_fields() {
        let update = UpdateWebhookRequest {
            is_active: Some(false),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"isActive":false}"#);
    }

    #[test]
    fn test_checkout_destination_prefers_redirect() {
        let free = CheckoutSession {
            redirect: Some("/dashboard".to_string()),
            url: Some("https://checkout.example".to_string()),
            ..Default::default()
        };
        assert_eq!(free.destination(), Some("/dashboard"));

        let paid = CheckoutSession {
            url: Some("https://checkout.example".to_string()),
            ..Default::default()
        };
        assert_eq!(paid.destination(), Some("https://checkout.example"));
    }

    #[test]
    fn test_delivery_success_rate() {
        assert_eq!(WebhookDeliveryStats::default().success_rate(), None);
        let stats = WebhookDeliveryStats {
            total: 4,
            successful: 3,
            failed: 1,
            pending: 0,
        };
        assert_eq!(stats.success_rate(), Some(75.0));
    }
}
