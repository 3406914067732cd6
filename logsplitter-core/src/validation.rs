//! Client-side input validation
//!
//! Every check here runs before a request is built. A failure is reported as
//! [`Error::Validation`] naming the offending field.

use crate::error::{Error, Result};
use crate::types::{CreateWebhookRequest, Permissions, UpdateWebhookRequest, WebhookEvent};

/// Accepted log file extensions (matched case-insensitively)
pub const ALLOWED_EXTENSIONS: [&str; 2] = [".log", ".txt"];

/// Max upload size when the plan grants `max-file-size-mb`
pub const LARGE_FILE_LIMIT_MB: u64 = 50;
/// Max upload size otherwise
pub const DEFAULT_FILE_LIMIT_MB: u64 = 5;

pub const MIN_SPIKE_THRESHOLD: u32 = 1;
pub const MAX_SPIKE_THRESHOLD: u32 = 10_000;
/// Threshold used when `error.spike` is selected without an explicit value
pub const DEFAULT_SPIKE_THRESHOLD: u32 = 10;

/// Upload size ceiling in MB for the given permissions snapshot
pub fn max_file_size_mb(permissions: Option<&Permissions>) -> u64 {
    let granted = permissions
        .and_then(|p| p.features.get(crate::types::features::MAX_FILE_SIZE_MB))
        .copied()
        .unwrap_or(false);
    if granted {
        LARGE_FILE_LIMIT_MB
    } else {
        DEFAULT_FILE_LIMIT_MB
    }
}

/// Check a log file's name and size
pub fn validate_log_file(filename: &str, size_bytes: u64, max_size_mb: u64) -> Result<()> {
    let lower = filename.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return Err(Error::validation(
            "file",
            "Only .log and .txt files are allowed",
        ));
    }
    if size_bytes > max_size_mb * 1024 * 1024 {
        return Err(Error::validation(
            "file",
            format!("File size must be less than {} MB", max_size_mb),
        ));
    }
    Ok(())
}

/// Trimmed, non-empty API key name
pub fn validate_key_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(
            "name",
            "Please enter a name for the API key",
        ));
    }
    Ok(trimmed.to_string())
}

/// Webhook targets must be absolute HTTPS URLs
pub fn validate_webhook_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("url", "URL is required"));
    }
    match reqwest::Url::parse(trimmed) {
        Ok(parsed) if parsed.scheme() == "https" => Ok(trimmed.to_string()),
        _ => Err(Error::validation("url", "URL must be a valid HTTPS URL")),
    }
}

fn validate_events(events: &[WebhookEvent]) -> Result<()> {
    if events.is_empty() {
        return Err(Error::validation("events", "Select at least one event"));
    }
    if events.contains(&WebhookEvent::Unknown) {
        return Err(Error::validation("events", "Unknown webhook event"));
    }
    Ok(())
}

fn validate_threshold(threshold: u32) -> Result<()> {
    if !(MIN_SPIKE_THRESHOLD..=MAX_SPIKE_THRESHOLD).contains(&threshold) {
        return Err(Error::validation(
            "errorSpikeThreshold",
            format!(
                "Error spike threshold must be between {} and {}",
                MIN_SPIKE_THRESHOLD, MAX_SPIKE_THRESHOLD
            ),
        ));
    }
    Ok(())
}

/// Validate and normalize a creation request.
///
/// The URL and description are trimmed, an empty description is dropped, and
/// the spike threshold is only sent when `error.spike` is subscribed.
pub fn normalize_create_webhook(mut req: CreateWebhookRequest) -> Result<CreateWebhookRequest> {
    req.url = validate_webhook_url(&req.url)?;
    validate_events(&req.events)?;

    if req.events.contains(&WebhookEvent::ErrorSpike) {
        let threshold = req.error_spike_threshold.unwrap_or(DEFAULT_SPIKE_THRESHOLD);
        validate_threshold(threshold)?;
        req.error_spike_threshold = Some(threshold);
    } else {
        req.error_spike_threshold = None;
    }

    req.description = req
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    Ok(req)
}

/// Validate the fields present in a partial update
pub fn normalize_update_webhook(mut req: UpdateWebhookRequest) -> Result<UpdateWebhookRequest> {
    if let Some(url) = req.url.as_deref() {
        req.url = Some(validate_webhook_url(url)?);
    }
    if let Some(events) = req.events.as_deref() {
        validate_events(events)?;
    }
    if let Some(threshold) = req.error_spike_threshold {
        validate_threshold(threshold)?;
    }
    if let Some(description) = req.description.as_mut() {
        *description = description.trim().to_string();
    }
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn create(events: Vec<WebhookEvent>, threshold: Option<u32>) -> CreateWebhookRequest {
        CreateWebhookRequest {
            url: " https://hooks.example.com/ls ".to_string(),
            events,
            description: Some("  ".to_string()),
            is_active: true,
            error_spike_threshold: threshold,
        }
    }

    #[test]
    fn test_rejects_unsupported_extension() {
        let err = validate_log_file("trace.csv", 10, 5).unwrap_err();
        assert_eq!(err.field(), Some("file"));
        assert_eq!(err.to_string(), "Only .log and .txt files are allowed");
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert!(validate_log_file("APP.LOG", 10, 5).is_ok());
        assert!(validate_log_file("notes.Txt", 10, 5).is_ok());
    }

    #[test]
    fn test_rejects_oversized_file() {
        let err = validate_log_file("big.log", 6 * 1024 * 1024, 5).unwrap_err();
        assert_eq!(err.to_string(), "File size must be less than 5 MB");
        assert!(validate_log_file("big.log", 5 * 1024 * 1024, 5).is_ok());
    }

    #[test]
    fn test_max_file_size_follows_feature() {
        assert_eq!(max_file_size_mb(None), DEFAULT_FILE_LIMIT_MB);
        let perms = Permissions {
            features: HashMap::from([("max-file-size-mb".to_string(), true)]),
            ..Default::default()
        };
        assert_eq!(max_file_size_mb(Some(&perms)), LARGE_FILE_LIMIT_MB);
    }

    #[test]
    fn test_key_name_trimmed() {
        assert_eq!(validate_key_name("  ci  ").unwrap(), "ci");
        assert_eq!(validate_key_name("   ").unwrap_err().field(), Some("name"));
    }

    #[test]
    fn test_webhook_url_must_be_https() {
        assert!(validate_webhook_url("https://example.com/hook").is_ok());
        assert_eq!(
            validate_webhook_url("http://example.com/hook").unwrap_err().to_string(),
            "URL must be a valid HTTPS URL"
        );
        assert_eq!(validate_webhook_url("").unwrap_err().to_string(), "URL is required");
        assert!(validate_webhook_url("example.com").is_err());
    }

    #[test]
    fn test_spike_threshold_bounds() {
        for bad in [0, 10_001] {
            let err = normalize_create_webhook(create(vec![WebhookEvent::ErrorSpike], Some(bad)))
                .unwrap_err();
            assert_eq!(err.field(), Some("errorSpikeThreshold"));
        }
        let ok = normalize_create_webhook(create(vec![WebhookEvent::ErrorSpike], Some(10_000))).unwrap();
        assert_eq!(ok.error_spike_threshold, Some(10_000));
    }

    #[test]
    fn test_threshold_dropped_without_spike_event() {
        let req = normalize_create_webhook(create(vec![WebhookEvent::ErrorNew], Some(0))).unwrap();
        assert_eq!(req.error_spike_threshold, None);
        assert_eq!(req.url, "https://hooks.example.com/ls");
        assert_eq!(req.description, None);
    }

    #[test]
    fn test_requires_an_event() {
        let err = normalize_create_webhook(create(vec![], None)).unwrap_err();
        assert_eq!(err.field(), Some("events"));

        let err = normalize_create_webhook(create(vec![WebhookEvent::Unknown], None)).unwrap_err();
        assert_eq!(err.field(), Some("events"));
    }

    #[test]
    fn test_partial_update_validates_present_fields() {
        let toggle = UpdateWebhookRequest {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(normalize_update_webhook(toggle).is_ok());

        let bad_url = UpdateWebhookRequest {
            url: Some("ftp://example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(normalize_update_webhook(bad_url).unwrap_err().field(), Some("url"));
    }
}
