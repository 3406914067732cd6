//! Diagnostic log for the LogSplitter client
//!
//! Everything goes to a daily-rotated file under the XDG state directory
//! (`~/.local/state/logsplitter/`); nothing is printed to the terminal, which
//! belongs to the CLI's own output.
//!
//! Events carry structured fields (`method`, `url`, `status`, resource ids)
//! rather than formatted messages. Bearer tokens and one-shot secrets are
//! never recorded: the API layer logs only that token acquisition failed, and
//! user-supplied webhook URLs go through [`redact_url`] because hook
//! endpoints commonly embed credentials in their path or query.
//!
//! HTTP stack internals stay at `warn` unless `RUST_LOG` asks for them.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_FILE_PREFIX: &str = "logsplitter.log";

/// Crates whose debug output drowns out the client's own events
const QUIET_TARGETS: [&str; 4] = ["hyper", "hyper_util", "reqwest", "rustls"];

/// Filter directives for `level`, with the HTTP stack held at `warn`
pub fn filter_directives(level: &str) -> String {
    let mut directives = vec![level.trim().to_string()];
    directives.extend(QUIET_TARGETS.iter().map(|target| format!("{}=warn", target)));
    directives.join(",")
}

/// Scheme and host of `url`, for logging endpoints that may embed secrets
pub fn redact_url(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => format!("{}://{}/…", parsed.scheme(), host),
            None => "<redacted>".to_string(),
        },
        Err(_) => "<redacted>".to_string(),
    }
}

/// Install the file subscriber.
///
/// `RUST_LOG` replaces the configured level entirely. Keep the returned
/// guard alive for the life of the process or buffered events are lost.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_dir = Config::state_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(config.max_files.max(1))
        .build(&log_dir)
        .map_err(|e| Error::Config(format!("failed to create log appender: {}", e)))?;
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directives(&config.level)))
        .map_err(|e| Error::Config(format!("invalid log level {:?}: {}", config.level, e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install subscriber: {}", e)))?;

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %config.level,
        max_files = config.max_files,
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Route events to the test harness output. Safe to call from every test.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Flushes pending events to the log file when dropped
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

pub fn log_file_path() -> PathBuf {
    Config::log_path()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path() {
        assert!(log_file_path().ends_with(LOG_FILE_PREFIX));
    }

    #[test]
    fn test_filter_quiets_http_stack() {
        let directives = filter_directives(" debug ");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("reqwest=warn"));
        assert!(directives.contains("hyper=warn"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }

    #[test]
    fn test_redact_url_keeps_only_host() {
        assert_eq!(
            redact_url("https://hooks.slack.com/services/T000/B000/XXXXSECRET"),
            "https://hooks.slack.com/…"
        );
        assert_eq!(
            redact_url("https://example.com/hook?token=abc"),
            "https://example.com/…"
        );
        assert_eq!(redact_url("not a url"), "<redacted>");
    }
}
