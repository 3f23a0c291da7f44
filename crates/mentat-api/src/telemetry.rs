//! Tracing subscriber setup.
//!
//! Environment variables:
//!   LOG_FORMAT  - "json" or "text" (default: "text")
//!   LOG_FILE    - path to log file (optional, enables daily-rotated file logging)
//!   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
//!   RUST_LOG    - standard env filter (default: [`DEFAULT_FILTER`])

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str = "mentat_api=debug,mentat_core=info,mentat_db=info,tower_http=info";

/// Output settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub json: bool,
    pub file: Option<String>,
    pub ansi: Option<bool>,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("LOG_FORMAT").ok(),
            std::env::var("LOG_FILE").ok(),
            std::env::var("LOG_ANSI").ok(),
        )
    }

    fn from_vars(format: Option<String>, file: Option<String>, ansi: Option<String>) -> Self {
        Self {
            json: format.as_deref() == Some("json"),
            file: file.filter(|f| !f.is_empty()),
            ansi: ansi.map(|v| v == "true" || v == "1"),
        }
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
pub fn init_tracing(settings: &LogSettings) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = settings.file {
        let path = Path::new(path);
        let file_dir = path.parent().unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("mentat-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if settings.json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(settings.ansi.unwrap_or(false)); // no ANSI in files by default
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if settings.json {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = settings.ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_text_to_stdout() {
        let settings = LogSettings::from_vars(None, None, None);
        assert!(!settings.json);
        assert!(settings.file.is_none());
        assert!(settings.ansi.is_none());
    }

    #[test]
    fn test_json_file_no_ansi() {
        let settings = LogSettings::from_vars(
            Some("json".to_string()),
            Some("/var/log/mentat/api.log".to_string()),
            Some("0".to_string()),
        );
        assert!(settings.json);
        assert_eq!(settings.file.as_deref(), Some("/var/log/mentat/api.log"));
        assert_eq!(settings.ansi, Some(false));
    }

    #[test]
    fn test_default_filter_covers_every_crate() {
        for target in ["mentat_api", "mentat_core", "mentat_db", "tower_http"] {
            assert!(DEFAULT_FILTER.contains(target));
        }
    }
}
