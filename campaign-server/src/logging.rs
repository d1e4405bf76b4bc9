//! Tracing filter setup.

use campaign_core::config::ServiceConfig;
use tracing_subscriber::EnvFilter;

/// Filter directives: `RUST_LOG` when set, otherwise `service.log_level`.
pub fn filter_directives(rust_log: Option<&str>, service: &ServiceConfig) -> String {
    rust_log
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| service.log_level.trim())
        .to_string()
}

pub fn env_filter(service: &ServiceConfig) -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = filter_directives(rust_log.as_deref(), service);
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{}': {}; using info", directives, e);
        EnvFilter::new("info")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(level: &str) -> ServiceConfig {
        ServiceConfig {
            log_level: level.to_string(),
        }
    }

    #[test]
    fn test_config_level_used_without_rust_log() {
        assert_eq!(filter_directives(None, &service("debug")), "debug");
        assert_eq!(filter_directives(Some("  "), &service("warn")), "warn");
    }

    #[test]
    fn test_rust_log_wins() {
        assert_eq!(
            filter_directives(Some("campaign_server=trace"), &service("debug")),
            "campaign_server=trace"
        );
    }

    #[test]
    fn test_filter_builds_from_config_level() {
        let filter = EnvFilter::try_new(filter_directives(None, &service("debug"))).unwrap();
        assert!(filter.to_string().contains("debug"));
    }
}
