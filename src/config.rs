//! Runtime Configuration
//!
//! All tunables come from environment variables, read once at startup.
//! Out-of-range values are clamped to the documented bounds rather than
//! rejected, so a misconfigured deployment still comes up.

use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://repository.staging.openeduhub.net/edu-sharing/rest";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub log_level: tracing::Level,
    pub wlo: WloConfig,
    pub detection: DetectionConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    /// Shared secret for the admin cache-clear route. Unset means the route
    /// is unusable (500).
    pub admin_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WloConfig {
    pub base_url: String,
    /// Per-call timeout for upstream requests.
    pub timeout: Duration,
    /// Retries after the first attempt, on network errors and 5xx.
    pub max_retries: usize,
}

#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Ceiling for client-supplied `max_candidates`.
    pub max_candidates: usize,
    pub default_threshold: f64,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub max_size: usize,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let timeout_secs = env_parse("WLO_TIMEOUT", 60u64).max(1);
        let cache_ttl = env_parse("DETECTION_CACHE_TTL", 3600u64).clamp(60, 86_400);
        let cache_max_size = env_parse("DETECTION_CACHE_MAX_SIZE", 1000usize).clamp(10, 10_000);

        let (max_requests, window) = std::env::var("RATE_LIMIT")
            .ok()
            .and_then(|value| parse_rate_limit(&value))
            .unwrap_or((100, Duration::from_secs(60)));

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            log_level: parse_log_level(
                &std::env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            ),
            wlo: WloConfig {
                base_url: std::env::var("WLO_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
                max_retries: env_parse("WLO_MAX_RETRIES", 3usize),
            },
            detection: DetectionConfig {
                max_candidates: env_parse("MAX_CANDIDATES", 40usize).max(1),
                default_threshold: 0.9,
            },
            cache: CacheConfig {
                ttl: Duration::from_secs(cache_ttl),
                max_size: cache_max_size,
            },
            rate_limit: RateLimitConfig {
                max_requests,
                window,
            },
            admin_api_key: std::env::var("ADMIN_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

/// Parses `<N>/<window>` rate limit specs, e.g. `100/minute` or `10/second`.
fn parse_rate_limit(value: &str) -> Option<(u32, Duration)> {
    let (count, window) = value.trim().split_once('/')?;
    let count: u32 = count.trim().parse().ok()?;
    if count == 0 {
        return None;
    }
    let window = match window.trim().to_lowercase().as_str() {
        "second" => Duration::from_secs(1),
        "minute" => Duration::from_secs(60),
        "hour" => Duration::from_secs(3600),
        _ => return None,
    };
    Some((count, window))
}

fn parse_log_level(value: &str) -> tracing::Level {
    match value.trim().to_uppercase().as_str() {
        "DEBUG" => tracing::Level::DEBUG,
        "WARNING" | "WARN" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate_limit_formats() {
        assert_eq!(
            parse_rate_limit("100/minute"),
            Some((100, Duration::from_secs(60)))
        );
        assert_eq!(
            parse_rate_limit("10/second"),
            Some((10, Duration::from_secs(1)))
        );
        assert_eq!(
            parse_rate_limit("5000/hour"),
            Some((5000, Duration::from_secs(3600)))
        );
    }

    #[test]
    fn test_parse_rate_limit_rejects_garbage() {
        assert_eq!(parse_rate_limit("minute"), None);
        assert_eq!(parse_rate_limit("0/minute"), None);
        assert_eq!(parse_rate_limit("100/fortnight"), None);
        assert_eq!(parse_rate_limit(""), None);
    }

    #[test]
    fn test_parse_log_level_mapping() {
        assert_eq!(parse_log_level("DEBUG"), tracing::Level::DEBUG);
        assert_eq!(parse_log_level("warning"), tracing::Level::WARN);
        assert_eq!(parse_log_level("ERROR"), tracing::Level::ERROR);
        // Unknown values fall back to INFO
        assert_eq!(parse_log_level("VERBOSE"), tracing::Level::INFO);
    }
}
