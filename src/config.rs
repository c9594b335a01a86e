use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use anyhow::{Context, Result};

use crate::services::grid_response::PageCountPolicy;

/// Longest browser session accepted from `SESSION_DURATION_DAYS`.
pub const MAX_SESSION_DURATION_DAYS: i64 = 365;
/// Longest upstream timeout accepted from `REQUEST_TIMEOUT_SECS`.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// The page count divisor the upstream pagination math has always used.
pub const DEFAULT_PAGE_COUNT_DIVISOR: u64 = 100;

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the upstream REST API.
    pub api_base_url: String,
    /// Address the dashboard server binds to.
    pub bind_addr: SocketAddr,
    /// Timeout applied to every upstream request.
    pub request_timeout: Duration,
    /// The duration of a browser session in days.
    pub session_duration_days: i64,
    /// The URL of the Redis server. Tokens stay in memory when unset.
    pub redis_url: Option<String>,
    /// How `totalPages` is computed when the backend omits `last_page`.
    pub page_count_policy: PageCountPolicy,
    /// Directory served for everything outside the API.
    pub public_dir: String,
    /// Whether cookies are marked `Secure`.
    pub secure_cookies: bool,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            request_timeout: Duration::from_secs(10),
            session_duration_days: 7,
            redis_url: None,
            page_count_policy: PageCountPolicy::FixedDivisor(DEFAULT_PAGE_COUNT_DIVISOR),
            public_dir: "files/public".to_string(),
            secure_cookies: false,
            cors_origins: default_cors_origins(),
        }
    }
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let api_base_url = env::var("API_BASE_URL")
            .unwrap_or(defaults.api_base_url)
            .trim_end_matches('/')
            .to_string();

        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            anyhow::bail!("API_BASE_URL must start with http:// or https://");
        }

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(addr) => addr.parse().context("Invalid BIND_ADDR")?,
            Err(_) => defaults.bind_addr,
        };

        let request_timeout = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(value) => parse_request_timeout(&value)?,
            Err(_) => defaults.request_timeout,
        };

        let session_duration_days = match env::var("SESSION_DURATION_DAYS") {
            Ok(value) => parse_session_duration_days(&value)?,
            Err(_) => defaults.session_duration_days,
        };

        let page_count_policy = match env::var("GRID_PAGE_COUNT_DIVISOR") {
            Ok(value) => parse_page_count_policy(&value)?,
            Err(_) => defaults.page_count_policy,
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        Ok(Self {
            api_base_url,
            bind_addr,
            request_timeout,
            session_duration_days,
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            page_count_policy,
            public_dir: env::var("PUBLIC_DIR").unwrap_or(defaults.public_dir),
            secure_cookies: env::var("APP_ENV")
                .unwrap_or_else(|_| "development".to_string())
                == "production",
            cors_origins,
        })
    }
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://[::1]:3000".to_string(),
    ]
}

fn parse_request_timeout(value: &str) -> Result<Duration> {
    let secs: u64 = value
        .trim()
        .parse()
        .context("Invalid REQUEST_TIMEOUT_SECS")?;
    if secs == 0 || secs > MAX_REQUEST_TIMEOUT_SECS {
        anyhow::bail!(
            "REQUEST_TIMEOUT_SECS must be between 1 and {}",
            MAX_REQUEST_TIMEOUT_SECS
        );
    }

    Ok(Duration::from_secs(secs))
}

fn parse_session_duration_days(value: &str) -> Result<i64> {
    let days: i64 = value
        .trim()
        .parse()
        .context("Invalid SESSION_DURATION_DAYS")?;
    if !(1..=MAX_SESSION_DURATION_DAYS).contains(&days) {
        anyhow::bail!(
            "SESSION_DURATION_DAYS must be between 1 and {}",
            MAX_SESSION_DURATION_DAYS
        );
    }

    Ok(days)
}

/// Parses `GRID_PAGE_COUNT_DIVISOR`: a positive number, or `page-size` to
/// divide by the page size the widget asked for.
fn parse_page_count_policy(value: &str) -> Result<PageCountPolicy> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("page-size") {
        return Ok(PageCountPolicy::RequestedPageSize);
    }

    let divisor: u64 = value
        .parse()
        .context("GRID_PAGE_COUNT_DIVISOR must be a number or `page-size`")?;
    if divisor == 0 {
        anyhow::bail!("GRID_PAGE_COUNT_DIVISOR must be greater than zero");
    }

    Ok(PageCountPolicy::FixedDivisor(divisor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_policy_accepts_numbers_and_page_size() {
        assert_eq!(
            parse_page_count_policy("250").unwrap(),
            PageCountPolicy::FixedDivisor(250)
        );
        assert_eq!(
            parse_page_count_policy("Page-Size").unwrap(),
            PageCountPolicy::RequestedPageSize
        );
    }

    #[test]
    fn page_count_policy_rejects_zero_and_garbage() {
        assert!(parse_page_count_policy("0").is_err());
        assert!(parse_page_count_policy("lots").is_err());
    }

    #[test]
    fn session_duration_is_bounded() {
        assert_eq!(parse_session_duration_days("30").unwrap(), 30);
        assert!(parse_session_duration_days("0").is_err());
        assert!(parse_session_duration_days("-3").is_err());
        assert!(parse_session_duration_days("9223372036854775807").is_err());
        assert!(parse_session_duration_days("week").is_err());
    }

    #[test]
    fn request_timeout_is_bounded() {
        assert_eq!(parse_request_timeout("5").unwrap(), Duration::from_secs(5));
        assert!(parse_request_timeout("0").is_err());
        assert!(parse_request_timeout("100000").is_err());
    }

    #[test]
    fn default_keeps_hundred_row_divisor() {
        let config = Config::default();
        assert_eq!(
            config.page_count_policy,
            PageCountPolicy::FixedDivisor(DEFAULT_PAGE_COUNT_DIVISOR)
        );
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }
}
