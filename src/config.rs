//! Client configuration: base URL and optional request timeout.

use std::time::Duration;

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "https://movie-api-21197.herokuapp.com/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Always ends with exactly one `/`.
    base_url: String,
    /// `None` leaves requests without a deadline.
    timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            timeout: None,
        }
    }

    /// Replace the base URL, keeping the timeout.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve configuration from the environment.
    ///
    /// Base URL: `MOVIE_API_URL` > `API_URL` > [`DEFAULT_API_URL`].
    /// Timeout: `MOVIE_API_TIMEOUT_SECS`, ignored when unset, zero or not a number.
    pub fn from_env() -> Self {
        let base_url = std::env::var("MOVIE_API_URL")
            .or_else(|_| std::env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let timeout = std::env::var("MOVIE_API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| parse_timeout(&raw));

        Self {
            base_url: normalize_base_url(&base_url),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// Seconds as a timeout. Zero would fail every request, so it is rejected
/// along with anything that is not a number.
fn parse_timeout(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => {
            log::warn!("Ignoring invalid MOVIE_API_TIMEOUT_SECS: {}", raw);
            None
        }
        Ok(secs) => Some(Duration::from_secs(secs)),
    }
}

fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim().trim_end_matches('/'))
}
