use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName};

use crate::{error::Error, result::Result};

/// Header carrying the number of calls left in the current window.
pub const RATE_LIMIT_REMAINING: &str = "x-rate-limit-remaining";
/// Header carrying the number of seconds until the window resets.
pub const RATE_LIMIT_RESET: &str = "x-rate-limit-reset";

/// The rate-limit state last reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    remaining: u64,
    reset: u64,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            remaining: 300,
            reset: 0,
        }
    }
}

pub(crate) fn parse_header(headers: &HeaderMap, name: &'static str) -> Result<Option<u64>> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .map(Some)
        .ok_or_else(|| Error::InvalidHeader(HeaderName::from_static(name)))
}

impl RateLimit {
    /// Creates a rate limit state from raw values.
    pub fn new(remaining: u64, reset: u64) -> Self {
        Self { remaining, reset }
    }

    /// Reads the rate-limit headers of a response.
    ///
    /// Returns `Ok(None)` if the response carries neither header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if a header is present but is not a
    /// non-negative integer.
    pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>> {
        let remaining = parse_header(headers, RATE_LIMIT_REMAINING)?;
        let reset = parse_header(headers, RATE_LIMIT_RESET)?;
        Ok(match (remaining, reset) {
            (None, None) => None,
            (remaining, reset) => {
                let fallback = Self::default();
                Some(Self {
                    remaining: remaining.unwrap_or(fallback.remaining),
                    reset: reset.unwrap_or(fallback.reset),
                })
            }
        })
    }

    /// Returns the number of calls left in the current window.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Returns the number of seconds until the window resets.
    pub fn reset(&self) -> u64 {
        self.reset
    }

    /// Returns how long to wait before the next request, if at all.
    ///
    /// The window is treated as exhausted when at most one call is left.
    pub fn wait_time(&self) -> Option<Duration> {
        (self.remaining <= 1).then(|| Duration::from_secs(self.reset + 1))
    }

    /// Sleeps until the window resets if it is exhausted.
    pub async fn throttle(&self) {
        if let Some(wait) = self.wait_time() {
            log::warn!(
                "rate limit reached ({} left), sleeping for {}s",
                self.remaining,
                wait.as_secs()
            );
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn reads_both_headers() {
        let map = headers(&[(RATE_LIMIT_REMAINING, "299"), (RATE_LIMIT_RESET, "42")]);
        let limit = RateLimit::from_headers(&map).unwrap().unwrap();
        assert_eq!(limit, RateLimit::new(299, 42));
        assert_eq!(limit.wait_time(), None);
    }

    #[test]
    fn absent_headers_are_not_an_error() {
        assert_eq!(RateLimit::from_headers(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn garbage_is_rejected() {
        let map = headers(&[(RATE_LIMIT_REMAINING, "lots")]);
        assert!(matches!(
            RateLimit::from_headers(&map),
            Err(Error::InvalidHeader(name)) if name == RATE_LIMIT_REMAINING
        ));
    }

    #[test]
    fn waits_for_reset_plus_one_when_exhausted() {
        assert_eq!(RateLimit::new(1, 5).wait_time(), Some(Duration::from_secs(6)));
        assert_eq!(RateLimit::new(0, 0).wait_time(), Some(Duration::from_secs(1)));
        assert_eq!(RateLimit::new(2, 5).wait_time(), None);
        assert_eq!(RateLimit::default().wait_time(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_sleeps_only_when_exhausted() {
        let start = tokio::time::Instant::now();
        RateLimit::new(10, 30).throttle().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        RateLimit::new(1, 2).throttle().await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
