//! Shared HTTP client construction for consistent timeout and TLS configuration.

use std::time::Duration;

/// Create a shared HTTP client with standard vecseed configuration.
///
/// Config: 10s connect timeout, 120s request timeout, rustls TLS,
/// `vecseed/{version}` user-agent, redirect limit 10.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized (should never happen with rustls).
#[must_use]
pub fn default_client() -> reqwest::Client {
    client_with_timeouts(Duration::from_secs(10), Duration::from_secs(120))
}

/// Same as [`default_client`] with caller-supplied timeouts.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized (should never happen with rustls).
#[must_use]
pub fn client_with_timeouts(connect: Duration, request: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(connect)
        .timeout(request)
        .user_agent(concat!("vecseed/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("default HTTP client construction must not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_successfully() {
        let _client = default_client();
    }

    #[test]
    fn client_with_custom_timeouts_builds() {
        let _client = client_with_timeouts(Duration::from_millis(500), Duration::from_secs(5));
    }
}
