//! Upstream HTTP client construction.

use std::time::Duration;

use reqwest::redirect::Policy;

use crate::config::schema::TimeoutConfig;

/// Build the pooled client used for every upstream call.
///
/// Redirects are never followed so 3xx responses reach the response
/// transformer intact. No decompression features are enabled, so bodies
/// and `Content-Encoding` pass through untouched. Environment proxy settings
/// are ignored: the upstream is always contacted directly.
pub fn build_client(timeouts: &TimeoutConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
        .referer(false)
        .no_proxy()
        .build()
}
