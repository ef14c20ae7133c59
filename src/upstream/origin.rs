//! The fixed upstream origin all requests are forwarded to.

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

/// Errors raised while parsing the configured upstream URL.
#[derive(Debug, Error)]
pub enum OriginError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme '{0}', expected http or https")]
    UnsupportedScheme(String),

    #[error("URL '{0}' has no host")]
    MissingHost(String),

    #[error("host '{0}' cannot be used as a Host header")]
    InvalidHostHeader(String),
}

/// Scheme, host and port of the upstream server.
///
/// Parsed once at startup. Any path, query or fragment on the configured URL
/// is discarded: inbound paths are forwarded verbatim.
#[derive(Debug, Clone)]
pub struct UpstreamOrigin {
    base: Url,
    authority: String,
    host_header: HeaderValue,
}

impl UpstreamOrigin {
    /// Parse an upstream base URL such as `https://origin.example`.
    pub fn parse(raw: &str) -> Result<Self, OriginError> {
        let mut base = Url::parse(raw.trim()).map_err(|source| OriginError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(OriginError::UnsupportedScheme(base.scheme().to_string()));
        }

        let host = match base.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(OriginError::MissingHost(raw.to_string())),
        };

        if base.path() != "/" {
            tracing::warn!(
                upstream = %raw,
                path = %base.path(),
                "Upstream path prefix is ignored; inbound paths are forwarded verbatim"
            );
        }
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);
        // Credentials are never forwarded.
        let _ = base.set_username("");
        let _ = base.set_password(None);

        // `Url::port` is None when the port is the scheme default.
        let authority = match base.port() {
            Some(port) => format!("{host}:{port}"),
            None => host,
        };
        let host_header = HeaderValue::from_str(&authority)
            .map_err(|_| OriginError::InvalidHostHeader(authority.clone()))?;

        Ok(Self {
            base,
            authority,
            host_header,
        })
    }

    /// Origin as a URL with an empty (`/`) path.
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn scheme(&self) -> &str {
        self.base.scheme()
    }

    /// `host[:port]`, with the port omitted when it is the scheme default.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Value sent as the outbound `Host` header.
    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }

    /// Returns true if `url` lies in this origin's URL space.
    pub fn contains(&self, url: &Url) -> bool {
        url.scheme() == self.base.scheme()
            && url.host_str() == self.base.host_str()
            && url.port_or_known_default() == self.base.port_or_known_default()
    }
}

impl std::fmt::Display for UpstreamOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme(), self.authority)
    }
}
