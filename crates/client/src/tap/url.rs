//! Request URL resolution and endpoint matching for the tap.

use url::Url;

use postmirror_core::config::AppConfig;

/// Error type for request URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a request URL as the page would.
///
/// Absolute URLs are parsed as-is; anything else is joined onto `page_origin`.
/// Only http(s) targets are accepted. Hosts come back lowercased.
pub fn resolve(input: &str, page_origin: &Url) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            page_origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

/// The (host, path, method) triple the tap cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub path: String,
    pub method: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, path: impl Into<String>, method: impl Into<String>) -> Self {
        Self { host: host.into().to_ascii_lowercase(), path: path.into(), method: method.into().to_ascii_uppercase() }
    }

    /// Exact match on host (with port, if any), path and method.
    pub fn matches(&self, url: &Url, method: &str) -> bool {
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return false,
        };

        host == self.host && url.path() == self.path && method.eq_ignore_ascii_case(&self.method)
    }
}

impl From<&AppConfig> for Endpoint {
    fn from(config: &AppConfig) -> Self {
        Self::new(&config.tap_host, &config.tap_path, &config.tap_method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://velog.io").unwrap()
    }

    #[test]
    fn test_resolve_absolute() {
        let url = resolve("https://V3.Velog.io/graphql", &origin()).unwrap();
        assert_eq!(url.host_str(), Some("v3.velog.io"));
        assert_eq!(url.path(), "/graphql");
    }

    #[test]
    fn test_resolve_relative_against_origin() {
        let url = resolve("/graphql?x=1", &origin()).unwrap();
        assert_eq!(url.host_str(), Some("velog.io"));
        assert_eq!(url.path(), "/graphql");
        assert_eq!(url.query(), Some("x=1"));
    }

    #[test]
    fn test_resolve_trims_whitespace() {
        let url = resolve("  https://v3.velog.io/graphql  ", &origin()).unwrap();
        assert_eq!(url.as_str(), "https://v3.velog.io/graphql");
    }

    #[test]
    fn test_resolve_rejects_other_schemes() {
        let result = resolve("data:text/plain,hi", &origin());
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve("   ", &origin()), Err(UrlError::Empty)));
    }

    #[test]
    fn test_endpoint_match() {
        let endpoint = Endpoint::new("v3.velog.io", "/graphql", "POST");
        let url = Url::parse("https://v3.velog.io/graphql").unwrap();

        assert!(endpoint.matches(&url, "POST"));
        assert!(endpoint.matches(&url, "post"));
        assert!(!endpoint.matches(&url, "GET"));
        assert!(!endpoint.matches(&Url::parse("https://v2.velog.io/graphql").unwrap(), "POST"));
        assert!(!endpoint.matches(&Url::parse("https://v3.velog.io/graphql/").unwrap(), "POST"));
    }

    #[test]
    fn test_endpoint_host_with_port() {
        let endpoint = Endpoint::new("localhost:4000", "/graphql", "POST");
        let url = Url::parse("http://localhost:4000/graphql").unwrap();
        assert!(endpoint.matches(&url, "POST"));
    }

    #[test]
    fn test_endpoint_from_config() {
        let endpoint = Endpoint::from(&AppConfig::default());
        assert_eq!(endpoint, Endpoint::new("v3.velog.io", "/graphql", "POST"));
    }
}
