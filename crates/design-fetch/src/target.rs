//! Normalization of user-supplied site addresses.

use crate::error::{DesignError, Result};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::sync::OnceLock;
use url::Url;

/// Leading `scheme:` as defined by RFC 3986.
fn scheme_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):(.?)").expect("scheme regex is valid")
    })
}

/// Whether `input` starts with an explicit scheme. `host:port` does not count.
fn has_explicit_scheme(input: &str) -> bool {
    scheme_pattern()
        .captures(input)
        .and_then(|caps| caps.get(2))
        .is_some_and(|next| !next.as_str().starts_with(|c: char| c.is_ascii_digit()))
}

/// An `https` origin ready for extraction, always ending in `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    /// Normalize `raw` to the origin that will be extracted.
    ///
    /// A missing scheme defaults to `https`, `http` is upgraded, and any other
    /// scheme is rejected. Path, query, fragment and credentials are dropped.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DesignError::InvalidInput("empty url".to_string()));
        }

        let candidate = if has_explicit_scheme(trimmed) {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let mut url = Url::parse(&candidate)
            .map_err(|e| DesignError::InvalidInput(format!("{trimmed}: {e}")))?;

        match url.scheme() {
            "https" => {}
            "http" => {
                url.set_scheme("https").map_err(|_| {
                    DesignError::InvalidInput(format!("{trimmed}: cannot upgrade to https"))
                })?;
            }
            other => return Err(DesignError::UnsupportedProtocol(other.to_string())),
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(DesignError::InvalidInput(format!("{trimmed}: missing host")));
        }

        Ok(Self(format!("{}/", url.origin().ascii_serialization())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for NormalizedUrl {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for NormalizedUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> String {
        NormalizedUrl::parse(raw).unwrap().into_string()
    }

    #[test]
    fn test_bare_host_gets_https() {
        assert_eq!(normalize("example.com"), "https://example.com/");
        assert_eq!(normalize("  example.com  "), "https://example.com/");
    }

    #[test]
    fn test_http_upgraded_and_path_stripped() {
        assert_eq!(
            normalize("http://example.com/path?x=1#y"),
            "https://example.com/"
        );
        assert_eq!(normalize("https://Example.COM/a/b"), "https://example.com/");
    }

    #[test]
    fn test_credentials_dropped_port_kept() {
        assert_eq!(
            normalize("https://user:pw@example.com:8443/x"),
            "https://example.com:8443/"
        );
        assert_eq!(normalize("http://example.com:80/"), "https://example.com/");
        assert_eq!(normalize("localhost:3000"), "https://localhost:3000/");
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert!(matches!(
            NormalizedUrl::parse("ftp://example.com"),
            Err(DesignError::UnsupportedProtocol(s)) if s == "ftp"
        ));
        assert!(matches!(
            NormalizedUrl::parse("file:///etc/passwd"),
            Err(DesignError::UnsupportedProtocol(_))
        ));
    }

    #[test]
    fn test_schemes_without_slashes_rejected() {
        for input in [
            "mailto:ceo@example.com",
            "data:text/html,hi",
            "javascript:alert(1)",
            "about:blank",
        ] {
            assert!(
                matches!(
                    NormalizedUrl::parse(input),
                    Err(DesignError::UnsupportedProtocol(_))
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_host_with_port_is_not_a_scheme() {
        assert_eq!(normalize("example.com:8080"), "https://example.com:8080/");
        assert_eq!(normalize("example.com:8080/docs"), "https://example.com:8080/");
        assert_eq!(normalize("http:example.com"), "https://example.com/");
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            NormalizedUrl::parse(""),
            Err(DesignError::InvalidInput(_))
        ));
        assert!(matches!(
            NormalizedUrl::parse("   "),
            Err(DesignError::InvalidInput(_))
        ));
        assert!(matches!(
            NormalizedUrl::parse("https://"),
            Err(DesignError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_from_str_and_display() {
        let url: NormalizedUrl = "http://acme.test".parse().unwrap();
        assert_eq!(url.to_string(), "https://acme.test/");
        assert_eq!(url.as_str(), "https://acme.test/");
    }
}
