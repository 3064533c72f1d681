//! `window.location` derived from the configured document URL.

use core_types::{EasyTestsError, EasyTestsResult};
use regex::Regex;
use serde::Serialize;

/// Scheme, optional authority, path, query and fragment
const URL_PATTERN: &str = r"^([A-Za-z][A-Za-z0-9+.-]*):(?://([^/?#]*))?([^?#]*)(\?[^#]*)?(#.*)?$";

/// Parsed document URL in the shape scripts see as `location`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Full URL
    pub href: String,
    /// Scheme with trailing colon, e.g. `https:`
    pub protocol: String,
    /// Host name plus port
    pub host: String,
    /// Host name only
    pub hostname: String,
    /// Port, empty when absent
    pub port: String,
    /// Path
    pub pathname: String,
    /// Query including `?`, or empty
    pub search: String,
    /// Fragment including `#`, or empty
    pub hash: String,
    /// Serialized origin, `null` without a host
    pub origin: String,
}

impl Location {
    /// Parse a URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use sandbox::Location;
    ///
    /// let location = Location::parse("https://Example.test:8443/app?q=1#top").unwrap();
    /// assert_eq!(location.hostname, "example.test");
    /// assert_eq!(location.port, "8443");
    /// assert_eq!(location.origin, "https://example.test:8443");
    /// assert_eq!(Location::parse("about:blank").unwrap().origin, "null");
    /// ```
    ///
    /// # Errors
    /// Returns [`EasyTestsError::Config`] for a URL without a scheme or with
    /// a non-numeric port.
    pub fn parse(url: &str) -> EasyTestsResult<Self> {
        let url = url.trim();
        let invalid = |reason: &str| EasyTestsError::Config {
            message: format!("invalid window url `{url}`: {reason}"),
        };
        let pattern = Regex::new(URL_PATTERN).map_err(|e| invalid(&e.to_string()))?;
        let parts = pattern.captures(url).ok_or_else(|| invalid("missing scheme"))?;
        let part = |index: usize| parts.get(index).map_or("", |m| m.as_str());

        let scheme = part(1).to_ascii_lowercase();
        let authority = part(2);
        let host = authority
            .rsplit_once('@')
            .map_or(authority, |(_, host)| host)
            .to_ascii_lowercase();
        let (hostname, port) = match host.rsplit_once(':') {
            Some((name, port)) if !port.is_empty() => {
                port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
                (name.to_string(), port.to_string())
            }
            _ => (host.clone(), String::new()),
        };

        let pathname = match part(3) {
            "" if parts.get(2).is_some() => "/".to_string(),
            path => path.to_string(),
        };
        let origin = if hostname.is_empty() {
            "null".to_string()
        } else {
            format!("{scheme}://{host}")
        };

        Ok(Self {
            href: url.to_string(),
            protocol: format!("{scheme}:"),
            host,
            hostname,
            port,
            pathname,
            search: part(4).to_string(),
            hash: part(5).to_string(),
            origin,
        })
    }
}
