//! Composite `host + path` identifiers.
//!
//! Links are stored as a `(website.host, link.relative_reference)` pair but
//! exchanged with clients as one opaque string. [`Href::parse`] splits such a
//! string back into its two parts.

use std::fmt;

/// A parsed href.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Href {
    pub host: String,

    /// Path (plus query/fragment) starting with `/`, `?` or `#`.
    pub relative_reference: Option<String>,
}

impl Href {
    /// Parse an href. Accepts absolute (`https://host/path`), scheme-relative
    /// (`//host/path`), authority-only (`host`), bare (`host/path`) and
    /// query/fragment-only (`?q`, `#f`) forms. Never fails.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }

        let rest = if let Some((_, after_scheme)) = raw.split_once("://") {
            after_scheme
        } else if let Some(stripped) = raw.strip_prefix("//") {
            stripped
        } else if raw.starts_with('?') || raw.starts_with('#') {
            return Self {
                host: String::new(),
                relative_reference: Some(raw.to_string()),
            };
        } else {
            raw
        };

        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, Some(path)),
            None => (rest, None),
        };

        // Strip userinfo, then port.
        let authority = authority
            .rsplit_once('@')
            .map_or(authority, |(_, host)| host);
        let host = authority.split_once(':').map_or(authority, |(host, _)| host);

        Self {
            host: host.to_string(),
            relative_reference: path.map(|p| format!("/{p}")),
        }
    }

    /// Relative reference as stored in the link table, where an absent path
    /// is the empty string.
    pub fn stored_reference(&self) -> &str {
        self.relative_reference.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.host, self.stored_reference())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        let href = Href::parse("");
        assert_eq!(href.host, "");
        assert_eq!(href.relative_reference, None);
    }

    #[test]
    fn bare_host_and_path() {
        let href = Href::parse("example.com/a/b");
        assert_eq!(href.host, "example.com");
        assert_eq!(href.relative_reference.as_deref(), Some("/a/b"));
    }

    #[test]
    fn scheme_relative_authority_only() {
        let href = Href::parse("//example.com");
        assert_eq!(href.host, "example.com");
        assert_eq!(href.relative_reference, None);
    }

    #[test]
    fn userinfo_and_port_are_stripped() {
        let href = Href::parse("user@example.com:8080/p");
        assert_eq!(href.host, "example.com");
        assert_eq!(href.relative_reference.as_deref(), Some("/p"));
    }

    #[test]
    fn absolute_url() {
        let href = Href::parse("https://mangadex.org/title/1?lang=en");
        assert_eq!(href.host, "mangadex.org");
        assert_eq!(href.relative_reference.as_deref(), Some("/title/1?lang=en"));
    }

    #[test]
    fn trailing_slash_keeps_root_path() {
        let href = Href::parse("example.com/");
        assert_eq!(href.relative_reference.as_deref(), Some("/"));
    }

    #[test]
    fn query_and_fragment_only() {
        let query = Href::parse("?page=2");
        assert_eq!(query.host, "");
        assert_eq!(query.relative_reference.as_deref(), Some("?page=2"));

        let fragment = Href::parse("#top");
        assert_eq!(fragment.host, "");
        assert_eq!(fragment.relative_reference.as_deref(), Some("#top"));
    }

    #[test]
    fn display_round_trips_bare_form() {
        assert_eq!(Href::parse("example.com/a/b").to_string(), "example.com/a/b");
        assert_eq!(Href::parse("https://example.com").to_string(), "example.com");
    }

    #[test]
    fn stored_reference_defaults_to_empty() {
        assert_eq!(Href::parse("example.com").stored_reference(), "");
    }
}
