//! Syntactic validation of absolute referer URLs.

use url::Url;

/// An absolute URL that has both a scheme and a non-empty host.
///
/// Only values of this type can be reduced to an origin, so holding one is
/// proof the referer passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefererUrl(Url);

impl RefererUrl {
    /// Parses an untrusted header value. Never panics; malformed input is `None`.
    ///
    /// Beyond what `url::Url` accepts, this rejects:
    /// - whitespace or control characters anywhere (the parser would trim them)
    /// - a scheme not followed by `://` (e.g. `http:example.com`)
    /// - URLs without a host (`mailto:`, `file:///`, `data:`)
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return None;
        }

        let parsed = Url::parse(raw).ok()?;

        let authority_start = parsed.scheme().len() + 3;
        let prefix = raw.get(..authority_start)?;
        if !prefix.eq_ignore_ascii_case(&format!("{}://", parsed.scheme())) {
            return None;
        }

        match parsed.host_str() {
            Some(host) if !host.is_empty() => Some(Self(parsed)),
            _ => None,
        }
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    pub fn host(&self) -> &str {
        // Checked non-empty in `parse`.
        self.0.host_str().unwrap_or_default()
    }

    /// `scheme://host`, without credentials, port, path, query or fragment.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme(), self.host())
    }
}

/// Returns true if `raw` is a well-formed absolute URL with scheme and host.
pub fn validate(raw: &str) -> bool {
    RefererUrl::parse(raw).is_some()
}
