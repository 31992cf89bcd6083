//! Generic URL syntax splitting, tolerant of anything.

/// Components of a URL. Missing parts are empty strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UrlParts<'a> {
    pub scheme: &'a str,
    /// Network location, credentials and port included.
    pub host: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    pub fragment: &'a str,
}

fn is_scheme_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
}

/// Splits `url` into scheme, host, path, query and fragment.
///
/// A scheme is recognised only when the text before the first `:` starts
/// with an ASCII letter and holds only scheme characters. The host is read
/// only after `//` and ends at the first `/`, `?` or `#`. Never fails:
/// `"not a url"` is all path.
pub fn split_url(url: &str) -> UrlParts<'_> {
    let mut parts = UrlParts::default();
    let mut rest = url;

    if let Some(colon) = rest.find(':') {
        let candidate = &rest[..colon];
        let starts_alpha = candidate
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic());
        if starts_alpha && candidate.chars().all(is_scheme_char) {
            parts.scheme = candidate;
            rest = &rest[colon + 1..];
        }
    }

    if let Some(after) = rest.strip_prefix("//") {
        let end = after
            .find(|c: char| matches!(c, '/' | '?' | '#'))
            .unwrap_or(after.len());
        parts.host = &after[..end];
        rest = &after[end..];
    }

    if let Some(hash) = rest.find('#') {
        parts.fragment = &rest[hash + 1..];
        rest = &rest[..hash];
    }
    if let Some(q) = rest.find('?') {
        parts.query = &rest[q + 1..];
        rest = &rest[..q];
    }
    parts.path = rest;
    parts
}

/// Trims the input and prefixes `https://` unless it already names an
/// http(s) scheme.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Host name with credentials, port and trailing dot removed, lowercased.
pub fn host_name(netloc: &str) -> String {
    let without_creds = netloc.rsplit_once('@').map_or(netloc, |(_, h)| h);
    let without_port = if let Some(inner) = without_creds.strip_prefix('[') {
        inner.split_once(']').map_or(inner, |(h, _)| h)
    } else {
        without_creds
            .rsplit_once(':')
            .map_or(without_creds, |(h, _)| h)
    };
    without_port.trim_end_matches('.').to_lowercase()
}

const SECOND_LEVEL_SUFFIXES: &[&str] = &[
    "ac", "co", "com", "edu", "gov", "ne", "net", "or", "org",
];

/// Domain to query the registry for: the last two labels of the host, or
/// three when the second-to-last label is a common second-level suffix
/// under a country code (`example.co.uk`). `None` for IP literals and
/// single-label hosts.
pub fn registrable_domain(netloc: &str) -> Option<String> {
    let host = host_name(netloc);
    if host.is_empty() || host.parse::<std::net::IpAddr>().is_ok() {
        return None;
    }
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    match labels.len() {
        0 | 1 => None,
        2 => Some(labels.join(".")),
        n => {
            let tld = labels[n - 1];
            let second = labels[n - 2];
            let take = if tld.len() == 2 && SECOND_LEVEL_SUFFIXES.contains(&second) {
                3
            } else {
                2
            };
            Some(labels[n - take..].join("."))
        }
    }
}
