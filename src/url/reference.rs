use url::Url;

/// Schemes that never lead to a crawlable page
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Resolves an `href` value against a base URL
///
/// Returns None if the reference should be excluded:
/// - empty or fragment-only references
/// - javascript:, mailto:, tel: and data: references
/// - references that are not well formed (see [`is_well_formed_reference`])
/// - results that are not HTTP(S) or have no host
///
/// The fragment of the resolved URL is removed, so `/page#a` and `/page#b`
/// resolve to the same URL.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use keyword_crawler::url::resolve_reference;
///
/// let base = Url::parse("https://example.com/docs/index.html").unwrap();
/// let resolved = resolve_reference("../about.html#team", &base).unwrap();
/// assert_eq!(resolved.as_str(), "https://example.com/about.html");
/// ```
pub fn resolve_reference(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return None;
    }

    if !is_well_formed_reference(href) {
        return None;
    }

    let mut resolved = base_url.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    resolved.host_str()?;

    resolved.set_fragment(None);
    Some(resolved)
}

/// Checks that a reference is a syntactically valid URI reference
///
/// The `url` crate repairs many malformed inputs while parsing; the crawler
/// instead discards them. A reference is rejected when it contains
/// whitespace or control characters, or a `%` that does not start a
/// two-digit hex escape.
pub fn is_well_formed_reference(href: &str) -> bool {
    if href.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    let bytes = href.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    true
}
