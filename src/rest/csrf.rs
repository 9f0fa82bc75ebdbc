//! CSRF token handling for state-changing requests.
//!
//! The backend expects the token from its cookie to be echoed in a header,
//! but only on unsafe methods sent to the page's own origin.

/// Methods that never need the token.
pub fn csrf_safe_method(method: &str) -> bool {
    matches!(
        method.to_ascii_uppercase().as_str(),
        "GET" | "HEAD" | "OPTIONS" | "TRACE"
    )
}

/// Whether `url` points at `origin` (e.g. `https://host:8000`).
///
/// Absolute or scheme-relative URLs must match the origin exactly or be
/// below it; any relative URL is same-origin.
pub fn same_origin(url: &str, origin: &str) -> bool {
    let scheme_relative = match origin.find("//") {
        Some(pos) => &origin[pos..],
        None => origin,
    };
    let under = |base: &str| !base.is_empty() && (url == base || url.starts_with(&format!("{base}/")));

    under(origin)
        || under(scheme_relative)
        || !(url.starts_with("//") || url.starts_with("http:") || url.starts_with("https:"))
}

/// Whether a request needs the CSRF header.
pub fn needs_token(method: &str, url: &str, origin: &str) -> bool {
    !csrf_safe_method(method) && same_origin(url, origin)
}

/// Read a cookie value from a `Cookie:` header string.
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k.trim() == name).then(|| v.trim().to_string())
    })
}
