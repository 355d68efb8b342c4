use url::Url;

use super::RewriteOptions;
use crate::error::{ResolveError, Result};

fn is_http(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}

/// Turn a playlist reference into an absolute http(s) URL.
///
/// - `http://...` / `https://...`: validated, returned as written.
/// - `//host/...`: takes the scheme of `source_url`.
/// - `/...`: appended to the origin of `source_url`.
/// - anything else: resolved against the directory of `source_url`.
///
/// References with another scheme (`skd://`, `data:`) are refused.
pub fn resolve_reference(reference: &str, source_url: &str) -> Result<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(ResolveError::InvalidReference("empty reference".to_string()));
    }

    match Url::parse(reference) {
        Ok(url) if is_http(url.scheme()) => return Ok(reference.to_string()),
        Ok(url) => return Err(ResolveError::UnsupportedScheme(url.scheme().to_string())),
        Err(url::ParseError::RelativeUrlWithoutBase) => {}
        Err(e) => {
            return Err(ResolveError::InvalidReference(format!(
                "{}: {}",
                reference, e
            )))
        }
    }

    let base = Url::parse(source_url)
        .map_err(|e| ResolveError::InvalidBase(format!("{}: {}", source_url, e)))?;
    if !is_http(base.scheme()) {
        return Err(ResolveError::UnsupportedScheme(base.scheme().to_string()));
    }

    let absolute = if reference.starts_with("//") {
        format!("{}:{}", base.scheme(), reference)
    } else if reference.starts_with('/') {
        format!("{}{}", base.origin().ascii_serialization(), reference)
    } else {
        return base
            .join(reference)
            .map(String::from)
            .map_err(|e| ResolveError::InvalidReference(format!("{}: {}", reference, e)));
    };

    // The string form is kept; parsing only checks it is a real URL.
    Url::parse(&absolute)
        .map(|_| absolute.clone())
        .map_err(|e| ResolveError::InvalidReference(format!("{}: {}", absolute, e)))
}

/// Route an absolute URL through the proxy endpoint, or return it unchanged
/// when proxying is disabled.
pub fn proxy_url(absolute: &str, options: &RewriteOptions) -> String {
    if !options.proxy_enabled {
        return absolute.to_string();
    }
    let separator = if options.proxy_endpoint.contains('?') {
        '&'
    } else {
        '?'
    };
    format!(
        "{}{}url={}",
        options.proxy_endpoint,
        separator,
        urlencoding::encode(absolute)
    )
}
