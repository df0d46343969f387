//! URI canonicalization for consistent cache keys.

use url::Url;

use crate::Error;

/// Canonicalize a URL string supplied by a caller.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host, drop default ports
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, Error> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".into()));
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let parsed = Url::parse(&url_str).map_err(|e| Error::InvalidUrl(format!("{e}: {trimmed}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    }

    Ok(normalize(&parsed))
}

/// Normalize an already parsed URL: the `url` crate lowercases scheme and
/// host and strips default ports; the fragment never reaches the origin.
pub fn normalize(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized
}

/// String form used inside cache keys.
pub fn cache_uri(url: &Url) -> String {
    normalize(url).to_string()
}

/// Scheme, host and port equality.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
