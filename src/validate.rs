//! Destination URL checks shared by create and update.

use url::Url;

/// Why a destination URL was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("URL must not be empty")]
    Empty,
    #[error("URL must not have leading or trailing whitespace")]
    Whitespace,
    #[error("invalid URL format: {0}")]
    Malformed(String),
    #[error("unsupported scheme '{0}', only http and https are allowed")]
    Scheme(String),
    #[error("URL must have a host")]
    MissingHost,
}

/// Accept only absolute `http`/`https` URLs with a non-empty host.
pub fn validate_url(raw: &str) -> Result<Url, UrlError> {
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }
    if raw.trim() != raw {
        return Err(UrlError::Whitespace);
    }

    let parsed = Url::parse(raw).map_err(|e| UrlError::Malformed(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::Scheme(other.to_owned())),
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(parsed)
}
