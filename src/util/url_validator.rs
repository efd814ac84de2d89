use thiserror::Error;
use url::Url;

/// Reasons a URL is refused before it reaches the network or the browser.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
    #[error("Server URL must not carry a query or fragment")]
    UnexpectedSuffix,
}

fn parse_http(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

/// Validate a video URL before handing it to the system browser.
///
/// Video URLs come from the backend; anything that is not plain http(s)
/// (e.g. `file://`, `javascript:`) is refused so `open` never launches a
/// local handler.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    parse_http(url_str)
}

/// Validate the configured backend base URL.
///
/// The path is normalized to end in `/` so endpoint segments append to it
/// instead of replacing the last component.
pub fn validate_server_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let mut url = parse_http(url_str)?;

    if url.query().is_some() || url.fragment().is_some() {
        return Err(UrlValidationError::UnexpectedSuffix);
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_accepts_http_and_https() {
        assert!(validate_url_for_open("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(validate_url_for_open("http://example.com/v").is_ok());
    }

    #[test]
    fn test_open_rejects_other_schemes() {
        assert_eq!(
            validate_url_for_open("file:///etc/passwd"),
            Err(UrlValidationError::UnsupportedScheme("file".to_string()))
        );
        assert!(matches!(
            validate_url_for_open("javascript:alert(1)"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            validate_url_for_open("not a url"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_server_url_gets_trailing_slash() {
        let url = validate_server_url("http://127.0.0.1:8000").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/");

        let url = validate_server_url("https://example.com/dashboard").unwrap();
        assert_eq!(url.path(), "/dashboard/");
    }

    #[test]
    fn test_server_url_rejects_query() {
        assert_eq!(
            validate_server_url("http://example.com/?x=1"),
            Err(UrlValidationError::UnexpectedSuffix)
        );
    }
}
