use axum::http::HeaderValue;

/// Prefix `https://` to a URL typed without an http(s) scheme.
pub fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_owned()
    } else {
        format!("https://{url}")
    }
}

/// Whether `url` can be sent back as a `Location` header.
pub fn is_redirectable(url: &str) -> bool {
    HeaderValue::from_str(url).is_ok()
}
