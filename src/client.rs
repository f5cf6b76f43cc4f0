use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::redirect;

const USER_AGENT_VALUE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fixed desktop-browser header profile attached to every outbound request.
///
/// Request-level headers set by callers override these defaults for any key
/// present in both.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(
        "upgrade-insecure-requests",
        HeaderValue::from_static("1"),
    );
    headers
}

/// Build the shared transport.
///
/// Redirects stay disabled: the login flow captures `Set-Cookie` headers from
/// the 302 itself and follows the redirect manually.
pub fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .default_headers(browser_headers())
        .redirect(redirect::Policy::none())
        .build()
        .unwrap()
}
