//! Reading and writing the cookies used by the OAuth flow.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

/// Cookie carrying the CSRF state between `/auth` and `/oauth2callback`.
pub const STATE_COOKIE: &str = "oauth_state";

/// Lifetime of the state cookie in seconds.
pub const STATE_COOKIE_MAX_AGE: i64 = 600;

/// Attributes for a `Set-Cookie` value.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieOptions {
    /// `Max-Age` in seconds; session cookie when absent.
    pub max_age: Option<i64>,
    /// Add the `Secure` attribute.
    pub secure: bool,
}

/// Whether `value` is made only of RFC 6265 `cookie-octet`s.
pub fn is_valid_value(value: &str) -> bool {
    value.bytes().all(|b| {
        matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
    })
}

/// Build an HttpOnly, SameSite=Lax `Set-Cookie` value scoped to `/`.
///
/// Returns `None` when `value` cannot be carried in a cookie unquoted.
pub fn build(name: &str, value: &str, options: CookieOptions) -> Option<String> {
    is_valid_value(value).then(|| render(name, value, options))
}

/// `Set-Cookie` value that deletes `name`.
pub fn expire(name: &str, secure: bool) -> String {
    render(
        name,
        "",
        CookieOptions {
            max_age: Some(0),
            secure,
        },
    )
}

fn render(name: &str, value: &str, options: CookieOptions) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(max_age) = options.max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if options.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Value of cookie `name` from the request's `Cookie` headers, unquoted.
pub fn get(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| {
            value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value)
                .to_string()
        })
}
