//! Cookie loading for authenticated uploads.
//!
//! Cookies come from Netscape-format cookie files, which browsers and
//! browser extensions can export.

mod cookies;
mod runtime_cookies;

pub use cookies::{CookieError, CookieFile, StoredCookie, load_cookies_into_jar, parse_netscape_cookies};
pub use runtime_cookies::load_runtime_cookie_jar;
