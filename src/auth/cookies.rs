//! Netscape cookie file parsing.
//!
//! Each data line carries 7 TAB-separated fields:
//! `domain`, `include_subdomains`, `path`, `secure`, `expires`, `name`, `value`.
//! Parsed cookies are loaded into a `reqwest::cookie::Jar`, which uploads
//! consult through the `CookieStore` trait.

use std::fmt;
use std::io::BufRead;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use reqwest::cookie::Jar;
use tracing::{debug, instrument, warn};
use url::Url;

/// One cookie from a cookie file. The value is redacted in `Debug`.
#[derive(Clone)]
pub struct StoredCookie {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    /// Unix timestamp; 0 means session cookie.
    pub expires: u64,
    pub name: String,
    value: String,
}

impl StoredCookie {
    /// Cookie value. Never log it.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for StoredCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCookie")
            .field("domain", &self.domain)
            .field("include_subdomains", &self.include_subdomains)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expires", &self.expires)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Errors that can occur while reading a cookie file.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// A data line could not be parsed.
    #[error("line {line_number}: {reason}")]
    InvalidLine {
        /// 1-based line number.
        line_number: usize,
        /// What was wrong.
        reason: String,
    },

    /// Reading the file failed.
    #[error("failed to read cookie file: {0}")]
    Io(#[from] std::io::Error),

    /// The file had data lines but none of them parsed.
    #[error("no valid cookies found ({malformed_count} lines failed to parse)")]
    NoCookiesFound {
        /// Number of malformed lines.
        malformed_count: usize,
    },
}

/// Cookies parsed from a file plus per-line warnings.
#[derive(Debug, Default)]
pub struct CookieFile {
    pub cookies: Vec<StoredCookie>,
    pub warnings: Vec<(usize, String)>,
}

/// Parses a Netscape-format cookie file.
///
/// Blank lines and `#` comments are skipped. Malformed lines become warnings
/// as long as at least one cookie parses.
///
/// # Errors
///
/// Returns [`CookieError::Io`] on read failure, or
/// [`CookieError::NoCookiesFound`] when every data line is malformed.
#[instrument(level = "debug", skip(reader))]
pub fn parse_netscape_cookies(reader: impl BufRead) -> Result<CookieFile, CookieError> {
    let mut parsed = CookieFile::default();
    let mut data_lines = 0;

    for (idx, line_result) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line_result?;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        data_lines += 1;

        match parse_cookie_line(line, line_number) {
            Ok(cookie) => {
                debug!(line = line_number, domain = %cookie.domain, name = %cookie.name, "parsed cookie");
                parsed.cookies.push(cookie);
            }
            Err(e) => {
                warn!(line = line_number, reason = %e, "skipping malformed cookie line");
                parsed.warnings.push((line_number, e.to_string()));
            }
        }
    }

    if parsed.cookies.is_empty() && data_lines > 0 {
        return Err(CookieError::NoCookiesFound {
            malformed_count: parsed.warnings.len(),
        });
    }
    Ok(parsed)
}

fn parse_cookie_line(line: &str, line_number: usize) -> Result<StoredCookie, CookieError> {
    let invalid = |reason: String| CookieError::InvalidLine {
        line_number,
        reason,
    };

    let fields: Vec<&str> = line.split('\t').collect();
    let [domain, include_subdomains, path, secure, expires, name, value] = fields.as_slice() else {
        return Err(invalid(format!(
            "expected 7 TAB-separated fields, found {}",
            fields.len()
        )));
    };

    if domain.is_empty() {
        return Err(invalid("domain field is empty".to_string()));
    }
    if name.is_empty() {
        return Err(invalid("cookie name field is empty".to_string()));
    }
    let expires = expires
        .parse::<u64>()
        .map_err(|_| invalid(format!("expires must be a non-negative integer, got '{expires}'")))?;

    Ok(StoredCookie {
        domain: domain.to_string(),
        include_subdomains: parse_flag(include_subdomains).ok_or_else(|| {
            invalid(format!("include_subdomains must be TRUE or FALSE, got '{include_subdomains}'"))
        })?,
        path: path.to_string(),
        secure: parse_flag(secure)
            .ok_or_else(|| invalid(format!("secure must be TRUE or FALSE, got '{secure}'")))?,
        expires,
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}

/// Loads cookies into a jar suitable for `Uploader::with_cookie_store`.
#[instrument(level = "debug", skip(cookies))]
pub fn load_cookies_into_jar(cookies: &[StoredCookie]) -> Arc<Jar> {
    let jar = Arc::new(Jar::default());

    for cookie in cookies {
        let host = cookie.domain.trim_start_matches('.');
        let scheme = if cookie.secure { "https" } else { "http" };
        match Url::parse(&format!("{scheme}://{host}{}", cookie.path)) {
            Ok(origin) => {
                jar.add_cookie_str(&set_cookie_string(cookie), &origin);
                debug!(domain = %cookie.domain, name = %cookie.name, "loaded cookie into jar");
            }
            Err(_) => {
                warn!(domain = %cookie.domain, name = %cookie.name, "skipping cookie with unparseable domain");
            }
        }
    }

    jar
}

fn set_cookie_string(cookie: &StoredCookie) -> String {
    let mut parts = vec![
        format!("{}={}", cookie.name, cookie.value()),
        format!("Path={}", cookie.path),
    ];
    if cookie.include_subdomains {
        parts.push(format!("Domain={}", cookie.domain));
    }
    if cookie.secure {
        parts.push("Secure".to_string());
    }
    if cookie.expires > 0
        && let Some(expires_at) = UNIX_EPOCH.checked_add(Duration::from_secs(cookie.expires))
    {
        parts.push(format!("Expires={}", httpdate::fmt_http_date(expires_at)));
    }
    parts.join("; ")
}
