use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::cookie::Jar;
use tracing::{info, warn};

use super::{load_cookies_into_jar, parse_netscape_cookies};

/// Loads the cookie jar uploads consult, from a cookie file path or `-` for stdin.
///
/// # Errors
///
/// Returns an error when the cookie file cannot be opened or parsed.
pub fn load_runtime_cookie_jar(cookie_source: &Path) -> Result<Arc<Jar>> {
    let reader: Box<dyn io::BufRead> = if cookie_source.as_os_str() == "-" {
        Box::new(io::BufReader::new(io::stdin()))
    } else {
        let file = std::fs::File::open(cookie_source)
            .with_context(|| format!("Cannot open cookie file '{}'", cookie_source.display()))?;
        Box::new(io::BufReader::new(file))
    };

    let parsed = parse_netscape_cookies(reader).context("Failed to parse cookie file")?;

    for (line_num, reason) in &parsed.warnings {
        warn!(line = line_num, reason = %reason, "Skipping malformed cookie line");
    }

    let domains: HashSet<&str> = parsed
        .cookies
        .iter()
        .map(|cookie| cookie.domain.as_str())
        .collect();
    info!(
        count = parsed.cookies.len(),
        domains = domains.len(),
        "Loaded cookies"
    );

    Ok(load_cookies_into_jar(&parsed.cookies))
}
