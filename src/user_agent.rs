//! Default User-Agent string for transfer requests.

/// Project URL for User-Agent identification (RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/nicksrandall/transfer";

/// Default User-Agent for uploads and downloads (identifies the tool).
#[must_use]
pub(crate) fn default_transfer_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("transfer/{version} (file-transfer; +{PROJECT_UA_URL})")
}
