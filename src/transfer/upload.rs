//! Multipart file upload.
//!
//! One request per call: the file part first, then one text part per extra
//! parameter in caller order. The server's status code is reported as data,
//! so a 4xx/5xx answer is still a successful upload from our point of view.

use std::borrow::Cow;
use std::io;
use std::path::Path;
use std::sync::Arc;

use reqwest::cookie::CookieStore;
use reqwest::header::{COOKIE, HeaderValue};
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::fs::File;
use tracing::{debug, info, instrument};
use url::Url;

use super::client::{TransportConfig, build_client};
use super::constants::{DEFAULT_FILE_KEY, DEFAULT_FILE_NAME, DEFAULT_MIME_TYPE};
use super::TransferFailure;
use crate::path::resolve_local_path;

/// Everything needed to perform one upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Local file path or `file://` URI.
    pub file_path: String,
    /// URL of the server receiving the form.
    pub server_url: String,
    /// Form key of the file part.
    pub file_key: String,
    /// File name reported for the file part.
    pub file_name: String,
    /// Content type of the file part.
    pub mime_type: String,
    /// Extra text fields, sent in insertion order.
    pub extra_params: Map<String, Value>,
    /// Disable TLS certificate and hostname validation for this call.
    pub trust_all_certificates: bool,
    /// Accepted for compatibility; has no effect.
    pub chunked_mode: bool,
}

impl UploadRequest {
    /// Creates a request with the default key, name and MIME type.
    #[must_use]
    pub fn new(file_path: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            server_url: server_url.into(),
            file_key: DEFAULT_FILE_KEY.to_string(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            extra_params: Map::new(),
            trust_all_certificates: false,
            chunked_mode: false,
        }
    }

    /// Appends an extra text field.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_params.insert(key.into(), value.into());
        self
    }
}

/// Outcome of an upload: whatever the server answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    /// HTTP status code.
    #[serde(rename = "responseCode")]
    pub response_code: u16,
    /// Response body as text; empty when the server sent none.
    #[serde(rename = "response")]
    pub response_body: String,
}

/// Sends local files to HTTP servers as multipart forms.
#[derive(Clone, Default)]
pub struct Uploader {
    transport: TransportConfig,
    cookies: Option<Arc<dyn CookieStore>>,
}

impl std::fmt::Debug for Uploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uploader")
            .field("transport", &self.transport)
            .field("cookies", &self.cookies.is_some())
            .finish()
    }
}

impl Uploader {
    /// Creates an uploader with the given transport settings and no cookie store.
    #[must_use]
    pub fn new(transport: TransportConfig) -> Self {
        Self {
            transport,
            cookies: None,
        }
    }

    /// Consults `store` for a `Cookie` header on every upload.
    #[must_use]
    pub fn with_cookie_store(mut self, store: Arc<dyn CookieStore>) -> Self {
        self.cookies = Some(store);
        self
    }

    /// Uploads `request.file_path` to `request.server_url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransferFailure`] when:
    /// - the local file cannot be resolved or opened (checked first)
    /// - the server URL is malformed
    /// - an extra parameter is not representable as text
    /// - the connection, TLS handshake or body read fails
    #[instrument(skip(self, request), fields(file = %request.file_path, server = %request.server_url))]
    pub async fn upload(&self, request: &UploadRequest) -> Result<UploadResult, TransferFailure> {
        debug!(
            file_key = %request.file_key,
            file_name = %request.file_name,
            mime_type = %request.mime_type,
            params = request.extra_params.len(),
            "starting upload"
        );

        let local_path = resolve_local_path(&request.file_path)?;
        let (file, length) = open_source_file(&local_path).await?;

        let url = Url::parse(&request.server_url)
            .map_err(|_| TransferFailure::invalid_url(&request.server_url))?;

        if request.chunked_mode {
            debug!("chunked mode requested; sending with content length");
        }

        let form = build_form(request, file, length)?;
        let client = build_client(&self.transport, request.trust_all_certificates)?;

        let mut builder = client.post(url.clone()).multipart(form);
        if let Some(cookie) = self.cookie_header(&url) {
            debug!("attaching stored cookies");
            builder = builder.header(COOKIE, cookie);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransferFailure::connection(url.as_str(), e))?;

        let response_code = response.status().as_u16();
        let response_body = response
            .text()
            .await
            .map_err(|e| TransferFailure::connection(url.as_str(), e))?;

        info!(
            status = response_code,
            body_bytes = response_body.len(),
            "upload complete"
        );

        Ok(UploadResult {
            response_code,
            response_body,
        })
    }

    fn cookie_header(&self, url: &Url) -> Option<HeaderValue> {
        self.cookies.as_ref().and_then(|store| store.cookies(url))
    }
}

/// Opens the upload source, which must be a regular file.
async fn open_source_file(path: &Path) -> Result<(File, u64), TransferFailure> {
    let file = File::open(path)
        .await
        .map_err(|e| TransferFailure::file_not_found(path, e))?;
    let metadata = file
        .metadata()
        .await
        .map_err(|e| TransferFailure::file_not_found(path, e))?;
    if !metadata.is_file() {
        return Err(TransferFailure::file_not_found(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }
    Ok((file, metadata.len()))
}

/// Builds the multipart body: the file part, then one text part per param.
///
/// The file is streamed; its known length keeps the body's `Content-Length`.
fn build_form(request: &UploadRequest, file: File, length: u64) -> Result<Form, TransferFailure> {
    let file_part = Part::stream_with_length(Body::from(file), length)
        .file_name(request.file_name.clone())
        .mime_str(&request.mime_type)
        .map_err(|e| TransferFailure::protocol(&request.file_key, e.to_string()))?;

    let mut form = Form::new().part(request.file_key.clone(), file_part);
    for (key, value) in &request.extra_params {
        let text = param_text(key, value)?;
        form = form.text(key.clone(), text.into_owned());
    }
    Ok(form)
}

/// Text form of a parameter value; scalars only.
fn param_text<'a>(key: &str, value: &'a Value) -> Result<Cow<'a, str>, TransferFailure> {
    match value {
        Value::String(s) => Ok(Cow::Borrowed(s)),
        Value::Number(n) => Ok(Cow::Owned(n.to_string())),
        Value::Bool(b) => Ok(Cow::Owned(b.to_string())),
        Value::Null => Err(TransferFailure::protocol(key, "value is null")),
        Value::Array(_) => Err(TransferFailure::protocol(key, "value is an array")),
        Value::Object(_) => Err(TransferFailure::protocol(key, "value is an object")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use reqwest::cookie::Jar;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> String {
        let file_path = dir.path().join(name);
        std::fs::write(&file_path, contents).unwrap();
        file_path.to_str().unwrap().to_string()
    }

    fn position(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    #[test]
    fn test_param_text_accepts_scalars() {
        assert_eq!(param_text("a", &json!("x")).unwrap(), "x");
        assert_eq!(param_text("a", &json!(7)).unwrap(), "7");
        assert_eq!(param_text("a", &json!(true)).unwrap(), "true");
    }

    #[test]
    fn test_param_text_rejects_structured_values() {
        for value in [json!(null), json!([1, 2]), json!({"k": "v"})] {
            let err = param_text("field", &value).unwrap_err();
            assert!(matches!(err, TransferFailure::Protocol { ref field, .. } if field == "field"));
        }
    }

    #[test]
    fn test_upload_request_defaults() {
        let request = UploadRequest::new("/tmp/a.jpg", "http://example.com/upload");
        assert_eq!(request.file_key, "file");
        assert_eq!(request.file_name, "image.jpg");
        assert_eq!(request.mime_type, "image/jpeg");
        assert!(request.extra_params.is_empty());
        assert!(!request.trust_all_certificates);
        assert!(!request.chunked_mode);
    }

    #[tokio::test]
    async fn test_upload_reports_status_and_body() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let file = write_file(&temp_dir, "photo.jpg", b"0123456789");

        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(201).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let request = UploadRequest::new(file, format!("{}/upload", mock_server.uri()));
        let result = Uploader::default().upload(&request).await.unwrap();

        assert_eq!(
            result,
            UploadResult {
                response_code: 201,
                response_body: "ok".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_upload_server_error_status_is_data_not_failure() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let file = write_file(&temp_dir, "photo.jpg", b"data");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let request = UploadRequest::new(file, mock_server.uri());
        let result = Uploader::default().upload(&request).await.unwrap();

        assert_eq!(result.response_code, 500);
        assert_eq!(result.response_body, "");
    }

    #[tokio::test]
    async fn test_upload_multipart_parts_in_order() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let file = write_file(&temp_dir, "doc.bin", b"\x00\x01binary-payload\xff");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let mut request = UploadRequest::new(file, mock_server.uri())
            .with_param("user", "a")
            .with_param("id", "7");
        request.file_key = "upload".to_string();
        request.file_name = "doc.bin".to_string();
        request.mime_type = "application/octet-stream".to_string();
        Uploader::default().upload(&request).await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body = &requests[0].body;

        assert_eq!(
            body.windows(b"form-data;".len())
                .filter(|w| *w == b"form-data;")
                .count(),
            3,
            "expected exactly one file part and two text parts"
        );
        let file_pos = position(body, br#"name="upload"; filename="doc.bin""#).unwrap();
        let user_pos = position(body, br#"name="user""#).unwrap();
        let id_pos = position(body, br#"name="id""#).unwrap();
        assert!(file_pos < user_pos && user_pos < id_pos);

        let payload_pos = position(body, b"\x00\x01binary-payload\xff").unwrap();
        assert!(file_pos < payload_pos && payload_pos < user_pos);
        assert!(position(body, b"application/octet-stream").is_some());
    }

    #[tokio::test]
    async fn test_upload_attaches_stored_cookie() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let file = write_file(&temp_dir, "photo.jpg", b"data");
        let server_url = format!("{}/upload", mock_server.uri());

        Mock::given(method("POST"))
            .and(header("cookie", "session=abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("with cookie"))
            .mount(&mock_server)
            .await;

        let jar = Arc::new(Jar::default());
        jar.add_cookie_str("session=abc123", &server_url.parse::<Url>().unwrap());
        let uploader = Uploader::default().with_cookie_store(jar);

        let result = uploader
            .upload(&UploadRequest::new(file, server_url))
            .await
            .unwrap();
        assert_eq!(result.response_body, "with cookie");
    }

    #[tokio::test]
    async fn test_upload_without_cookie_store_sends_no_cookie() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let file = write_file(&temp_dir, "photo.jpg", b"data");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        Uploader::default()
            .upload(&UploadRequest::new(file, mock_server.uri()))
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("cookie").is_none());
    }

    #[tokio::test]
    async fn test_upload_streams_large_file_with_content_length() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let payload: Vec<u8> = (0..300_000u32)
            .map(|i| u8::try_from(i % 251).unwrap())
            .collect();
        let temp_dir = TempDir::new().unwrap();
        let file = write_file(&temp_dir, "big.bin", &payload);

        Uploader::default()
            .upload(&UploadRequest::new(file, mock_server.uri()))
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let body = &requests[0].body;
        assert!(position(body, &payload).is_some());
        let content_length = requests[0].headers.get("content-length").unwrap();
        assert_eq!(content_length.to_str().unwrap(), body.len().to_string());
        assert!(requests[0].headers.get("transfer-encoding").is_none());
    }

    #[tokio::test]
    async fn test_upload_missing_file_wins_over_bad_url() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.jpg");
        let request = UploadRequest::new(missing.to_str().unwrap(), "not a url");

        let err = Uploader::default().upload(&request).await.unwrap_err();
        assert!(matches!(err, TransferFailure::FileNotFound { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_upload_directory_is_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let request = UploadRequest::new(temp_dir.path().to_str().unwrap(), "http://127.0.0.1/");

        let err = Uploader::default().upload(&request).await.unwrap_err();
        assert!(matches!(err, TransferFailure::FileNotFound { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_upload_content_uri_is_unsupported() {
        let request = UploadRequest::new("content://media/1", "http://127.0.0.1/");

        let err = Uploader::default().upload(&request).await.unwrap_err();
        assert!(matches!(err, TransferFailure::UnsupportedPath(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_upload_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let file = write_file(&temp_dir, "photo.jpg", b"data");

        let err = Uploader::default()
            .upload(&UploadRequest::new(file, "::not-a-url"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferFailure::InvalidUrl { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_upload_structured_param_is_protocol_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = write_file(&temp_dir, "photo.jpg", b"data");
        let request =
            UploadRequest::new(file, "http://127.0.0.1:9/").with_param("tags", json!(["a"]));

        let err = Uploader::default().upload(&request).await.unwrap_err();
        assert!(matches!(err, TransferFailure::Protocol { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_upload_refused_connection_is_connection_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let temp_dir = TempDir::new().unwrap();
        let file = write_file(&temp_dir, "photo.jpg", b"data");

        let err = Uploader::default()
            .upload(&UploadRequest::new(file, format!("http://127.0.0.1:{port}/")))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferFailure::Connection { .. }), "{err:?}");
    }
}
