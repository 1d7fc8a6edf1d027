/* 📖 # Why a dedicated HTTP module in the PAL?

The HTTP abstraction lets the API be written against plain request/response values
while remaining fully testable with MockPal:

- **Testable web services**: MockPal dispatches requests in-memory for assertions
- **Consistent interface**: Single API for both real and test scenarios
- **Synchronous simplicity**: No async runtime; every store operation is quick and local

Only RealPal knows that tiny_http is underneath.
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// HTTP methods understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
    ];

    /// Parse an HTTP method from a string.
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/* 📖 # Why are header names compared case-insensitively?
HTTP header names are case-insensitive, and tiny_http hands them over exactly as the
client sent them. Lookups like `get("content-type")` must find `Content-Type`.
Insertion order is kept so responses are written deterministically.
*/

/// HTTP headers collection with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    entries: Vec<(String, String)>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any existing value with the same name.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(&key))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Request or response body bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpBody(Vec<u8>);

impl HttpBody {
    pub fn empty() -> Self {
        Self(vec![])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get content as a string if valid UTF-8.
    pub fn as_string(&self) -> Option<String> {
        String::from_utf8(self.0.clone()).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for HttpBody {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<String> for HttpBody {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&str> for HttpBody {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// HTTP request structure.
///
/// `path` is the raw request target and may include a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: HttpMethod,
    path: String,
    headers: HttpHeaders,
    body: HttpBody,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HttpHeaders::new(),
            body: HttpBody::empty(),
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The full request target, including any query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request target with the query string removed.
    pub fn path_without_query(&self) -> &str {
        self.path
            .split_once('?')
            .map_or(self.path.as_str(), |(path, _)| path)
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HttpHeaders {
        &mut self.headers
    }

    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    pub fn with_body(mut self, body: impl Into<HttpBody>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Shorthand for a request carrying a JSON body.
    pub fn with_json(self, body: impl Into<String>) -> Self {
        self.with_header("Content-Type", "application/json")
            .with_body(body.into())
    }
}

/// HTTP status codes produced by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatusCode {
    Ok = 200,
    Created = 201,
    NoContent = 204,
    BadRequest = 400,
    NotFound = 404,
    MethodNotAllowed = 405,
    UnprocessableEntity = 422,
    InternalServerError = 500,
}

impl HttpStatusCode {
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// HTTP response structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: HttpStatusCode,
    headers: HttpHeaders,
    body: HttpBody,
}

impl HttpResponse {
    pub fn new(status: HttpStatusCode) -> Self {
        Self {
            status,
            headers: HttpHeaders::new(),
            body: HttpBody::empty(),
        }
    }

    pub fn no_content() -> Self {
        Self::new(HttpStatusCode::NoContent)
    }

    pub fn status(&self) -> HttpStatusCode {
        self.status
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    pub fn with_body(mut self, body: impl Into<HttpBody>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// The generic 500 response. Never carries details of the underlying fault.
    pub fn internal_error() -> Self {
        Self::json(
            HttpStatusCode::InternalServerError,
            r#"{"detail":"Internal Server Error"}"#,
        )
    }

    /// 405 answer naming the supported methods in the `Allow` header.
    pub fn method_not_allowed(allowed: &[HttpMethod]) -> Self {
        let allow = allowed
            .iter()
            .map(HttpMethod::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Self::json(
            HttpStatusCode::MethodNotAllowed,
            r#"{"detail":"Method Not Allowed"}"#,
        )
        .with_header("Allow", allow)
    }

    /// Create a JSON response with the given status.
    pub fn json(status: HttpStatusCode, body: impl Into<String>) -> Self {
        Self::new(status)
            .with_content_type("application/json")
            .with_body(body.into())
    }
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    /// Port to listen on. If None, the OS will assign an available port.
    pub port: Option<u16>,
    /// Value of the `Server` response header.
    pub server_name: String,
}

impl HttpServerConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Get the address string (host:port, port 0 for OS-assigned).
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port.unwrap_or(0))
    }
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: None,
            server_name: "portfolio-server".to_string(),
        }
    }
}

/* 📖 # Why a single HttpService trait?

The service receives raw HttpRequest values and returns HttpResponse values. This
gives the application full control over routing (the API keeps an explicit
dispatch table) and keeps the PAL free of any routing API.
*/

/// Trait for handling HTTP requests.
pub trait HttpService: std::fmt::Debug + Send + Sync + 'static {
    /// Handle an HTTP request and return a response.
    ///
    /// Client errors should be turned into 4xx responses by the service itself.
    /// An `Err` is treated as an internal fault: the server answers with a
    /// generic 500 and logs the error.
    fn handle_request(&self, request: HttpRequest) -> crate::PortfolioResult<HttpResponse>;
}

/// Handle to a running HTTP server.
///
/// Dropping the handle (or calling `shutdown()`) stops the server from accepting
/// new connections.
#[derive(Debug)]
pub struct HttpServerHandle {
    port: u16,
    shutdown: Arc<AtomicBool>,
}

impl HttpServerHandle {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn address(&self, host: &str) -> String {
        format!("{}:{}", host, self.port)
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Shared shutdown flag, polled by server implementations.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }
}

impl Drop for HttpServerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
