use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::ErrorKind;
use crate::{PortfolioError, PortfolioResult};

use super::FilePath;
use super::http::{HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService};
use super::traits::Pal;

/* 📖 # Why use HashMap for MockPal storage?

MockPal uses in-memory storage with Arc<Mutex<T>> for several reasons:
1. **Speed**: No filesystem or socket I/O, deterministic and fast for unit tests
2. **Isolation**: No side effects on the real machine
3. **Control**: Tests decide exactly which files exist
4. **Thread-safe**: Mutex allows concurrent test execution

HTTP servers are not bound to sockets: the registered service is kept per port
and invoked directly by `simulate_request()`.
*/

/// In-memory PAL implementation for testing.
///
/// # Examples
///
/// ```
/// use portfolio_base::{FilePath, MockPal, Pal};
///
/// let mock = MockPal::new();
/// mock.add_file(FilePath::from("portfolio.toml"), "[server]\nport = 9000\n");
/// let content = mock.read_file_to_string(&FilePath::from("portfolio.toml")).unwrap();
/// assert!(content.contains("9000"));
/// ```
#[derive(Debug, Clone)]
pub struct MockPal {
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    http_servers: Arc<Mutex<HashMap<u16, MockServer>>>,
    next_port: Arc<AtomicU16>,
}

/// A service registered through `start_http_server`.
#[derive(Debug)]
struct MockServer {
    service: Box<dyn HttpService>,
    shutdown: Arc<AtomicBool>,
    _config: HttpServerConfig,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockPal {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            http_servers: Arc::new(Mutex::new(HashMap::new())),
            next_port: Arc::new(AtomicU16::new(10000)),
        }
    }

    /// Add a file to the mock storage.
    pub fn add_file(&self, path: FilePath, content: impl Into<Vec<u8>>) {
        lock(&self.files).insert(path, content.into());
    }

    /// Simulate an HTTP request to a running server.
    ///
    /// Looks up the service registered for `port` and invokes it directly. Fails
    /// if no server was started on that port or it has been shut down.
    pub fn simulate_request(
        &self,
        port: u16,
        request: HttpRequest,
    ) -> PortfolioResult<HttpResponse> {
        let servers = lock(&self.http_servers);
        let server = servers
            .get(&port)
            .ok_or_else(|| crate::err!("No HTTP server registered on port {}", port))?;
        if server.shutdown.load(Ordering::SeqCst) {
            crate::bail!("HTTP server on port {} has been shut down", port);
        }
        server.service.handle_request(request)
    }

    /// Number of servers started on this PAL, including stopped ones.
    pub fn http_server_count(&self) -> usize {
        lock(&self.http_servers).len()
    }
}

impl Default for MockPal {
    fn default() -> Self {
        Self::new()
    }
}

impl Pal for MockPal {
    fn file_exists(&self, path: &FilePath) -> PortfolioResult<bool> {
        Ok(lock(&self.files).contains_key(path))
    }

    fn read_file_to_string(&self, path: &FilePath) -> PortfolioResult<String> {
        let bytes = lock(&self.files).get(path).cloned().ok_or_else(|| {
            Box::new(PortfolioError::new(ErrorKind::FileError {
                path: path.as_relative().as_str().into(),
                source: io::Error::new(io::ErrorKind::NotFound, "file not found in MockPal"),
            }))
        })?;
        String::from_utf8(bytes).map_err(|_| crate::err!("File is not valid UTF-8: {}", path))
    }

    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> PortfolioResult<HttpServerHandle> {
        let port = match config.port {
            Some(p) if p != 0 => p,
            _ => self.next_port.fetch_add(1, Ordering::SeqCst),
        };

        let handle = HttpServerHandle::new(port);
        let server = MockServer {
            service,
            shutdown: handle.shutdown_flag(),
            _config: config,
        };
        lock(&self.http_servers).insert(port, server);

        Ok(handle)
    }
}
