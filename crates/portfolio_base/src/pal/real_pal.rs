use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::{PortfolioError, PortfolioResult, error::ErrorKind};

use super::FilePath;
use super::http::{
    HttpMethod, HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService,
    HttpStatusCode,
};
use super::traits::Pal;

/* 📖 # Why tiny_http and a thread per request?

Every API operation is a quick, in-memory store call, so there is nothing to gain
from an async runtime. tiny_http gives a blocking accept loop; each accepted request
is handed to its own thread so one slow client cannot stall the others. The shared
store lock is the only synchronization the handlers need.
*/

/// How often the accept loop checks the shutdown flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Request bodies larger than this are rejected before the service sees them.
const MAX_REQUEST_BODY_BYTES: u64 = 1024 * 1024;

/// Concrete PAL implementation using the real filesystem and network.
///
/// All file paths are resolved relative to a configured base directory.
#[derive(Debug)]
pub struct RealPal {
    base_dir: PathBuf,
}

impl RealPal {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn resolve_path(&self, path: &FilePath) -> PathBuf {
        path.to_path(&self.base_dir)
    }
}

impl Pal for RealPal {
    #[instrument(skip(self), fields(path = %path))]
    fn file_exists(&self, path: &FilePath) -> PortfolioResult<bool> {
        let resolved = self.resolve_path(path);
        let exists = resolved.is_file();
        debug!(exists, resolved = %resolved.display(), "checked file existence");
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path))]
    fn read_file_to_string(&self, path: &FilePath) -> PortfolioResult<String> {
        let resolved = self.resolve_path(path);
        fs::read_to_string(&resolved).map_err(|e| {
            debug!(error = %e, "failed to read file");
            Box::new(PortfolioError::new(ErrorKind::FileError {
                path: resolved,
                source: e,
            }))
        })
    }

    #[instrument(skip(self, service), fields(address = %config.address()))]
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> PortfolioResult<HttpServerHandle> {
        let server = tiny_http::Server::http(config.address())
            .map_err(|e| crate::err!("Failed to bind HTTP server to {}: {}", config.address(), e))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| crate::err!("HTTP server is not bound to an IP address"))?;

        let handle = HttpServerHandle::new(port);
        let shutdown = handle.shutdown_flag();
        let service: Arc<dyn HttpService> = Arc::from(service);
        let server_name = config.server_name.clone();

        thread::Builder::new()
            .name(format!("http-accept-{}", port))
            .spawn(move || accept_loop(server, service, shutdown, server_name))
            .map_err(|e| crate::err!("Failed to spawn HTTP accept thread: {}", e))?;

        info!(host = %config.host, port, "HTTP server listening");
        Ok(handle)
    }
}

fn accept_loop(
    server: tiny_http::Server,
    service: Arc<dyn HttpService>,
    shutdown: Arc<AtomicBool>,
    server_name: String,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match server.recv_timeout(ACCEPT_POLL_INTERVAL) {
            Ok(Some(request)) => {
                let service = Arc::clone(&service);
                let server_name = server_name.clone();
                let spawned = thread::Builder::new()
                    .name("http-worker".to_string())
                    .spawn(move || serve_request(request, service.as_ref(), &server_name));
                if let Err(e) = spawned {
                    error!(error = %e, "failed to spawn HTTP worker thread");
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "HTTP accept loop failed");
                break;
            }
        }
    }
    info!("HTTP server stopped");
}

fn serve_request(mut request: tiny_http::Request, service: &dyn HttpService, server_name: &str) {
    let response = match to_http_request(&mut request) {
        Ok(http_request) => match service.handle_request(http_request) {
            Ok(response) => response,
            Err(e) => {
                error!(error = ?e, "HTTP service failed");
                HttpResponse::internal_error()
            }
        },
        Err(response) => response,
    };

    let status = response.status().as_u16();
    let mut tiny_response =
        tiny_http::Response::from_data(response.body().as_bytes().to_vec()).with_status_code(status);
    for (name, value) in response
        .headers()
        .iter()
        .chain(std::iter::once(("Server", server_name)))
    {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => tiny_response.add_header(header),
            Err(()) => warn!(header = name, "dropping invalid response header"),
        }
    }

    if let Err(e) = request.respond(tiny_response) {
        warn!(error = %e, "failed to write HTTP response");
    }
}

/// Convert a tiny_http request into the PAL representation.
///
/// Requests that cannot be represented are answered directly with the returned response.
fn to_http_request(request: &mut tiny_http::Request) -> Result<HttpRequest, HttpResponse> {
    let method = HttpMethod::parse(&request.method().to_string())
        .ok_or_else(|| HttpResponse::method_not_allowed(&HttpMethod::ALL))?;

    let mut http_request = HttpRequest::new(method, request.url());
    for header in request.headers() {
        http_request
            .headers_mut()
            .insert(header.field.to_string(), header.value.to_string());
    }

    let body = read_body(request.as_reader(), MAX_REQUEST_BODY_BYTES)?;
    debug!(method = %method, url = request.url(), body_len = body.len(), "received request");

    Ok(http_request.with_body(body))
}

/// Read at most `limit` bytes of body. Anything longer is answered with 400.
fn read_body(reader: &mut dyn Read, limit: u64) -> Result<Vec<u8>, HttpResponse> {
    let mut body = Vec::new();
    if let Err(e) = reader.take(limit + 1).read_to_end(&mut body) {
        warn!(error = %e, "failed to read request body");
        return Err(HttpResponse::json(
            HttpStatusCode::BadRequest,
            r#"{"detail":"Could not read request body"}"#,
        ));
    }
    if body.len() as u64 > limit {
        warn!(limit, "request body too large");
        return Err(HttpResponse::json(
            HttpStatusCode::BadRequest,
            format!(r#"{{"detail":"Request body exceeds {} bytes"}}"#, limit),
        ));
    }
    Ok(body)
}
