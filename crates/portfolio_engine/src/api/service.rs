/* 📖 # Why does the service never return Err to the server?

Every request ends in exactly one response. Client errors (unknown id, invalid
fields, unparseable body) become 4xx responses and internal faults become the
generic 500 inside the service, where the failure can still be logged together with
the request that caused it. The server only sees an Err if the service itself is
broken.
*/

use std::net::IpAddr;
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, info_span};

use portfolio_base::pal::http::{
    HttpMethod, HttpRequest, HttpResponse, HttpService, HttpStatusCode,
};
use portfolio_base::{FieldError, PortfolioError, PortfolioResult};

use crate::api::body::parse_json_body;
use crate::api::errors::{error_response, not_found};
use crate::api::router::{PathParams, RouteMatch, Router};
use crate::config::Config;
use crate::links::{CollectionRepresentation, LinkContext, ProjectRepresentation};
use crate::project::{ProjectDraft, ProjectId, ProjectPatch};
use crate::store::StoreHandle;

const WELCOME_MESSAGE: &str =
    "Welcome to the Simple Portfolio API. Browse the collection at /projects.";

/// Settings of the API that do not depend on the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Base of all link hrefs. When unset, the `Host` header of each request is used.
    pub public_base_url: Option<String>,
    /// Host used in links when neither a public base URL nor a `Host` header is available.
    pub fallback_host: String,
    /// Port used next to `fallback_host` until the bound port is known.
    pub fallback_port: u16,
    /// `max-age` declared on GET responses.
    pub cache_max_age_secs: u32,
}

impl ApiSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_base_url: config.server.public_base_url.clone(),
            fallback_host: link_host(&config.server.host),
            fallback_port: config.server.port,
            cache_max_age_secs: config.api.cache_max_age_secs,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Host part of a URL that reaches a server listening on `host`.
///
/// Wildcard listen addresses are not reachable themselves, so links point at loopback.
fn link_host(host: &str) -> String {
    match host.parse::<IpAddr>() {
        Ok(ip) if ip.is_unspecified() && ip.is_ipv4() => "127.0.0.1".to_string(),
        Ok(ip) if ip.is_unspecified() => "[::1]".to_string(),
        Ok(IpAddr::V6(ip)) => format!("[{}]", ip),
        _ => host.to_string(),
    }
}

/// Port the server actually listens on, recorded once it has been bound.
///
/// With port 0 the OS picks the port, so it is only known after the service was
/// handed to the server.
#[derive(Debug, Clone, Default)]
pub struct BoundPort(Arc<OnceLock<u16>>);

impl BoundPort {
    /// Record the bound port. Later calls are ignored.
    pub fn set(&self, port: u16) {
        let _ = self.0.set(port);
    }

    pub fn get(&self) -> Option<u16> {
        self.0.get().copied()
    }
}

/// Everything a handler needs to know about the request it serves.
struct RequestContext {
    request: HttpRequest,
    params: PathParams,
    links: LinkContext,
}

type Handler = fn(&ApiService, &RequestContext) -> PortfolioResult<HttpResponse>;

/// HTTP service exposing the project collection.
///
/// # Examples
/// ```
/// use portfolio_base::pal::http::{HttpMethod, HttpRequest, HttpService};
/// use portfolio_engine::{ApiService, InMemoryStore, StoreHandle};
///
/// let service = ApiService::new(StoreHandle::new(InMemoryStore::with_samples()));
/// let response = service
///     .handle_request(HttpRequest::new(HttpMethod::Get, "/projects/1"))
///     .unwrap();
/// assert_eq!(response.status().as_u16(), 200);
/// ```
pub struct ApiService {
    store: StoreHandle,
    settings: ApiSettings,
    bound_port: BoundPort,
    router: Router<Handler>,
}

impl std::fmt::Debug for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ApiService {
    pub fn new(store: StoreHandle) -> Self {
        Self::with_settings(store, ApiSettings::default())
    }

    pub fn with_settings(store: StoreHandle, settings: ApiSettings) -> Self {
        let router = Router::<Handler>::new()
            .route(HttpMethod::Get, "/", Self::root)
            .route(HttpMethod::Get, "/projects", Self::list_projects)
            .route(HttpMethod::Post, "/projects", Self::create_project)
            .route(HttpMethod::Get, "/projects/{id}", Self::get_project)
            .route(HttpMethod::Put, "/projects/{id}", Self::replace_project)
            .route(HttpMethod::Patch, "/projects/{id}", Self::patch_project)
            .route(HttpMethod::Delete, "/projects/{id}", Self::delete_project);
        Self {
            store,
            settings,
            bound_port: BoundPort::default(),
            router,
        }
    }

    /// Shared slot for the port the server ends up bound to.
    pub fn bound_port(&self) -> BoundPort {
        self.bound_port.clone()
    }

    fn link_context(&self, request: &HttpRequest) -> LinkContext {
        if let Some(base_url) = &self.settings.public_base_url {
            return LinkContext::new(base_url.clone());
        }
        match request
            .headers()
            .get("Host")
            .map(str::trim)
            .filter(|host| !host.is_empty())
        {
            Some(host) => LinkContext::new(format!("http://{}", host)),
            None => LinkContext::new(format!(
                "http://{}:{}",
                self.settings.fallback_host,
                self.bound_port.get().unwrap_or(self.settings.fallback_port)
            )),
        }
    }

    fn cacheable(&self, response: HttpResponse) -> HttpResponse {
        response.with_header(
            "Cache-Control",
            format!("public, max-age={}", self.settings.cache_max_age_secs),
        )
    }

    fn root(&self, _context: &RequestContext) -> PortfolioResult<HttpResponse> {
        Ok(HttpResponse::json(
            HttpStatusCode::Ok,
            json!({ "message": WELCOME_MESSAGE }).to_string(),
        ))
    }

    fn list_projects(&self, context: &RequestContext) -> PortfolioResult<HttpResponse> {
        let projects = self.store.list()?;
        let body = CollectionRepresentation::new(&projects, &context.links);
        Ok(self.cacheable(json_response(HttpStatusCode::Ok, &body)?))
    }

    fn create_project(&self, context: &RequestContext) -> PortfolioResult<HttpResponse> {
        let draft: ProjectDraft = parse_json_body(&context.request)?;
        let project = self.store.create(draft)?;
        let location = context.links.project_href(project.id());
        let body = ProjectRepresentation::new(&project, &context.links);
        Ok(json_response(HttpStatusCode::Created, &body)?.with_header("Location", location))
    }

    fn get_project(&self, context: &RequestContext) -> PortfolioResult<HttpResponse> {
        let project = self.store.get(project_id(&context.params)?)?;
        let body = ProjectRepresentation::new(&project, &context.links);
        Ok(self.cacheable(json_response(HttpStatusCode::Ok, &body)?))
    }

    fn replace_project(&self, context: &RequestContext) -> PortfolioResult<HttpResponse> {
        let id = project_id(&context.params)?;
        let draft: ProjectDraft = parse_json_body(&context.request)?;
        let project = self.store.replace(id, draft)?;
        let body = ProjectRepresentation::new(&project, &context.links);
        json_response(HttpStatusCode::Ok, &body)
    }

    fn patch_project(&self, context: &RequestContext) -> PortfolioResult<HttpResponse> {
        let id = project_id(&context.params)?;
        let patch: ProjectPatch = parse_json_body(&context.request)?;
        let project = self.store.merge_patch(id, &patch)?;
        let body = ProjectRepresentation::new(&project, &context.links);
        json_response(HttpStatusCode::Ok, &body)
    }

    fn delete_project(&self, context: &RequestContext) -> PortfolioResult<HttpResponse> {
        self.store.delete(project_id(&context.params)?)?;
        Ok(HttpResponse::no_content())
    }
}

impl HttpService for ApiService {
    fn handle_request(&self, request: HttpRequest) -> PortfolioResult<HttpResponse> {
        let method = request.method();
        let path = request.path_without_query().to_string();
        let span = info_span!("request", %method, %path);
        let _guard = span.enter();

        let response = match self.router.resolve(method, &path) {
            RouteMatch::Found { handler, params } => {
                let context = RequestContext {
                    links: self.link_context(&request),
                    request,
                    params,
                };
                handler(self, &context).unwrap_or_else(|err| {
                    debug!(error = %err, "request failed");
                    error_response(&err)
                })
            }
            RouteMatch::MethodNotAllowed { allowed } => HttpResponse::method_not_allowed(&allowed),
            RouteMatch::NotFound => not_found(),
        };

        info!(status = response.status().as_u16(), "handled request");
        Ok(response)
    }
}

fn project_id(params: &PathParams) -> PortfolioResult<ProjectId> {
    params
        .get("id")
        .and_then(ProjectId::parse)
        .ok_or_else(|| {
            Box::new(PortfolioError::validation(vec![FieldError::new(
                "id",
                "value is not a valid integer",
            )]))
        })
}

fn json_response<T: Serialize>(status: HttpStatusCode, body: &T) -> PortfolioResult<HttpResponse> {
    let json = serde_json::to_string(body)
        .map_err(|e| portfolio_base::err!("Failed to serialize response body: {}", e))?;
    Ok(HttpResponse::json(status, json))
}
