/* 📖 # Why an explicit route table?

All routes are listed in one place as `(method, path template, handler)` rows, so the
whole HTTP surface can be read at a glance and nothing is registered as a side
effect. Matching is done in two steps: first the path, then the method. A path that
matches with the wrong method yields the list of allowed methods for a 405.
*/

use percent_encoding::percent_decode_str;

use portfolio_base::pal::http::HttpMethod;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Param(&'static str),
}

/// A path such as `/projects/{id}`. `{name}` segments capture one decoded path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    template: &'static str,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(template: &'static str) -> Self {
        let segments = split_path(template)
            .map(|segment| {
                match segment
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
                {
                    Some(name) => Segment::Param(name),
                    None => Segment::Literal(segment),
                }
            })
            .collect();
        Self { template, segments }
    }

    pub fn as_str(&self) -> &'static str {
        self.template
    }

    /// Match a request path (without query string).
    ///
    /// Segments are percent-decoded before comparison. A single trailing slash is
    /// ignored. Segments that are not valid UTF-8 after decoding never match.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::default();
        let mut parts = split_path(normalize(path));
        for segment in &self.segments {
            let part = parts.next()?;
            let decoded = percent_decode_str(part).decode_utf8().ok()?;
            match segment {
                Segment::Literal(literal) => {
                    if decoded != *literal {
                        return None;
                    }
                }
                Segment::Param(_) if decoded.is_empty() => return None,
                Segment::Param(name) => params.0.push((*name, decoded.into_owned())),
            }
        }
        match parts.next() {
            Some(_) => None,
            None => Some(params),
        }
    }
}

fn normalize(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.split('/').filter(move |_| !path.is_empty())
}

/// Values captured by `{name}` segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(&'static str, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug)]
struct Route<H> {
    method: HttpMethod,
    template: PathTemplate,
    handler: H,
}

/// Outcome of resolving a request against the route table.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteMatch<H> {
    Found { handler: H, params: PathParams },
    MethodNotAllowed { allowed: Vec<HttpMethod> },
    NotFound,
}

/// Dispatch table from `(method, path template)` to a handler.
#[derive(Debug)]
pub struct Router<H> {
    routes: Vec<Route<H>>,
}

impl<H: Copy> Router<H> {
    pub fn new() -> Self {
        Self { routes: vec![] }
    }

    pub fn route(mut self, method: HttpMethod, template: &'static str, handler: H) -> Self {
        self.routes.push(Route {
            method,
            template: PathTemplate::parse(template),
            handler,
        });
        self
    }

    pub fn resolve(&self, method: HttpMethod, path: &str) -> RouteMatch<H> {
        let mut allowed = Vec::new();
        for route in &self.routes {
            let Some(params) = route.template.matches(path) else {
                continue;
            };
            if route.method == method {
                return RouteMatch::Found {
                    handler: route.handler,
                    params,
                };
            }
            if !allowed.contains(&route.method) {
                allowed.push(route.method);
            }
        }
        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed { allowed }
        }
    }
}

impl<H: Copy> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}
