/* 📖 # Why are links computed from rules instead of a fixed list?

Every project currently offers the same five actions, but whether an action is
available is a property of the project (a protected project might hide `delete`).
Each link is therefore a rule with an eligibility predicate over the project, and
`project_links` evaluates the rules in order. Adding a state-dependent link means
adding or changing a rule, not touching the callers.
*/

use serde::Serialize;

use portfolio_base::pal::http::HttpMethod;

use crate::project::{Project, ProjectId};

const COLLECTION_PATH: &str = "/projects";

/// A hypermedia link as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub rel: &'static str,
    pub href: String,
    pub method: &'static str,
}

impl Link {
    fn new(rel: &'static str, href: String, method: HttpMethod) -> Self {
        Self {
            rel,
            href,
            method: method.as_str(),
        }
    }
}

/// Where the links of a response point to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkContext {
    base_url: String,
}

impl LinkContext {
    /// `base_url` is the scheme and authority, e.g. `http://localhost:8000`.
    /// A trailing slash is dropped.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn collection_href(&self) -> String {
        format!("{}{}", self.base_url, COLLECTION_PATH)
    }

    pub fn project_href(&self, id: ProjectId) -> String {
        format!("{}{}/{}", self.base_url, COLLECTION_PATH, id)
    }
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Project,
    Collection,
}

struct LinkRule {
    rel: &'static str,
    method: HttpMethod,
    target: Target,
    eligible: fn(&Project) -> bool,
}

fn always(_: &Project) -> bool {
    true
}

const PROJECT_LINK_RULES: &[LinkRule] = &[
    LinkRule {
        rel: "self",
        method: HttpMethod::Get,
        target: Target::Project,
        eligible: always,
    },
    LinkRule {
        rel: "edit",
        method: HttpMethod::Put,
        target: Target::Project,
        eligible: always,
    },
    LinkRule {
        rel: "partial_edit",
        method: HttpMethod::Patch,
        target: Target::Project,
        eligible: always,
    },
    LinkRule {
        rel: "delete",
        method: HttpMethod::Delete,
        target: Target::Project,
        eligible: always,
    },
    LinkRule {
        rel: "collection",
        method: HttpMethod::Get,
        target: Target::Collection,
        eligible: always,
    },
];

/// The actions available on `project`, in a stable order.
pub fn project_links(project: &Project, context: &LinkContext) -> Vec<Link> {
    PROJECT_LINK_RULES
        .iter()
        .filter(|rule| (rule.eligible)(project))
        .map(|rule| {
            let href = match rule.target {
                Target::Project => context.project_href(project.id()),
                Target::Collection => context.collection_href(),
            };
            Link::new(rule.rel, href, rule.method)
        })
        .collect()
}

/// The actions available on the collection itself.
pub fn collection_links(context: &LinkContext) -> Vec<Link> {
    vec![
        Link::new("self", context.collection_href(), HttpMethod::Get),
        Link::new("create", context.collection_href(), HttpMethod::Post),
    ]
}

/// Wire form of a single project. Field order is part of the contract.
#[derive(Debug, Serialize)]
pub struct ProjectRepresentation<'a> {
    title: &'a str,
    description: &'a str,
    technologies: &'a [String],
    url: Option<&'a str>,
    id: ProjectId,
    #[serde(rename = "_links")]
    links: Vec<Link>,
}

impl<'a> ProjectRepresentation<'a> {
    pub fn new(project: &'a Project, context: &LinkContext) -> Self {
        Self {
            title: project.title(),
            description: project.description(),
            technologies: project.technologies(),
            url: project.url(),
            id: project.id(),
            links: project_links(project, context),
        }
    }
}

/// Wire form of the project list.
#[derive(Debug, Serialize)]
pub struct CollectionRepresentation<'a> {
    items: Vec<ProjectRepresentation<'a>>,
    #[serde(rename = "_links")]
    links: Vec<Link>,
}

impl<'a> CollectionRepresentation<'a> {
    pub fn new(projects: &'a [Project], context: &LinkContext) -> Self {
        Self {
            items: projects
                .iter()
                .map(|project| ProjectRepresentation::new(project, context))
                .collect(),
            links: collection_links(context),
        }
    }
}
