/* 📖 # Why separate drafts, patches and stored fields?

PUT and POST carry a *draft*: every required field must be present, and a missing
field is a validation error with a field-level message. PATCH carries a *patch*:
every field is optional, and for the optional `url` an explicit `null` (clear it)
must be distinguishable from an absent key (leave it alone). A single struct with
defaulted fields cannot express either rule, so each payload has its own type and
both validate into `ProjectFields`, the only shape the store ever holds.
*/

use std::fmt;

use portfolio_base::{FieldError, PortfolioError, PortfolioResult};
use serde::{Deserialize, Deserializer, Serialize};

/// Store-assigned project identifier.
///
/// Ids are handed out by the store from a monotonic counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(u64);

impl ProjectId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// Parse a path segment into an id. Only plain non-negative integers are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok().map(Self)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The mutable fields of a project, i.e. everything except its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFields {
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub url: Option<String>,
}

impl ProjectFields {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        technologies: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            technologies: technologies.into_iter().map(Into::into).collect(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A stored project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    id: ProjectId,
    fields: ProjectFields,
}

impl Project {
    pub fn new(id: ProjectId, fields: ProjectFields) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn fields(&self) -> &ProjectFields {
        &self.fields
    }

    pub fn title(&self) -> &str {
        &self.fields.title
    }

    pub fn description(&self) -> &str {
        &self.fields.description
    }

    pub fn technologies(&self) -> &[String] {
        &self.fields.technologies
    }

    pub fn url(&self) -> Option<&str> {
        self.fields.url.as_deref()
    }
}

const FIELD_REQUIRED: &str = "field required";
const MAY_NOT_BE_NULL: &str = "may not be null";
const MUST_NOT_BE_EMPTY: &str = "must not be empty";

/// Full project payload used by create (POST) and replace (PUT).
///
/// Fields are optional at the type level only so that a missing field becomes a
/// field-level validation error instead of an opaque parse failure.
/// A missing `url` and `"url": null` both mean "no url".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub url: Option<String>,
}

impl ProjectDraft {
    pub fn validate(self) -> PortfolioResult<ProjectFields> {
        let mut errors = Vec::new();
        match &self.title {
            None => errors.push(FieldError::new("title", FIELD_REQUIRED)),
            Some(title) if title.is_empty() => {
                errors.push(FieldError::new("title", MUST_NOT_BE_EMPTY))
            }
            Some(_) => {}
        }
        if self.description.is_none() {
            errors.push(FieldError::new("description", FIELD_REQUIRED));
        }
        if self.technologies.is_none() {
            errors.push(FieldError::new("technologies", FIELD_REQUIRED));
        }

        match (self.title, self.description, self.technologies) {
            (Some(title), Some(description), Some(technologies)) if errors.is_empty() => {
                Ok(ProjectFields {
                    title,
                    description,
                    technologies,
                    url: self.url,
                })
            }
            _ => Err(Box::new(PortfolioError::validation(errors))),
        }
    }
}

impl From<ProjectFields> for ProjectDraft {
    fn from(fields: ProjectFields) -> Self {
        Self {
            title: Some(fields.title),
            description: Some(fields.description),
            technologies: Some(fields.technologies),
            url: fields.url,
        }
    }
}

/// Presence-aware value of a single patch field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// The key was not in the payload: keep the current value.
    Missing,
    /// The key was present with `null`.
    Null,
    /// The key was present with a value.
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Missing
    }
}

/* 📖 # How does Patch tell `null` from a missing key?
serde only calls `Deserialize` for keys that are present. Combined with
`#[serde(default)]` on every field, an absent key never reaches this impl and
stays `Missing`, while a present key is read as `Option<T>` and becomes `Null`
or `Value`.
*/
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

/// Partial project payload used by merge patch (PATCH).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectPatch {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub technologies: Patch<Vec<String>>,
    #[serde(default)]
    pub url: Patch<String>,
}

impl ProjectPatch {
    /// Check the patch without applying it.
    ///
    /// Required fields may be omitted but not set to `null`; `url` may be `null`.
    pub fn validate(&self) -> PortfolioResult<()> {
        let mut errors = Vec::new();
        match &self.title {
            Patch::Null => errors.push(FieldError::new("title", MAY_NOT_BE_NULL)),
            Patch::Value(title) if title.is_empty() => {
                errors.push(FieldError::new("title", MUST_NOT_BE_EMPTY))
            }
            _ => {}
        }
        if self.description == Patch::Null {
            errors.push(FieldError::new("description", MAY_NOT_BE_NULL));
        }
        if self.technologies == Patch::Null {
            errors.push(FieldError::new("technologies", MAY_NOT_BE_NULL));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Box::new(PortfolioError::validation(errors)))
        }
    }

    /// Merge the patch into `fields`, returning the updated copy.
    pub fn apply_to(&self, fields: &ProjectFields) -> PortfolioResult<ProjectFields> {
        self.validate()?;
        let mut merged = fields.clone();
        if let Patch::Value(title) = &self.title {
            merged.title = title.clone();
        }
        if let Patch::Value(description) = &self.description {
            merged.description = description.clone();
        }
        if let Patch::Value(technologies) = &self.technologies {
            merged.technologies = technologies.clone();
        }
        match &self.url {
            Patch::Missing => {}
            Patch::Null => merged.url = None,
            Patch::Value(url) => merged.url = Some(url.clone()),
        }
        Ok(merged)
    }
}

/// The two projects a fresh server is seeded with.
pub fn sample_projects() -> Vec<ProjectFields> {
    vec![
        ProjectFields::new(
            "Personal Website",
            "My personal portfolio website.",
            ["HTML", "CSS", "JavaScript"],
        )
        .with_url("https://example.com"),
        ProjectFields::new(
            "Data Analysis Tool",
            "Tool for analyzing sales data.",
            ["Python", "Pandas", "FastAPI"],
        )
        .with_url("https://github.com/example/data-tool"),
    ]
}
