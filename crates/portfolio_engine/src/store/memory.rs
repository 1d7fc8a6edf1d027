/* 📖 # Why a BTreeMap keyed by id?

Ids come from a monotonic counter, so ordering the map by id is the same as
ordering by insertion. `list()` gets insertion order for free and lookups stay
logarithmic, with no separate ordering vector to keep in sync on delete.
*/

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use portfolio_base::{PortfolioError, PortfolioResult};

use crate::project::{Project, ProjectDraft, ProjectId, ProjectPatch, sample_projects};
use crate::store::traits::ProjectStore;

const RESOURCE: &str = "Project";

/// An in-memory project store.
///
/// # Example
///
/// ```
/// use portfolio_engine::{InMemoryStore, ProjectFields, ProjectStore};
///
/// let mut store = InMemoryStore::new();
/// let project = store
///     .create(ProjectFields::new("CLI", "A command line tool", ["Rust"]).into())
///     .unwrap();
///
/// assert_eq!(project.id().value(), 1);
/// assert_eq!(store.len().unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    projects: BTreeMap<ProjectId, Project>,
    next_id: u64,
}

impl InMemoryStore {
    /// Create an empty store whose first id is 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Create a store pre-loaded with the sample projects (ids 1 and 2).
    pub fn with_samples() -> Self {
        let projects: BTreeMap<ProjectId, Project> = sample_projects()
            .into_iter()
            .zip(1..)
            .map(|(fields, id)| {
                let id = ProjectId::new(id);
                (id, Project::new(id, fields))
            })
            .collect();
        let next_id = projects.len() as u64 + 1;
        Self { projects, next_id }
    }

    fn starting_at(next_id: u64) -> Self {
        Self {
            projects: BTreeMap::new(),
            next_id,
        }
    }

    fn allocate_id(&mut self) -> PortfolioResult<ProjectId> {
        let id = ProjectId::new(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| portfolio_base::err!("Project id counter exhausted"))?;
        Ok(id)
    }

    fn existing(&self, id: ProjectId) -> PortfolioResult<&Project> {
        self.projects
            .get(&id)
            .ok_or_else(|| Box::new(PortfolioError::not_found(RESOURCE, id)))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectStore for InMemoryStore {
    #[instrument(skip_all)]
    fn create(&mut self, draft: ProjectDraft) -> PortfolioResult<Project> {
        let fields = draft.validate()?;
        let id = self.allocate_id()?;
        let project = Project::new(id, fields);
        self.projects.insert(id, project.clone());
        debug!(%id, "created project");
        Ok(project)
    }

    fn list(&self) -> PortfolioResult<Vec<Project>> {
        Ok(self.projects.values().cloned().collect())
    }

    #[instrument(skip_all, fields(id = %id))]
    fn get(&self, id: ProjectId) -> PortfolioResult<Project> {
        self.existing(id).cloned()
    }

    #[instrument(skip_all, fields(id = %id))]
    fn replace(&mut self, id: ProjectId, draft: ProjectDraft) -> PortfolioResult<Project> {
        self.existing(id)?;
        let project = Project::new(id, draft.validate()?);
        self.projects.insert(id, project.clone());
        debug!("replaced project");
        Ok(project)
    }

    #[instrument(skip_all, fields(id = %id))]
    fn merge_patch(&mut self, id: ProjectId, patch: &ProjectPatch) -> PortfolioResult<Project> {
        let merged = patch.apply_to(self.existing(id)?.fields())?;
        let project = Project::new(id, merged);
        self.projects.insert(id, project.clone());
        debug!("patched project");
        Ok(project)
    }

    #[instrument(skip_all, fields(id = %id))]
    fn delete(&mut self, id: ProjectId) -> PortfolioResult<()> {
        self.existing(id)?;
        self.projects.remove(&id);
        debug!("deleted project");
        Ok(())
    }

    fn clear(&mut self) -> PortfolioResult<()> {
        self.projects.clear();
        Ok(())
    }

    fn len(&self) -> PortfolioResult<usize> {
        Ok(self.projects.len())
    }

    fn is_empty(&self) -> PortfolioResult<bool> {
        Ok(self.projects.is_empty())
    }
}
