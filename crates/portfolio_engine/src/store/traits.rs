/* 📖 # Why create a ProjectStore trait?

The ProjectStore trait abstracts how projects are kept and how ids are assigned.
The HTTP layer only ever talks to a `StoreHandle`, so a persistent backend could be
slotted in later without touching routing or representation code.

The store validates drafts and patches itself: a write that reaches the store either
fully succeeds or leaves the record untouched.
*/

use std::sync::Arc;

use parking_lot::RwLock;

use portfolio_base::PortfolioResult;

use crate::project::{Project, ProjectDraft, ProjectId, ProjectPatch};

/// Trait for project storage implementations.
///
/// Missing ids are reported as `ErrorKind::NotFound`, invalid payloads as
/// `ErrorKind::Validation`.
pub trait ProjectStore: Send + Sync + 'static {
    /// Validate the draft, assign the next id and store the project.
    ///
    /// Ids are monotonic and never reused, even after deletion.
    fn create(&mut self, draft: ProjectDraft) -> PortfolioResult<Project>;

    /// All projects in insertion order.
    fn list(&self) -> PortfolioResult<Vec<Project>>;

    fn get(&self, id: ProjectId) -> PortfolioResult<Project>;

    /// Overwrite every field except the id.
    ///
    /// An unknown id is reported before the draft is validated.
    fn replace(&mut self, id: ProjectId, draft: ProjectDraft) -> PortfolioResult<Project>;

    /// Overwrite only the fields present in the patch.
    fn merge_patch(&mut self, id: ProjectId, patch: &ProjectPatch) -> PortfolioResult<Project>;

    fn delete(&mut self, id: ProjectId) -> PortfolioResult<()>;

    /// Remove all projects. The id counter is not reset.
    fn clear(&mut self) -> PortfolioResult<()>;

    fn len(&self) -> PortfolioResult<usize>;

    fn is_empty(&self) -> PortfolioResult<bool>;
}

/// A thread-safe handle to a project store.
///
/// Cloning is cheap (Arc). Every call takes the lock for exactly one store
/// operation, so each operation is atomic with respect to the id counter and
/// the project map.
#[derive(Clone)]
pub struct StoreHandle(Arc<RwLock<dyn ProjectStore>>);

impl StoreHandle {
    pub fn new<S: ProjectStore>(store: S) -> Self {
        Self(Arc::new(RwLock::new(store)))
    }

    /// See [`ProjectStore::create`].
    pub fn create(&self, draft: ProjectDraft) -> PortfolioResult<Project> {
        self.0.write().create(draft)
    }

    /// See [`ProjectStore::list`].
    pub fn list(&self) -> PortfolioResult<Vec<Project>> {
        self.0.read().list()
    }

    /// See [`ProjectStore::get`].
    pub fn get(&self, id: ProjectId) -> PortfolioResult<Project> {
        self.0.read().get(id)
    }

    /// See [`ProjectStore::replace`].
    pub fn replace(&self, id: ProjectId, draft: ProjectDraft) -> PortfolioResult<Project> {
        self.0.write().replace(id, draft)
    }

    /// See [`ProjectStore::merge_patch`].
    pub fn merge_patch(&self, id: ProjectId, patch: &ProjectPatch) -> PortfolioResult<Project> {
        self.0.write().merge_patch(id, patch)
    }

    /// See [`ProjectStore::delete`].
    pub fn delete(&self, id: ProjectId) -> PortfolioResult<()> {
        self.0.write().delete(id)
    }

    pub fn clear(&self) -> PortfolioResult<()> {
        self.0.write().clear()
    }

    pub fn len(&self) -> PortfolioResult<usize> {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> PortfolioResult<bool> {
        self.0.read().is_empty()
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle").finish_non_exhaustive()
    }
}
