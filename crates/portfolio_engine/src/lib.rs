pub mod api;
pub mod config;
pub mod links;
pub mod project;
pub mod store;

pub use api::{ApiService, ApiSettings, BoundPort};
pub use config::{ApiConfig, CONFIG_FILE_NAME, Config, ServerConfig, load_config};
pub use links::{CollectionRepresentation, Link, LinkContext, ProjectRepresentation};
pub use project::{
    Patch, Project, ProjectDraft, ProjectFields, ProjectId, ProjectPatch, sample_projects,
};
pub use store::{InMemoryStore, ProjectStore, StoreHandle};
