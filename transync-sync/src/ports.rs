//! Collaborator interfaces consumed by the engine.
//!
//! Adapters live in `transync-clients`; tests use in-memory fakes. Every call
//! blocks; transport timeouts are the adapter's business.

use transync_core::{Branch, Component, PlatformEndpoint, Project, Repository};

use crate::error::PortError;

/// One page of a paginated platform listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor of the following page, `None` on the last page.
    pub next: Option<u32>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Read side of the CI registry.
pub trait CiRegistry {
    /// Repositories with both a platform URL and an access token configured.
    fn list_repos_with_translation_enabled(&self) -> Result<Vec<Repository>, PortError>;

    /// Branches of `repo` flagged for translation sync.
    fn list_eligible_branches(&self, repo: &Repository) -> Result<Vec<Branch>, PortError>;
}

/// Read side of the translation platform.
pub trait PlatformClient {
    fn list_projects(&self, page: u32) -> Result<Page<Project>, PortError>;

    fn list_components(&self, project_slug: &str, page: u32) -> Result<Page<Component>, PortError>;

    /// `Ok(None)` when the platform does not know `slug`.
    fn get_project(&self, slug: &str) -> Result<Option<Project>, PortError>;
}

/// Opens a [`PlatformClient`] for one endpoint.
pub trait PlatformConnector {
    fn connect(&self, endpoint: &PlatformEndpoint) -> Result<Box<dyn PlatformClient>, PortError>;
}

/// Runs administrative commands on the platform host.
///
/// Output is returned for logging only; the engine looks at success/failure.
pub trait CommandExecutor {
    fn run(&self, argv: &[String]) -> Result<String, PortError>;
}

/// Logs every command instead of running it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunExecutor;

impl CommandExecutor for DryRunExecutor {
    fn run(&self, argv: &[String]) -> Result<String, PortError> {
        tracing::info!("[dry-run] would run: {}", argv.join(" "));
        Ok(String::new())
    }
}
