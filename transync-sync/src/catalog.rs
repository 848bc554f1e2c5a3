//! In-memory snapshot of every project and component on one platform.
//!
//! The snapshot is replaced wholesale: [`Catalog::refresh`] builds a complete
//! new listing and swaps it in only when every page of every listing
//! succeeded. Readers therefore see either the previous snapshot or the new
//! one, never a mix.

use chrono::{DateTime, Utc};

use transync_core::{Component, Project, ProjectIdentity};

use crate::error::{PortError, SyncError};
use crate::pages::collect_all;
use crate::ports::PlatformClient;

pub struct Catalog {
    endpoint: String,
    client: Box<dyn PlatformClient>,
    projects: Vec<Project>,
    refreshed_at: Option<DateTime<Utc>>,
    refreshes: u64,
}

impl Catalog {
    /// Empty catalog for `endpoint`; call [`Catalog::refresh`] before reading.
    pub fn new(endpoint: impl Into<String>, client: Box<dyn PlatformClient>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
            projects: Vec::new(),
            refreshed_at: None,
            refreshes: 0,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Re-list all projects and their components.
    ///
    /// On failure the previous snapshot stays in place and
    /// [`SyncError::CatalogUnavailable`] is returned.
    pub fn refresh(&mut self) -> Result<(), SyncError> {
        let snapshot = self.load_snapshot()?;
        tracing::debug!(
            "catalog {} refreshed: {} projects",
            self.endpoint,
            snapshot.len()
        );
        self.projects = snapshot;
        self.refreshed_at = Some(Utc::now());
        self.refreshes += 1;
        Ok(())
    }

    fn load_snapshot(&self) -> Result<Vec<Project>, SyncError> {
        let mut projects = collect_all(|page| self.client.list_projects(page))
            .map_err(|source| self.unavailable(source))?;
        for project in &mut projects {
            project.components = self.load_components(&project.slug)?;
        }
        Ok(projects)
    }

    fn load_components(&self, slug: &str) -> Result<Vec<Component>, SyncError> {
        collect_all(|page| self.client.list_components(slug, page))
            .map_err(|source| self.unavailable(source))
    }

    fn unavailable(&self, source: PortError) -> SyncError {
        SyncError::CatalogUnavailable {
            endpoint: self.endpoint.clone(),
            source,
        }
    }

    /// Has at least one refresh succeeded?
    pub fn is_loaded(&self) -> bool {
        self.refreshed_at.is_some()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Number of successful refreshes so far.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }

    /// Projects in platform listing order.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn find_project_by_slug(&self, slug: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.slug == slug)
    }

    /// Project carrying `identity`'s canonical name.
    ///
    /// Slugs are lossy (`my.mod` and `my_mod` sanitize alike), so only the
    /// name identifies a repository and branch.
    pub fn find_project(&self, identity: &ProjectIdentity) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == identity.name)
    }

    /// First project whose web URL or name contains `needle`.
    ///
    /// Finds projects created before the current slug derivation existed.
    pub fn find_project_by_url_substring(&self, needle: &str) -> Option<&Project> {
        if needle.is_empty() {
            return None;
        }
        self.projects
            .iter()
            .find(|p| p.web.contains(needle) || p.name.contains(needle))
    }

    /// Components of the project `slug`; empty when unknown.
    pub fn components(&self, slug: &str) -> &[Component] {
        self.find_project_by_slug(slug)
            .map(|p| p.components.as_slice())
            .unwrap_or(&[])
    }

    /// Fetch one project straight from the platform, bypassing the snapshot.
    pub fn fetch_project(&self, slug: &str) -> Result<Option<Project>, SyncError> {
        let Some(mut project) = self
            .client
            .get_project(slug)
            .map_err(|source| self.unavailable(source))?
        else {
            return Ok(None);
        };
        project.components = self.load_components(slug)?;
        Ok(Some(project))
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("endpoint", &self.endpoint)
            .field("projects", &self.projects.len())
            .field("refreshed_at", &self.refreshed_at)
            .finish()
    }
}
