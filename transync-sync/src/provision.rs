//! Component provisioning: one import per (project, branch).

use serde::Serialize;

use transync_core::{slug, Branch, Project, Repository};

use crate::catalog::Catalog;
use crate::context::SyncContext;
use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provisioned {
    /// A component for the branch was already there.
    Existing,
    /// The import command succeeded.
    Created,
}

/// Make sure `project` has a component tracking `branch` of `repo`.
///
/// The import source is the project's web URL, or `repo`'s URL when the
/// project has none. A failed import is [`SyncError::ComponentCreationFailed`]; a failed
/// refresh afterwards is [`SyncError::CatalogUnavailable`].
pub fn ensure(
    ctx: &SyncContext<'_>,
    catalog: &mut Catalog,
    project: &Project,
    repo: &Repository,
    branch: &Branch,
) -> Result<Provisioned, SyncError> {
    if let Some(existing) = project.component_for_branch(&branch.name) {
        tracing::debug!(
            "project '{}': branch {} already has component '{}'",
            project.slug,
            branch.name,
            existing.slug
        );
        return Ok(Provisioned::Existing);
    }

    let web = if project.web.trim().is_empty() {
        slug::project_web_url(&repo.url)
    } else {
        project.web.clone()
    };
    let repo_ref = slug::component_repo_ref(&web);
    let argv = ctx.admin().import_project(&project.slug, &repo_ref, &branch.name);
    match ctx.executor.run(&argv) {
        Ok(output) => {
            tracing::info!(
                "project '{}': imported branch {} from {}",
                project.slug,
                branch.name,
                repo_ref
            );
            if !output.trim().is_empty() {
                tracing::debug!("{}", output.trim());
            }
        }
        Err(source) => {
            let err = SyncError::ComponentCreationFailed {
                project: project.slug.clone(),
                branch: branch.name.clone(),
                source,
            };
            tracing::error!("{err}");
            return Err(err);
        }
    }

    if !ctx.dry_run {
        catalog.refresh()?;
    }
    Ok(Provisioned::Created)
}
