//! Find-or-create of the platform project for a (repository, branch).
//!
//! Every project handed back, found or freshly created, has been through
//! [`repair::repair`], so callers always see a consistent component set.

use transync_core::{slug, Branch, Project, ProjectIdentity, Repository};

use crate::catalog::Catalog;
use crate::context::SyncContext;
use crate::error::SyncError;
use crate::repair::{self, RepairSummary};

#[derive(Debug, Clone)]
pub struct Reconciled {
    pub project: Project,
    /// This call created the project.
    pub created: bool,
    pub repair: RepairSummary,
}

/// Find the project for `repo` at `branch`, creating it when missing.
pub fn reconcile(
    ctx: &SyncContext<'_>,
    catalog: &mut Catalog,
    repo: &Repository,
    branch: &Branch,
) -> Result<Reconciled, SyncError> {
    let identity = slug::derive(&repo.url, &branch.name);

    let (project, created) = match catalog.find_project(&identity) {
        Some(found) => {
            tracing::debug!("{} @ {}: found project '{}'", repo, branch, found.slug);
            (found.clone(), false)
        }
        None => {
            if let Some(other) = catalog.find_project_by_slug(&identity.slug) {
                return Err(slug_collision(repo, branch, identity.clone(), &other.name));
            }
            create_project(ctx, catalog, repo, branch, &identity)?
        }
    };

    let repaired = repair::repair(ctx, catalog, project);
    Ok(Reconciled {
        project: repaired.project,
        created,
        repair: repaired.summary,
    })
}

/// Returns the project and whether it was created by this call.
fn create_project(
    ctx: &SyncContext<'_>,
    catalog: &mut Catalog,
    repo: &Repository,
    branch: &Branch,
    identity: &ProjectIdentity,
) -> Result<(Project, bool), SyncError> {
    let web = slug::project_web_url(&repo.url);
    let argv = ctx.admin().create_project(&identity.name, &identity.slug, &web);
    tracing::info!(
        "{} @ {}: creating project '{}' ({})",
        repo,
        branch,
        identity.slug,
        identity.name
    );

    let failed = |reason: String| SyncError::ProjectCreationFailed {
        repository: repo.url.clone(),
        branch: branch.name.clone(),
        project: identity.slug.clone(),
        reason,
    };

    if let Err(source) = ctx.executor.run(&argv) {
        // A stale snapshot may have hidden a project that already exists.
        catalog.refresh()?;
        if let Some(existing) = catalog.find_project(identity) {
            tracing::warn!(
                "{} @ {}: create failed ({source}) but project '{}' exists; using it",
                repo,
                branch,
                existing.slug
            );
            return Ok((existing.clone(), false));
        }
        let err = failed(source.to_string());
        tracing::error!("{err}");
        return Err(err);
    }

    if ctx.dry_run {
        return Ok((
            Project {
                slug: identity.slug.clone(),
                name: identity.name.clone(),
                web,
                components: Vec::new(),
            },
            true,
        ));
    }

    catalog.refresh()?;
    if let Some(project) = catalog.find_project(identity) {
        return Ok((project.clone(), true));
    }
    if let Some(other) = catalog.find_project_by_slug(&identity.slug) {
        return Err(slug_collision(repo, branch, identity.clone(), &other.name));
    }
    match catalog.fetch_project(&identity.slug)? {
        Some(project) if project.name == identity.name => Ok((project, true)),
        Some(other) => Err(slug_collision(repo, branch, identity.clone(), &other.name)),
        None => {
            let err = failed("project not visible on the platform after creation".to_string());
            tracing::error!("{err}");
            Err(err)
        }
    }
}

/// Another repository already owns the slug `identity` sanitizes to.
fn slug_collision(
    repo: &Repository,
    branch: &Branch,
    identity: ProjectIdentity,
    existing_name: &str,
) -> SyncError {
    let err = SyncError::ProjectCreationFailed {
        repository: repo.url.clone(),
        branch: branch.name.clone(),
        project: identity.slug,
        reason: format!(
            "slug collision: the slug belongs to '{existing_name}', not '{}'",
            identity.name
        ),
    };
    tracing::error!("{err}");
    err
}
