//! One sync pass: registry → reconcile/repair → provision → cleanup.
//!
//! ```text
//! Start ─▶ for repo ─▶ for branch ─▶ reconcile (+repair) ─▶ ensure ─┐
//!            ▲            ▲                                         │
//!            │            └──────────── next branch ◀───────────────┘
//!            └─ next repo
//! Done ─▶ cleanup (always, also after a fatal error)
//! ```
//!
//! Each (repository, branch) is independent. Non-fatal failures are recorded
//! in the [`RunReport`] and the pass moves on; fatal ones stop it.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use transync_core::{Branch, PlatformEndpoint, Repository};

use crate::catalog::Catalog;
use crate::context::SyncContext;
use crate::error::{FailureKind, SyncError};
use crate::provision::{self, Provisioned};
use crate::reconcile;
use crate::repair::RepairSummary;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BranchOutcome {
    Synced {
        project: String,
        project_created: bool,
        component: Provisioned,
        repair: RepairSummary,
    },
    Failed {
        kind: FailureKind,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchReport {
    pub branch: String,
    pub outcome: BranchOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryReport {
    pub repository: String,
    /// Set when the repository was skipped as a whole.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    pub branches: Vec<BranchReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanupStatus {
    Done,
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub repositories: Vec<RepositoryReport>,
    pub cleanup: CleanupStatus,
}

impl RunReport {
    fn outcomes(&self) -> impl Iterator<Item = &BranchOutcome> {
        self.repositories
            .iter()
            .flat_map(|r| r.branches.iter().map(|b| &b.outcome))
    }

    pub fn synced(&self) -> usize {
        self.outcomes()
            .filter(|o| matches!(o, BranchOutcome::Synced { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes()
            .filter(|o| matches!(o, BranchOutcome::Failed { .. }))
            .count()
    }

    pub fn projects_created(&self) -> usize {
        self.outcomes()
            .filter(|o| matches!(o, BranchOutcome::Synced { project_created: true, .. }))
            .count()
    }

    pub fn components_created(&self) -> usize {
        self.outcomes()
            .filter(|o| {
                matches!(
                    o,
                    BranchOutcome::Synced {
                        component: Provisioned::Created,
                        ..
                    }
                )
            })
            .count()
    }

    pub fn components_redirected(&self) -> usize {
        self.outcomes()
            .map(|o| match o {
                BranchOutcome::Synced { repair, .. } => repair.redirected.len(),
                BranchOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run one pass. Cleanup runs whatever happened before it.
pub fn run(ctx: &SyncContext<'_>) -> Result<RunReport, SyncError> {
    let started_at = Utc::now();
    let mut catalogs = BTreeMap::new();
    let mut repositories = Vec::new();

    let pass = sync_all(ctx, &mut catalogs, &mut repositories);
    if let Err(err) = &pass {
        tracing::error!("sync pass aborted: {err}");
    }
    let cleanup = cleanup(ctx);
    pass?;

    let report = RunReport {
        started_at,
        finished_at: Utc::now(),
        dry_run: ctx.dry_run,
        repositories,
        cleanup,
    };
    tracing::info!(
        "sync pass finished: {} branches synced, {} failed",
        report.synced(),
        report.failed()
    );
    Ok(report)
}

fn sync_all(
    ctx: &SyncContext<'_>,
    catalogs: &mut BTreeMap<String, Catalog>,
    reports: &mut Vec<RepositoryReport>,
) -> Result<(), SyncError> {
    let repos = ctx
        .registry
        .list_repos_with_translation_enabled()
        .map_err(|source| SyncError::RegistryUnavailable { source })?;
    tracing::info!("{} repositories with translation enabled", repos.len());

    for repo in &repos {
        let branches: Vec<Branch> = ctx
            .registry
            .list_eligible_branches(repo)
            .map_err(|source| SyncError::RegistryUnavailable { source })?
            .into_iter()
            .filter(|b| b.uses_translation)
            .collect();

        let mut report = RepositoryReport {
            repository: repo.url.clone(),
            skipped: None,
            branches: Vec::new(),
        };
        if branches.is_empty() {
            tracing::warn!("{repo}: no eligible branches, skipping");
            report.skipped = Some("no eligible branches".to_string());
            reports.push(report);
            continue;
        }

        let catalog = catalog_for(ctx, catalogs, &repo.platform)?;
        for branch in &branches {
            let outcome = match sync_branch(ctx, catalog, repo, branch) {
                Ok(outcome) => outcome,
                Err(err) if err.is_fatal() => {
                    reports.push(report);
                    return Err(err);
                }
                Err(err) => BranchOutcome::Failed {
                    kind: err.kind(),
                    message: err.to_string(),
                },
            };
            report.branches.push(BranchReport {
                branch: branch.name.clone(),
                outcome,
            });
        }
        reports.push(report);
    }
    Ok(())
}

fn sync_branch(
    ctx: &SyncContext<'_>,
    catalog: &mut Catalog,
    repo: &Repository,
    branch: &Branch,
) -> Result<BranchOutcome, SyncError> {
    let reconciled = reconcile::reconcile(ctx, catalog, repo, branch)?;
    let component = provision::ensure(ctx, catalog, &reconciled.project, repo, branch)?;
    Ok(BranchOutcome::Synced {
        project: reconciled.project.slug,
        project_created: reconciled.created,
        component,
        repair: reconciled.repair,
    })
}

/// Catalog for `endpoint`, connected and loaded on first use in this pass.
fn catalog_for<'m>(
    ctx: &SyncContext<'_>,
    catalogs: &'m mut BTreeMap<String, Catalog>,
    endpoint: &PlatformEndpoint,
) -> Result<&'m mut Catalog, SyncError> {
    match catalogs.entry(endpoint.url.clone()) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            let client =
                ctx.connector
                    .connect(endpoint)
                    .map_err(|source| SyncError::CatalogUnavailable {
                        endpoint: endpoint.url.clone(),
                        source,
                    })?;
            let mut catalog = Catalog::new(endpoint.url.clone(), client);
            catalog.refresh()?;
            tracing::info!(
                "catalog {}: {} projects",
                endpoint.url,
                catalog.projects().len()
            );
            Ok(entry.insert(catalog))
        }
    }
}

fn cleanup(ctx: &SyncContext<'_>) -> CleanupStatus {
    let argv = ctx.admin().cleanup_temp();
    match ctx.executor.run(&argv) {
        Ok(_) => CleanupStatus::Done,
        Err(err) => {
            tracing::warn!("temporary checkout cleanup failed: {err}");
            CleanupStatus::Failed {
                message: err.to_string(),
            }
        }
    }
}
