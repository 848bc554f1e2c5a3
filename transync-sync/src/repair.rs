//! Duplicate-repo repair.
//!
//! Within one project, components that own a checkout of the same underlying
//! repository are grouped. The member with the smallest slug stays the owner
//! (the primary); every other member is
//!
//! 1. re-pointed at `weblate://<project>/<primary>`,
//! 2. stripped of its own export,
//! 3. relieved of its on-disk checkout.
//!
//! Steps run independently and failures are only logged, so one broken
//! component never blocks the next. A project without duplicate groups issues
//! no commands at all.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use transync_core::{slug, Project};

use crate::catalog::Catalog;
use crate::context::SyncContext;
use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStep {
    RewriteRepo,
    ClearExport,
    RemoveCheckout,
}

impl fmt::Display for RepairStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairStep::RewriteRepo => write!(f, "rewrite-repo"),
            RepairStep::ClearExport => write!(f, "clear-export"),
            RepairStep::RemoveCheckout => write!(f, "remove-checkout"),
        }
    }
}

/// Checkout owners of one repository inside a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Component slug that keeps its checkout.
    pub primary: String,
    /// Component slugs to redirect, sorted.
    pub duplicates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedStep {
    pub component: String,
    pub step: RepairStep,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    /// Components now indirecting to their primary.
    pub redirected: Vec<String>,
    pub failed_steps: Vec<FailedStep>,
}

impl RepairSummary {
    pub fn is_noop(&self) -> bool {
        self.redirected.is_empty() && self.failed_steps.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Repaired {
    pub project: Project,
    pub summary: RepairSummary,
}

/// Groups of two or more checkout owners sharing a repository.
pub fn find_duplicates(project: &Project) -> Vec<DuplicateGroup> {
    let mut owners: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for component in project.components.iter().filter(|c| c.owns_checkout()) {
        owners
            .entry(slug::repo_key(&component.repo))
            .or_default()
            .push(&component.slug);
    }

    owners
        .into_values()
        .filter(|slugs| slugs.len() > 1)
        .map(|mut slugs| {
            slugs.sort_unstable();
            DuplicateGroup {
                primary: slugs[0].to_string(),
                duplicates: slugs[1..].iter().map(|s| s.to_string()).collect(),
            }
        })
        .collect()
}

/// Restore the single-checkout-owner invariant for `project`.
///
/// Returns the project as the platform reports it after the repair, or the
/// locally patched copy when the follow-up refresh fails or in dry-run mode.
pub fn repair(ctx: &SyncContext<'_>, catalog: &mut Catalog, mut project: Project) -> Repaired {
    let groups = find_duplicates(&project);
    let mut summary = RepairSummary::default();
    if groups.is_empty() {
        return Repaired { project, summary };
    }

    let admin = ctx.admin();
    for group in &groups {
        let target = slug::indirection(&project.slug, &group.primary);
        for component in &group.duplicates {
            tracing::info!(
                "project '{}': redirecting component '{}' to {}",
                project.slug,
                component,
                target
            );
            let steps = [
                (
                    RepairStep::RewriteRepo,
                    admin.rewrite_repo(&project.slug, component, &target),
                ),
                (
                    RepairStep::ClearExport,
                    admin.clear_export(&project.slug, component),
                ),
                (
                    RepairStep::RemoveCheckout,
                    admin.remove_checkout(&project.slug, component),
                ),
            ];

            let mut redirected = true;
            for (step, argv) in steps {
                match ctx.executor.run(&argv) {
                    Ok(_) => apply_locally(&mut project, component, step, &target),
                    Err(source) => {
                        let err = SyncError::RepairStepFailed {
                            project: project.slug.clone(),
                            component: component.clone(),
                            step,
                            source,
                        };
                        tracing::warn!("{err}");
                        if step != RepairStep::RemoveCheckout {
                            redirected = false;
                        }
                        summary.failed_steps.push(FailedStep {
                            component: component.clone(),
                            step,
                            message: err.to_string(),
                        });
                    }
                }
            }
            if redirected {
                summary.redirected.push(component.clone());
            }
        }
    }

    if ctx.dry_run {
        return Repaired { project, summary };
    }

    match catalog.refresh() {
        Ok(()) => {
            if let Some(fresh) = catalog.find_project_by_slug(&project.slug) {
                project = fresh.clone();
            }
        }
        Err(err) => tracing::warn!(
            "project '{}': refresh after repair failed, using local state: {err}",
            project.slug
        ),
    }
    Repaired { project, summary }
}

fn apply_locally(project: &mut Project, component: &str, step: RepairStep, target: &str) {
    let Some(c) = project.components.iter_mut().find(|c| c.slug == component) else {
        return;
    };
    match step {
        RepairStep::RewriteRepo => c.repo = target.to_string(),
        RepairStep::ClearExport => c.git_export.clear(),
        RepairStep::RemoveCheckout => {}
    }
}

#[cfg(test)]
mod tests {
    use transync_core::Component;

    use super::*;

    fn owner(slug: &str, repo: &str) -> Component {
        Component {
            slug: slug.into(),
            name: slug.into(),
            branch: "16.0".into(),
            repo: repo.into(),
            git_export: format!("https://w/git/p/{slug}/"),
        }
    }

    fn project(components: Vec<Component>) -> Project {
        Project {
            slug: "p".into(),
            name: "P".into(),
            web: String::new(),
            components,
        }
    }

    #[test]
    fn primary_is_smallest_slug_not_list_order() {
        let p = project(vec![
            owner("sale", "git@h:o/r.git"),
            owner("account", "https://h/o/r"),
            owner("stock", "git@h:o/r.git"),
        ]);
        assert_eq!(
            find_duplicates(&p),
            vec![DuplicateGroup {
                primary: "account".into(),
                duplicates: vec!["sale".into(), "stock".into()],
            }]
        );
    }

    #[test]
    fn different_repositories_are_separate_groups() {
        let p = project(vec![
            owner("a", "git@h:o/one.git"),
            owner("b", "git@h:o/two.git"),
        ]);
        assert!(find_duplicates(&p).is_empty());
    }

    #[test]
    fn indirect_and_exportless_components_are_ignored() {
        let mut indirect = owner("b", "weblate://p/a");
        indirect.git_export = "https://w/git/p/b/".into();
        let mut plain = owner("c", "git@h:o/r.git");
        plain.git_export.clear();
        let p = project(vec![owner("a", "git@h:o/r.git"), indirect, plain]);
        assert!(find_duplicates(&p).is_empty());
    }

    #[test]
    fn step_names() {
        assert_eq!(RepairStep::RemoveCheckout.to_string(), "remove-checkout");
    }
}
