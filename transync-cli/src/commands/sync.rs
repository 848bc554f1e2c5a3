//! `transync sync`: one reconciliation pass.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use transync_clients::{ProcessExecutor, RunbotClient, WeblateConnector};
use transync_core::config::{self, Config};
use transync_sync::{
    pipeline::{self, CleanupStatus},
    provision::Provisioned,
    BranchOutcome, CommandExecutor, DryRunExecutor, RunReport, SyncContext,
};

/// Arguments for `transync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Configuration file (default: ~/.transync/config.yaml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log the administrative commands instead of running them.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = self.load_config()?;
        let timeout = Duration::from_secs(config.platform.timeout_secs);

        let registry = RunbotClient::new(&config.registry, timeout);
        let connector = WeblateConnector::new(config.platform.user_agent.clone(), timeout);
        let process = ProcessExecutor::new(config.executor.container.clone());
        let executor: &dyn CommandExecutor = if self.dry_run {
            &DryRunExecutor
        } else {
            &process
        };

        let ctx = SyncContext::new(&registry, &connector, executor, &config.platform)
            .dry_run(self.dry_run);
        let report = pipeline::run(&ctx).context("sync pass aborted")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize run report")?
            );
        } else {
            print_report(&report);
        }
        Ok(())
    }

    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => config::load_from(path)
                .with_context(|| format!("failed to load '{}'", path.display()))?,
            None => config::load().context(
                "failed to load ~/.transync/config.yaml (run `transync init` to create it)",
            )?,
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "result")]
    result: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn print_report(report: &RunReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    let elapsed = (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0;

    let mut rows = Vec::new();
    for repo in &report.repositories {
        if let Some(reason) = &repo.skipped {
            rows.push(OutcomeRow {
                repository: repo.repository.clone(),
                branch: "-".to_string(),
                result: "skipped".yellow().to_string(),
                detail: reason.clone(),
            });
        }
        for branch in &repo.branches {
            let (result, detail) = match &branch.outcome {
                BranchOutcome::Synced {
                    project,
                    project_created,
                    component,
                    repair,
                } => {
                    let mut notes = vec![project.clone()];
                    if *project_created {
                        notes.push("project created".to_string());
                    }
                    if *component == Provisioned::Created {
                        notes.push("component imported".to_string());
                    }
                    if !repair.redirected.is_empty() {
                        notes.push(format!("{} redirected", repair.redirected.len()));
                    }
                    if !repair.failed_steps.is_empty() {
                        notes.push(format!("{} repair steps failed", repair.failed_steps.len()));
                    }
                    ("synced".green().to_string(), notes.join(", "))
                }
                BranchOutcome::Failed { message, .. } => {
                    ("failed".red().to_string(), message.clone())
                }
            };
            rows.push(OutcomeRow {
                repository: repo.repository.clone(),
                branch: branch.branch.clone(),
                result,
                detail,
            });
        }
    }

    if rows.is_empty() {
        println!("{prefix}No repositories have translation sync enabled.");
    } else {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    println!(
        "{prefix}{} synced, {} failed | {} projects created, {} components imported, {} redirected | {elapsed:.1}s",
        report.synced(),
        report.failed(),
        report.projects_created(),
        report.components_created(),
        report.components_redirected(),
    );
    if let CleanupStatus::Failed { message } = &report.cleanup {
        println!("{} temp cleanup failed: {message}", "warning:".yellow().bold());
    }
}
