//! `transync catalog`: inspect a platform endpoint's projects.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use transync_clients::WeblateConnector;
use transync_core::{PlatformEndpoint, Project};
use transync_sync::{repair, Catalog, PlatformConnector};

/// Arguments for `transync catalog`.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Platform API base URL, e.g. https://weblate.example.com/api.
    #[arg(long)]
    pub url: String,

    /// Platform API token.
    #[arg(long, env = "TRANSYNC_PLATFORM_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Show only the first project whose web URL or name contains this text.
    #[arg(long = "match", value_name = "NEEDLE")]
    pub needle: Option<String>,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "slug")]
    slug: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "components")]
    components: usize,
    #[tabled(rename = "checkouts")]
    checkouts: usize,
    #[tabled(rename = "duplicates")]
    duplicates: String,
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        let duplicates: usize = repair::find_duplicates(project)
            .iter()
            .map(|g| g.duplicates.len())
            .sum();
        Self {
            slug: project.slug.clone(),
            name: project.name.clone(),
            components: project.components.len(),
            checkouts: project
                .components
                .iter()
                .filter(|c| c.owns_checkout())
                .count(),
            duplicates: if duplicates == 0 {
                "-".to_string()
            } else {
                duplicates.to_string().yellow().to_string()
            },
        }
    }
}

impl CatalogArgs {
    pub fn run(self) -> Result<()> {
        let endpoint = PlatformEndpoint::new(self.url.clone(), self.token.clone());
        let connector = WeblateConnector::new(
            concat!("transync/", env!("CARGO_PKG_VERSION")),
            Duration::from_secs(self.timeout),
        );
        let client = connector
            .connect(&endpoint)
            .with_context(|| format!("cannot connect to '{}'", self.url))?;

        let mut catalog = Catalog::new(self.url.clone(), client);
        catalog.refresh().context("failed to load the platform catalog")?;

        let projects: Vec<&Project> = match self.needle.as_deref() {
            Some(needle) => catalog.find_project_by_url_substring(needle).into_iter().collect(),
            None => catalog.projects().iter().collect(),
        };

        if projects.is_empty() {
            println!("No matching projects at {}.", catalog.endpoint());
            return Ok(());
        }

        let mut table = Table::new(projects.into_iter().map(ProjectRow::from));
        table.with(Style::rounded());
        println!("{table}");
        let refreshed = catalog
            .refreshed_at()
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_default();
        println!(
            "{} projects at {} (loaded {refreshed})",
            catalog.projects().len(),
            catalog.endpoint().bold()
        );
        Ok(())
    }
}
