//! `transync slug <repo_url> <branch>`

use anyhow::Result;
use clap::Args;

use transync_core::slug;

/// Show the project identity derived for a repository and branch.
#[derive(Args, Debug)]
pub struct SlugArgs {
    /// Repository clone URL, SSH or HTTP(S).
    pub repo_url: String,

    /// Branch name.
    pub branch: String,
}

impl SlugArgs {
    pub fn run(self) -> Result<()> {
        let identity = slug::derive(&self.repo_url, &self.branch);
        let web = slug::project_web_url(&self.repo_url);

        println!("name:     {}", identity.name);
        println!("slug:     {}", identity.slug);
        println!("web:      {web}");
        println!("repo ref: {}", slug::component_repo_ref(&web));
        Ok(())
    }
}
