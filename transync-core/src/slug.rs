//! Project identity derivation.
//!
//! One derivation is supported. Platform projects created by earlier runs are
//! found again only because this function is stable, so any change to the
//! normalization or the sanitized character set is a breaking migration.
//!
//! ```text
//! git@git.example.com:acme/widgets.git + 16.0
//!   normalize → git.example.com/acme/widgets
//!   name      → git.example.com:acme/widgets (16.0)
//!   slug      → git_example_com_acme_widgets_16_0_
//! ```

use serde::Serialize;

use crate::types::INDIRECTION_SCHEME;

/// Canonical identity of the platform project for one (repository, branch).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProjectIdentity {
    /// Human-readable identifier, stored as the project name.
    pub name: String,
    /// Platform slug: `name` with disallowed characters replaced.
    pub slug: String,
}

/// Derive the project identity for `repo_url` at `branch`. Pure and total.
pub fn derive(repo_url: &str, branch: &str) -> ProjectIdentity {
    let normalized = normalize(repo_url);
    let name = match host_and_path(&normalized) {
        Some((host, path)) => format!("{host}:{path} ({branch})"),
        None => format!("{normalized} ({branch})"),
    };
    let slug = sanitize(&name);
    ProjectIdentity { name, slug }
}

/// Strip scheme, user/credential prefix and `.git`, then turn `:` into `/`.
pub fn normalize(repo_url: &str) -> String {
    let rest = strip_scheme(repo_url.trim());
    let rest = match rest.rsplit_once('@') {
        Some((_, after)) => after,
        None => rest,
    };
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    rest.replace(':', "/")
}

/// Host and full repository path, starting at the first run of three
/// consecutive non-empty `/`-separated segments.
///
/// `gitlab.com/group/sub/alpha` keeps every group level, so nested
/// repositories never share an identity.
fn host_and_path(path: &str) -> Option<(&str, String)> {
    let segments: Vec<&str> = path.split('/').collect();
    let start = segments
        .windows(3)
        .position(|w| w.iter().all(|s| !s.is_empty()))?;
    let rest: Vec<&str> = segments[start + 1..]
        .iter()
        .take_while(|s| !s.is_empty())
        .copied()
        .collect();
    Some((segments[start], rest.join("/")))
}

fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}

/// Replace characters the platform rejects in slugs.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != ' ')
        .map(|c| match c {
            '/' | ':' | '.' | '(' | ')' => '_',
            other => other,
        })
        .collect()
}

/// Web URL recorded on a newly created project.
///
/// SSH-style references (`user@host:owner/repo`) become `http://host/owner/repo`;
/// anything with an HTTP(S) scheme or without a user part passes through.
pub fn project_web_url(repo_url: &str) -> String {
    let has_scheme = repo_url.starts_with("http://") || repo_url.starts_with("https://");
    match repo_url.rsplit_once('@') {
        Some((_, host_path)) if !has_scheme => {
            format!("http://{}", host_path.replace(':', "/"))
        }
        _ => repo_url.to_owned(),
    }
}

/// Repository reference handed to the platform's import command.
///
/// Normalized to `git@host:owner/repo` when a host/owner/repo structure is found.
pub fn component_repo_ref(web_url: &str) -> String {
    let rest = strip_scheme(web_url);
    match host_and_path(rest) {
        Some((host, path)) => format!("git@{host}:{path}"),
        None => web_url.to_owned(),
    }
}

/// Comparison key for "same underlying repository".
///
/// `git@host:o/r.git`, `https://host/o/r` and `http://user@HOST/o/r.git` share a key.
pub fn repo_key(reference: &str) -> String {
    normalize(reference).to_lowercase()
}

/// Internal reference to another component's checkout.
pub fn indirection(project_slug: &str, component_slug: &str) -> String {
    format!("{INDIRECTION_SCHEME}{project_slug}/{component_slug}")
}
