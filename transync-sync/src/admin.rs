//! Argument vectors for the platform's administrative commands.
//!
//! Only argv is built here; how it reaches the platform host (local process,
//! `docker exec`, dry run) is the [`CommandExecutor`](crate::ports::CommandExecutor)'s
//! choice. Every command is safe to repeat.

use transync_core::config::PlatformSettings;

pub struct AdminCommands<'a> {
    settings: &'a PlatformSettings,
}

impl<'a> AdminCommands<'a> {
    pub fn new(settings: &'a PlatformSettings) -> Self {
        Self { settings }
    }

    fn manage(&self, args: &[&str]) -> Vec<String> {
        self.settings
            .admin_command
            .iter()
            .cloned()
            .chain(args.iter().map(|a| a.to_string()))
            .collect()
    }

    fn shell(&self, script: &str) -> Vec<String> {
        self.manage(&["shell", "-c", script])
    }

    /// Create the project unless one with `slug` already exists.
    ///
    /// Exits non-zero when the existing project carries a different name:
    /// another repository already owns the slug.
    pub fn create_project(&self, name: &str, slug: &str, web: &str) -> Vec<String> {
        self.shell(&format!(
            "from weblate.trans.models import Project\n\
             project, _ = Project.objects.get_or_create(slug={slug}, defaults={{'name': {name}, 'web': {web}}})\n\
             if project.name != {name}:\n    \
             raise SystemExit('slug collision: ' + {slug} + ' belongs to ' + repr(project.name))",
            slug = py_str(slug),
            name = py_str(name),
            web = py_str(web),
        ))
    }

    /// Import every translation file matching the configured mask as components.
    pub fn import_project(&self, project_slug: &str, repo_ref: &str, branch: &str) -> Vec<String> {
        self.manage(&[
            "import_project",
            project_slug,
            repo_ref,
            branch,
            &self.settings.file_mask,
        ])
    }

    /// Point a component's repository at `target`.
    pub fn rewrite_repo(&self, project_slug: &str, component_slug: &str, target: &str) -> Vec<String> {
        self.update_component(project_slug, component_slug, &format!("repo={}", py_str(target)))
    }

    /// Drop a component's own export so it no longer counts as a checkout owner.
    pub fn clear_export(&self, project_slug: &str, component_slug: &str) -> Vec<String> {
        self.update_component(project_slug, component_slug, "git_export=''")
    }

    fn update_component(&self, project_slug: &str, component_slug: &str, assignment: &str) -> Vec<String> {
        self.shell(&format!(
            "from weblate.trans.models import Component; \
             Component.objects.filter(project__slug={}, slug={}).update({})",
            py_str(project_slug),
            py_str(component_slug),
            assignment,
        ))
    }

    /// Delete the on-disk checkout of one component.
    pub fn remove_checkout(&self, project_slug: &str, component_slug: &str) -> Vec<String> {
        let root = self.settings.checkout_root.trim_end_matches('/');
        vec![
            "rm".to_string(),
            "-rf".to_string(),
            format!("{root}/{project_slug}/{component_slug}"),
        ]
    }

    /// Delete temporary clone directories left behind by interrupted imports.
    pub fn cleanup_temp(&self) -> Vec<String> {
        let s = self.settings;
        vec![
            "find".to_string(),
            s.temp_root.clone(),
            "-maxdepth".to_string(),
            "1".to_string(),
            "-type".to_string(),
            "d".to_string(),
            "-name".to_string(),
            s.temp_pattern.clone(),
            "-mmin".to_string(),
            format!("+{}", s.temp_max_age_minutes),
            "-exec".to_string(),
            "rm".to_string(),
            "-rf".to_string(),
            "{}".to_string(),
            "+".to_string(),
        ]
    }
}

/// Single-quoted Python string literal.
fn py_str(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}
