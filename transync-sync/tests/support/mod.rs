//! In-memory fakes of the registry, platform and command executor.
//!
//! [`FakePlatform`] is shared (`Rc<RefCell<_>>`) between the platform client
//! handed to catalogs and the [`FakeExecutor`], which interprets the admin
//! commands it receives and mutates the platform state the way the real
//! management commands would.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use transync_core::config::PlatformSettings;
use transync_core::{Branch, Component, PlatformEndpoint, Project, Repository};
use transync_sync::{
    CiRegistry, CommandExecutor, Page, PlatformClient, PlatformConnector, PortError, SyncContext,
};

pub const ENDPOINT: &str = "https://weblate.example.com/api";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn repository(id: i64, url: &str) -> Repository {
    Repository {
        id,
        url: url.to_string(),
        platform: PlatformEndpoint::new(ENDPOINT, "token"),
    }
}

pub fn branch(id: i64, name: &str, repo_id: i64) -> Branch {
    Branch {
        id,
        name: name.to_string(),
        repo_id,
        uses_translation: true,
    }
}

/// Component owning its own checkout of `repo`.
pub fn owner(slug: &str, branch: &str, repo: &str) -> Component {
    Component {
        slug: slug.to_string(),
        name: slug.to_string(),
        branch: branch.to_string(),
        repo: repo.to_string(),
        git_export: format!("https://weblate.example.com/git/{slug}/"),
    }
}

pub fn project(slug: &str, name: &str, web: &str, components: Vec<Component>) -> Project {
    Project {
        slug: slug.to_string(),
        name: name.to_string(),
        web: web.to_string(),
        components,
    }
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PlatformState {
    pub projects: Vec<Project>,
    /// Every listing call fails while set.
    pub fail_listing: bool,
    pub project_list_calls: usize,
    pub connects: usize,
}

#[derive(Clone)]
pub struct FakePlatform {
    pub state: Rc<RefCell<PlatformState>>,
    page_size: usize,
}

impl FakePlatform {
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            state: Rc::new(RefCell::new(PlatformState {
                projects,
                ..PlatformState::default()
            })),
            page_size: 2,
        }
    }

    pub fn project(&self, slug: &str) -> Option<Project> {
        self.state
            .borrow()
            .projects
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
    }

    pub fn project_count(&self) -> usize {
        self.state.borrow().projects.len()
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.state.borrow_mut().fail_listing = fail;
    }

    fn page<T: Clone>(&self, all: &[T], page: u32) -> Page<T> {
        let start = (page as usize - 1) * self.page_size;
        let items: Vec<T> = all.iter().skip(start).take(self.page_size).cloned().collect();
        let next = (start + self.page_size < all.len()).then_some(page + 1);
        Page { items, next }
    }

    fn check_listing(&self, what: &str) -> Result<(), PortError> {
        if self.state.borrow().fail_listing {
            return Err(PortError::Status {
                endpoint: format!("{ENDPOINT}/{what}"),
                status: 503,
            });
        }
        Ok(())
    }
}

impl PlatformClient for FakePlatform {
    fn list_projects(&self, page: u32) -> Result<Page<Project>, PortError> {
        self.check_listing("projects/")?;
        self.state.borrow_mut().project_list_calls += 1;
        let bare: Vec<Project> = self
            .state
            .borrow()
            .projects
            .iter()
            .map(|p| Project {
                components: Vec::new(),
                ..p.clone()
            })
            .collect();
        Ok(self.page(&bare, page))
    }

    fn list_components(&self, project_slug: &str, page: u32) -> Result<Page<Component>, PortError> {
        self.check_listing("components/")?;
        let components = self
            .project(project_slug)
            .map(|p| p.components)
            .unwrap_or_default();
        Ok(self.page(&components, page))
    }

    fn get_project(&self, slug: &str) -> Result<Option<Project>, PortError> {
        Ok(self.project(slug).map(|p| Project {
            components: Vec::new(),
            ..p
        }))
    }
}

impl PlatformConnector for FakePlatform {
    fn connect(&self, _endpoint: &PlatformEndpoint) -> Result<Box<dyn PlatformClient>, PortError> {
        self.state.borrow_mut().connects += 1;
        Ok(Box::new(self.clone()))
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

pub struct FakeExecutor {
    platform: FakePlatform,
    /// Argv of every command received, including failed ones.
    pub log: RefCell<Vec<Vec<String>>>,
    /// A command fails when its joined argv contains any of these.
    fail_on: RefCell<Vec<String>>,
    /// Components created per `import_project`, one per translated module.
    pub modules: RefCell<Vec<String>>,
    /// Project creation succeeds but the project never shows up.
    pub swallow_creates: Cell<bool>,
}

impl FakeExecutor {
    pub fn new(platform: &FakePlatform) -> Self {
        Self {
            platform: platform.clone(),
            log: RefCell::new(Vec::new()),
            fail_on: RefCell::new(Vec::new()),
            modules: RefCell::new(vec!["base".to_string()]),
            swallow_creates: Cell::new(false),
        }
    }

    pub fn fail_on(&self, needle: &str) {
        self.fail_on.borrow_mut().push(needle.to_string());
    }

    pub fn set_modules(&self, modules: &[&str]) {
        *self.modules.borrow_mut() = modules.iter().map(|m| m.to_string()).collect();
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.borrow().iter().map(|argv| argv.join(" ")).collect()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.commands().iter().filter(|c| c.contains(needle)).count()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }

    fn apply(&self, argv: &[String]) -> Result<(), String> {
        match argv.get(1).map(String::as_str) {
            Some("shell") => self.apply_script(&argv[3]),
            Some("import_project") => {
                self.apply_import(&argv[2], &argv[3], &argv[4]);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn apply_script(&self, script: &str) -> Result<(), String> {
        let mut state = self.platform.state.borrow_mut();
        if script.contains("Project.objects.get_or_create") {
            if self.swallow_creates.get() {
                return Ok(());
            }
            let slug = quoted_after(script, "get_or_create(slug='").unwrap_or_default();
            let name = quoted_after(script, "'name': '").unwrap_or_default();
            if let Some(existing) = state.projects.iter().find(|p| p.slug == slug) {
                if existing.name != name {
                    return Err(format!(
                        "slug collision: '{slug}' belongs to '{}'",
                        existing.name
                    ));
                }
                return Ok(());
            }
            state.projects.push(project(
                &slug,
                &name,
                &quoted_after(script, "'web': '").unwrap_or_default(),
                Vec::new(),
            ));
        } else if script.contains("Component.objects.filter") {
            let project_slug = quoted_after(script, "project__slug='").unwrap_or_default();
            let component_slug = quoted_after(script, ", slug='").unwrap_or_default();
            let Some(component) = state
                .projects
                .iter_mut()
                .filter(|p| p.slug == project_slug)
                .flat_map(|p| p.components.iter_mut())
                .find(|c| c.slug == component_slug)
            else {
                return Ok(());
            };
            if let Some(repo) = quoted_after(script, ".update(repo='") {
                component.repo = repo;
            }
            if script.contains(".update(git_export='')") {
                component.git_export.clear();
            }
        }
        Ok(())
    }

    fn apply_import(&self, project_slug: &str, repo: &str, branch: &str) {
        let modules = self.modules.borrow().clone();
        let mut state = self.platform.state.borrow_mut();
        let Some(project) = state.projects.iter_mut().find(|p| p.slug == project_slug) else {
            return;
        };
        for module in modules {
            if project.components.iter().any(|c| c.slug == module) {
                continue;
            }
            project.components.push(owner(&module, branch, repo));
        }
    }
}

impl CommandExecutor for FakeExecutor {
    fn run(&self, argv: &[String]) -> Result<String, PortError> {
        self.log.borrow_mut().push(argv.to_vec());
        let joined = argv.join(" ");
        if self.fail_on.borrow().iter().any(|n| joined.contains(n.as_str())) {
            return Err(PortError::Command {
                command: joined,
                status: "exit status: 1".to_string(),
                stderr: "injected failure".to_string(),
            });
        }
        self.apply(argv).map_err(|stderr| PortError::Command {
            command: joined,
            status: "exit status: 1".to_string(),
            stderr,
        })?;
        Ok(String::new())
    }
}

fn quoted_after(script: &str, key: &str) -> Option<String> {
    let start = script.find(key)? + key.len();
    let rest = &script[start..];
    let end = rest.find('\'')?;
    Some(rest[..end].to_string())
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeRegistry {
    pub repos: Vec<(Repository, Vec<Branch>)>,
    pub fail: Cell<bool>,
}

impl FakeRegistry {
    pub fn new(repos: Vec<(Repository, Vec<Branch>)>) -> Self {
        Self {
            repos,
            fail: Cell::new(false),
        }
    }
}

impl CiRegistry for FakeRegistry {
    fn list_repos_with_translation_enabled(&self) -> Result<Vec<Repository>, PortError> {
        if self.fail.get() {
            return Err(PortError::Transport {
                endpoint: "https://runbot.example.com/jsonrpc".to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(self.repos.iter().map(|(r, _)| r.clone()).collect())
    }

    fn list_eligible_branches(&self, repo: &Repository) -> Result<Vec<Branch>, PortError> {
        Ok(self
            .repos
            .iter()
            .find(|(r, _)| r.id == repo.id)
            .map(|(_, b)| b.clone())
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Everything a test needs to build a [`SyncContext`].
pub struct Harness {
    pub registry: FakeRegistry,
    pub platform: FakePlatform,
    pub executor: FakeExecutor,
    pub settings: PlatformSettings,
}

impl Harness {
    pub fn new(repos: Vec<(Repository, Vec<Branch>)>, projects: Vec<Project>) -> Self {
        init_logging();
        let platform = FakePlatform::new(projects);
        let executor = FakeExecutor::new(&platform);
        Self {
            registry: FakeRegistry::new(repos),
            platform,
            executor,
            settings: PlatformSettings::default(),
        }
    }

    pub fn ctx(&self) -> SyncContext<'_> {
        SyncContext::new(
            &self.registry,
            &self.platform,
            &self.executor,
            &self.settings,
        )
    }

    /// Loaded catalog over the fake platform.
    pub fn catalog(&self) -> transync_sync::Catalog {
        let mut catalog = transync_sync::Catalog::new(ENDPOINT, Box::new(self.platform.clone()));
        catalog.refresh().expect("initial refresh");
        catalog
    }
}
