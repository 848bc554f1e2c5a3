//! YAML configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.transync/
//!   config.yaml   (mode 0600, holds the registry password)
//! ```
//!
//! Every function that touches the default location has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable that overrides `registry.password`.
pub const PASSWORD_ENV: &str = "TRANSYNC_REGISTRY_PASSWORD";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Root of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub registry: RegistrySettings,
    #[serde(default)]
    pub platform: PlatformSettings,
    #[serde(default)]
    pub executor: ExecutorSettings,
}

/// CI registry (Odoo runbot) connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySettings {
    pub url: String,
    pub db: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Translation platform host layout and administrative command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    /// Management entry point, e.g. `["django-admin"]` or `["weblate"]`.
    pub admin_command: Vec<String>,
    /// Directory holding per-component checkouts: `<root>/<project>/<component>`.
    pub checkout_root: String,
    pub temp_root: String,
    pub temp_pattern: String,
    pub temp_max_age_minutes: u32,
    /// Files picked up by `import_project`.
    pub file_mask: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            admin_command: vec!["django-admin".to_string()],
            checkout_root: "/app/data/vcs".to_string(),
            temp_root: "/tmp".to_string(),
            temp_pattern: "tmp*".to_string(),
            temp_max_age_minutes: 60,
            file_mask: "**/i18n/*.po".to_string(),
            user_agent: "transync".to_string(),
            timeout_secs: 30,
        }
    }
}

/// How administrative commands reach the platform host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExecutorSettings {
    /// Run commands through `docker exec <container>` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

impl Config {
    /// Starting point written by `transync init`.
    pub fn template() -> Self {
        Self {
            registry: RegistrySettings {
                url: "https://runbot.example.com".to_string(),
                db: "runbot".to_string(),
                username: "admin".to_string(),
                password: String::new(),
            },
            platform: PlatformSettings::default(),
            executor: ExecutorSettings {
                container: Some("weblate".to_string()),
            },
        }
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(password) = lookup(PASSWORD_ENV) {
            self.registry.password = password;
        }
    }

    /// Reject values no sync pass can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("registry.url", &self.registry.url),
            ("registry.db", &self.registry.db),
            ("registry.username", &self.registry.username),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{key} must not be empty")));
            }
        }
        if self.platform.admin_command.is_empty() {
            return Err(ConfigError::Invalid(
                "platform.admin_command must name at least one program".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.transync/config.yaml`, pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".transync").join("config.yaml")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load and validate the config at `path`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with path
/// and line context) if malformed.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let config: Config = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load `<home>/.transync/config.yaml`.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    load_from(&config_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

/// Atomically save `config` to `<home>/.transync/config.yaml`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path_at(home);
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            set_dir_permissions(dir)?;
        }
    }
    let tmp_path = path.with_file_name("config.yaml.tmp");
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(path)
}

/// `save_at` convenience wrapper.
pub fn save(config: &Config) -> Result<PathBuf, ConfigError> {
    save_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_is_valid() {
        Config::template().validate().expect("template validates");
    }

    #[test]
    fn env_overrides_password() {
        let mut config = Config::template();
        config.apply_env(|key| (key == PASSWORD_ENV).then(|| "from-env".to_string()));
        assert_eq!(config.registry.password, "from-env");
    }

    #[test]
    fn missing_env_keeps_password() {
        let mut config = Config::template();
        config.registry.password = "file".to_string();
        config.apply_env(|_| None);
        assert_eq!(config.registry.password, "file");
    }

    #[test]
    fn empty_admin_command_is_rejected() {
        let mut config = Config::template();
        config.platform.admin_command.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("admin_command"));
    }

    #[test]
    fn save_creates_private_directory() {
        let home = tempfile::TempDir::new().expect("tempdir");
        let path = save_at(home.path(), &Config::template()).expect("save");
        assert_eq!(path, config_path_at(home.path()));
        assert!(path.exists());
        assert!(!path.with_file_name("config.yaml.tmp").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let dir = path.parent().expect("parent");
            let mode = std::fs::metadata(dir).expect("metadata").permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }
    }
}
