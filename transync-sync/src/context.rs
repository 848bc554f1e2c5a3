//! Explicit run context handed to every engine step.
//!
//! Constructed once per pass, borrowed by all steps, dropped at the end.

use transync_core::config::PlatformSettings;

use crate::admin::AdminCommands;
use crate::ports::{CiRegistry, CommandExecutor, PlatformConnector};

pub struct SyncContext<'a> {
    pub registry: &'a dyn CiRegistry,
    pub connector: &'a dyn PlatformConnector,
    pub executor: &'a dyn CommandExecutor,
    pub settings: &'a PlatformSettings,
    /// Mutations are logged, not verified against the platform.
    pub dry_run: bool,
}

impl<'a> SyncContext<'a> {
    pub fn new(
        registry: &'a dyn CiRegistry,
        connector: &'a dyn PlatformConnector,
        executor: &'a dyn CommandExecutor,
        settings: &'a PlatformSettings,
    ) -> Self {
        Self {
            registry,
            connector,
            executor,
            settings,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn admin(&self) -> AdminCommands<'a> {
        AdminCommands::new(self.settings)
    }
}
