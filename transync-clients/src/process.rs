//! Runs administrative commands as child processes.
//!
//! With a container configured, every argv is wrapped in
//! `docker exec <container> ...` so the platform's management commands run
//! where the platform lives.

use std::process::Command;

use transync_sync::{CommandExecutor, PortError};

#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    container: Option<String>,
}

impl ProcessExecutor {
    pub fn new(container: Option<String>) -> Self {
        Self { container }
    }

    /// Full argv actually spawned for `argv`.
    pub fn wrap(&self, argv: &[String]) -> Vec<String> {
        match &self.container {
            Some(container) => {
                let mut full = vec!["docker".to_string(), "exec".to_string(), container.clone()];
                full.extend_from_slice(argv);
                full
            }
            None => argv.to_vec(),
        }
    }
}

impl CommandExecutor for ProcessExecutor {
    fn run(&self, argv: &[String]) -> Result<String, PortError> {
        let full = self.wrap(argv);
        let command = full.join(" ");
        let Some((program, args)) = full.split_first() else {
            return Err(PortError::Command {
                command,
                status: "not started".to_string(),
                stderr: "empty command".to_string(),
            });
        };

        tracing::debug!("running: {command}");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| PortError::Command {
                command: command.clone(),
                status: "not started".to_string(),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(PortError::Command {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
