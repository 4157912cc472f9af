use std::env;
use std::path::PathBuf;

use tracing::debug;

use super::CommandError;
use crate::path::PathExpander;

#[derive(Debug, Clone, Default)]
pub struct CdCommand {
    path_expander: PathExpander,
}

impl CdCommand {
    pub fn new() -> Self {
        Self {
            path_expander: PathExpander::new(),
        }
    }

    pub fn with_expander(path_expander: PathExpander) -> Self {
        Self { path_expander }
    }

    /// Changes the shell's working directory; no target means home.
    pub fn execute(&self, target: Option<&str>) -> Result<PathBuf, CommandError> {
        let expanded = self
            .path_expander
            .expand(target.unwrap_or("~"))
            .map_err(|e| CommandError::ExecutionError(e.to_string()))?;

        env::set_current_dir(&expanded).map_err(|e| {
            CommandError::ExecutionError(format!(
                "cannot change directory to {}: {}",
                expanded.display(),
                e
            ))
        })?;
        debug!(cwd = %expanded.display(), "changed directory");
        Ok(expanded)
    }
}
