use std::io;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::core::commands::Outcome;
use crate::error::ShellError;

pub(crate) trait CommandHandler {
    fn execute_command(&mut self, line: &str) -> Result<Outcome, ShellError>;
}

impl CommandHandler for super::Shell {
    fn execute_command(&mut self, line: &str) -> Result<Outcome, ShellError> {
        if line.is_empty() {
            return Ok(Outcome::Continue);
        }

        let result = self.executor.dispatch(line);

        // `cd` may have moved us, and a failed command must not leave a stale prompt.
        self.current_dir = prompt_dir(std::env::current_dir(), &self.current_dir);

        let outcome = result?;
        debug!(?outcome, "line handled");
        Ok(outcome)
    }
}

/// The directory shown in the prompt; keeps `previous` when the cwd is gone.
fn prompt_dir(cwd: io::Result<PathBuf>, previous: &str) -> String {
    match cwd {
        Ok(dir) => dir.to_string_lossy().to_string(),
        Err(e) => {
            warn!(error = %e, "cannot read working directory");
            previous.to_string()
        }
    }
}
