use std::io::{self, Read};
use std::process::{Command, Stdio};

use tracing::debug;

/// Produces the bytes served at `/tasks`.
pub trait TaskSource: Send + Sync {
    /// Runs the query once and returns at most `limit` bytes of its output.
    fn capture(&self, limit: usize) -> io::Result<Vec<u8>>;
}

/// Runs an external query and captures its standard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTaskSource {
    program: String,
    args: Vec<String>,
}

impl Default for CommandTaskSource {
    fn default() -> Self {
        Self::new("crontab", vec!["-l".to_string()])
    }
}

impl CommandTaskSource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Builds a source from a whitespace-split query, or `None` when empty.
    pub fn from_query(query: &[String]) -> Option<Self> {
        let (program, args) = query.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl TaskSource for CommandTaskSource {
    fn capture(&self, limit: usize) -> io::Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let mut buf = Vec::with_capacity(limit);
        let read = match child.stdout.take() {
            Some(stdout) => stdout.take(limit as u64).read_to_end(&mut buf),
            None => Ok(0),
        };
        // stdout is closed by now, so a query with more to say gets EPIPE instead of blocking.
        let status = child.wait()?;
        read?;

        debug!(program = %self.program, %status, bytes = buf.len(), "task query finished");
        Ok(buf)
    }
}
