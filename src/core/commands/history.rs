use std::io::Write;

use super::CommandError;
use crate::input::HistoryLog;

pub const EMPTY_HISTORY: &str = "No history yet.";

#[derive(Debug, Clone)]
pub struct HistoryCommand {
    log: HistoryLog,
}

impl HistoryCommand {
    pub fn new(log: HistoryLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &HistoryLog {
        &self.log
    }

    /// Writes the log verbatim, or a notice when nothing was recorded yet.
    pub fn show(&self, out: &mut impl Write) -> Result<(), CommandError> {
        match self.log.read_all()? {
            Some(bytes) => out.write_all(&bytes)?,
            None => writeln!(out, "{}", EMPTY_HISTORY)?,
        }
        Ok(())
    }
}
