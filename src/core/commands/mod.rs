use std::fmt;
use std::io::{self, Write};

mod bootcheck;
mod builtin;
mod cd;
mod history;
mod snapshot;

pub use bootcheck::{BootCheckCommand, BootReport, BootStatus};
pub use builtin::{Builtin, CommandKind, FAREWELL};
pub use cd::CdCommand;
pub use history::HistoryCommand;
pub use snapshot::SnapshotCommand;

use tracing::{debug, warn};

use crate::core::config::Settings;
use crate::input::HistoryLog;
use crate::process::{ProcessError, ProcessRunner, RedirectError, RedirectPlan};
use crate::vfs::{CommandTaskSource, VfsError, VfsMounter, TASKS_NAME};

#[derive(Debug)]
pub enum CommandError {
    InvalidArguments(String),
    ExecutionError(String),
    Redirect(RedirectError),
    IoError(io::Error),
    ProcessError(ProcessError),
    VfsError(VfsError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::InvalidArguments(msg) => write!(f, "invalid arguments: {}", msg),
            CommandError::ExecutionError(msg) => write!(f, "execution error: {}", msg),
            CommandError::Redirect(err) => write!(f, "redirect error: {}", err),
            CommandError::IoError(err) => write!(f, "IO error: {}", err),
            CommandError::ProcessError(err) => write!(f, "Process error: {}", err),
            CommandError::VfsError(err) => write!(f, "VFS error: {}", err),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<io::Error> for CommandError {
    fn from(err: io::Error) -> Self {
        CommandError::IoError(err)
    }
}

impl From<ProcessError> for CommandError {
    fn from(err: ProcessError) -> Self {
        CommandError::ProcessError(err)
    }
}

impl From<RedirectError> for CommandError {
    fn from(err: RedirectError) -> Self {
        CommandError::Redirect(err)
    }
}

impl From<VfsError> for CommandError {
    fn from(err: VfsError) -> Self {
        CommandError::VfsError(err)
    }
}

/// What the read loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Exit,
}

pub struct CommandExecutor {
    history: HistoryCommand,
    runner: ProcessRunner,
    boot_check: BootCheckCommand,
    snapshot: SnapshotCommand,
    mounter: VfsMounter,
    cd: CdCommand,
}

impl CommandExecutor {
    pub fn new(settings: &Settings) -> Self {
        let source = CommandTaskSource::from_query(&settings.task_query).unwrap_or_default();
        Self {
            history: HistoryCommand::new(HistoryLog::new(settings.history_file.clone())),
            runner: ProcessRunner::new(),
            boot_check: BootCheckCommand::new(),
            snapshot: SnapshotCommand::new(),
            mounter: VfsMounter::new(settings.mount_point.clone(), source),
            cd: CdCommand::new(),
        }
    }

    pub fn history_log(&self) -> &HistoryLog {
        self.history.log()
    }

    /// Stdout is locked per write, never across a running child, so the
    /// signal thread can still print while a command runs.
    pub fn dispatch(&self, line: &str) -> Result<Outcome, CommandError> {
        self.dispatch_to(line, &mut io::stdout())
    }

    /// Logs the line, classifies it and runs it. Built-in output goes to `out`.
    pub fn dispatch_to(&self, line: &str, out: &mut impl Write) -> Result<Outcome, CommandError> {
        if line.is_empty() {
            return Ok(Outcome::Continue);
        }

        if let Err(e) = self.history.log().append(line) {
            warn!(path = %self.history.log().path().display(), error = %e, "cannot append to history");
        }

        let args: Vec<String> = line.split_whitespace().map(String::from).collect();

        match CommandKind::classify(args) {
            Some(CommandKind::Builtin(builtin)) => self.run_builtin(builtin, out),
            Some(CommandKind::External(args)) => {
                out.flush()?;
                self.run_external(args)?;
                Ok(Outcome::Continue)
            }
            None => Ok(Outcome::Continue),
        }
    }

    fn run_builtin(&self, builtin: Builtin, out: &mut impl Write) -> Result<Outcome, CommandError> {
        debug!(?builtin, "running built-in");
        match builtin {
            Builtin::Exit => {
                writeln!(out, "{}", FAREWELL)?;
                return Ok(Outcome::Exit);
            }
            Builtin::History => self.history.show(out)?,
            Builtin::MountVfs => {
                let outcome = self.mounter.mount()?;
                writeln!(
                    out,
                    "Task list mounted at {} (service pid {})",
                    outcome.mount_point.join(TASKS_NAME).display(),
                    outcome.pid
                )?;
            }
            Builtin::Snapshot(pid) => {
                let pid = SnapshotCommand::parse_pid(&pid)?;
                let output = self.snapshot.capture(pid)?;
                writeln!(out, "Memory of process {} saved to {}", pid, output.display())?;
            }
            Builtin::BootCheck(device) => writeln!(out, "{}", self.boot_check.check(&device))?,
            Builtin::Echo(words) => writeln!(out, "{}", builtin::echo(&words))?,
            Builtin::Env(token) => writeln!(out, "{}", builtin::env_lookup(&token)?)?,
            Builtin::Cd(target) => {
                self.cd.execute(target.as_deref())?;
            }
        }
        Ok(Outcome::Continue)
    }

    fn run_external(&self, args: Vec<String>) -> Result<(), CommandError> {
        let plan = RedirectPlan::plan(args)?;
        let status = self.runner.run(&plan)?;
        debug!(program = plan.program(), %status, "external command finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::thread;
    use std::time::{Duration, Instant};

    fn executor_in(dir: &Path) -> CommandExecutor {
        let mut settings = Settings::defaults(dir);
        settings.mount_point = dir.join("vfs");
        CommandExecutor::new(&settings)
    }

    fn run(executor: &CommandExecutor, line: &str) -> (Result<Outcome, CommandError>, String) {
        let mut out = Vec::new();
        let result = executor.dispatch_to(line, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_every_line_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor_in(dir.path());

        run(&executor, "echo hi").0.unwrap();
        run(&executor, "snapshot notapid").0.unwrap_err();
        run(&executor, "true").0.unwrap();

        let logged = fs::read_to_string(dir.path().join("history.txt")).unwrap();
        assert_eq!(logged, "echo hi\nsnapshot notapid\ntrue\n");
    }

    #[test]
    fn test_empty_line_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor_in(dir.path());

        let (result, output) = run(&executor, "");
        assert_eq!(result.unwrap(), Outcome::Continue);
        assert!(output.is_empty());
        assert!(!dir.path().join("history.txt").exists());
    }

    #[test]
    fn test_whitespace_line_is_logged_but_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor_in(dir.path());

        let (result, output) = run(&executor, "   \t ");
        assert_eq!(result.unwrap(), Outcome::Continue);
        assert!(output.is_empty());
        let logged = fs::read_to_string(dir.path().join("history.txt")).unwrap();
        assert_eq!(logged, "   \t \n");
    }

    #[test]
    fn test_stdout_is_free_while_child_runs() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor_in(dir.path());

        let started = Instant::now();
        let notifier = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "\nConfiguration reloaded").unwrap();
            started.elapsed()
        });

        assert_eq!(executor.dispatch("sleep 2").unwrap(), Outcome::Continue);
        let printed_after = notifier.join().unwrap();
        assert!(
            printed_after < Duration::from_millis(1500),
            "notice waited {:?} for the child",
            printed_after
        );
    }

    #[test]
    fn test_echo_ignores_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor_in(dir.path());

        let (result, output) = run(&executor, "echo  hello   world > out.txt");
        assert_eq!(result.unwrap(), Outcome::Continue);
        assert_eq!(output, "hello world > out.txt\n");
    }

    #[test]
    fn test_exit_prints_farewell() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor_in(dir.path());

        let (result, output) = run(&executor, "\\q");
        assert_eq!(result.unwrap(), Outcome::Exit);
        assert_eq!(output, format!("{}\n", FAREWELL));
    }

    #[test]
    fn test_history_after_commands() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor_in(dir.path());

        run(&executor, "echo one").0.unwrap();
        let (_, output) = run(&executor, "history");
        assert_eq!(output, "echo one\nhistory\n");
    }

    #[test]
    fn test_missing_redirect_target_is_logged_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor_in(dir.path());

        let (result, _) = run(&executor, "ls >");
        assert!(matches!(
            result,
            Err(CommandError::Redirect(RedirectError::MissingTarget(_)))
        ));
        let logged = fs::read_to_string(dir.path().join("history.txt")).unwrap();
        assert_eq!(logged, "ls >\n");
    }

    #[test]
    fn test_external_redirect() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor_in(dir.path());
        let target = dir.path().join("out.txt");

        let (result, _) = run(&executor, &format!("printf external > {}", target.display()));
        assert_eq!(result.unwrap(), Outcome::Continue);
        assert_eq!(fs::read_to_string(&target).unwrap(), "external");
    }

    #[test]
    fn test_snapshot_rejects_bad_pid() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor_in(dir.path());

        let (result, _) = run(&executor, "\\mem abc");
        assert!(matches!(result, Err(CommandError::InvalidArguments(_))));
    }

    #[test]
    fn test_bootcheck_reports_unreadable_device() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor_in(dir.path());

        let (result, output) = run(&executor, "bootcheck cronsh-no-such-disk");
        assert_eq!(result.unwrap(), Outcome::Continue);
        assert!(output.contains("not bootable"));
    }

    #[test]
    fn test_env_lookup_output() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor_in(dir.path());
        std::env::set_var("CRONSH_DISPATCH_TEST", "dispatched");

        let (_, output) = run(&executor, "env $CRONSH_DISPATCH_TEST");
        assert_eq!(output, "dispatched\n");

        let (result, _) = run(&executor, "\\e CRONSH_DISPATCH_TEST");
        assert!(matches!(result, Err(CommandError::InvalidArguments(_))));
    }

    #[test]
    fn test_command_error_display() {
        let errors = vec![
            CommandError::InvalidArguments("bad args".to_string()),
            CommandError::ExecutionError("failed".to_string()),
            CommandError::Redirect(RedirectError::MissingProgram),
            CommandError::IoError(io::Error::new(io::ErrorKind::NotFound, "io error")),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
        }
    }
}
