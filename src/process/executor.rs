use std::ffi::{CStr, CString};
use std::os::fd::BorrowedFd;

use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{close, dup2, execvp, fork, write, ForkResult, Pid};
use tracing::debug;

use super::{ExitStatus, ProcessError, RedirectPlan};

/// Terminates the forked child immediately, without running atexit handlers.
fn _exit(code: i32) -> ! {
    // SAFETY: `_exit` is async-signal-safe and never returns.
    unsafe { libc::_exit(code) }
}

/// Status of a child that could not exec its program.
pub const EXEC_FAILURE_STATUS: i32 = 127;
/// Status of a child that could not open its redirect target.
pub const REDIRECT_FAILURE_STATUS: i32 = 1;

const REDIRECT_MODE: u32 = 0o644;

/// Forks, execs and waits for exactly one external command per `run`.
#[derive(Clone, Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, plan: &RedirectPlan) -> Result<ExitStatus, ProcessError> {
        let prepared = PreparedCommand::new(plan)?;

        // SAFETY: the child only touches data prepared above before it execs or exits.
        match unsafe { fork() } {
            Ok(ForkResult::Child) => _exit(prepared.exec_in_child()),
            Ok(ForkResult::Parent { child }) => {
                debug!(pid = %child, program = plan.program(), "spawned child");
                let status = wait_for(child)?;
                debug!(pid = %child, %status, "child finished");
                Ok(status)
            }
            Err(errno) => Err(ProcessError::Fork(errno)),
        }
    }
}

/// Everything the child needs, allocated before forking.
struct PreparedCommand {
    argv: Vec<CString>,
    target: Option<(CString, OFlag)>,
    exec_failure: Vec<u8>,
    redirect_failure: Vec<u8>,
}

impl PreparedCommand {
    fn new(plan: &RedirectPlan) -> Result<Self, ProcessError> {
        if plan.program_args.is_empty() {
            return Err(ProcessError::InvalidArgument(String::new()));
        }

        let argv = plan
            .program_args
            .iter()
            .map(|arg| to_cstring(arg))
            .collect::<Result<Vec<_>, _>>()?;

        let target = match &plan.target {
            Some(target) => {
                let mut flags = OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_CLOEXEC;
                flags |= if target.append {
                    OFlag::O_APPEND
                } else {
                    OFlag::O_TRUNC
                };
                Some((to_cstring(&target.path)?, flags))
            }
            None => None,
        };

        let redirect_failure = match &plan.target {
            Some(target) => format!("cronsh: {}: ", target.path).into_bytes(),
            None => Vec::new(),
        };

        Ok(Self {
            argv,
            target,
            exec_failure: format!("cronsh: {}: ", plan.program()).into_bytes(),
            redirect_failure,
        })
    }

    /// Runs in the forked child. Returns only when exec did not happen.
    fn exec_in_child(&self) -> i32 {
        // SAFETY: restoring the default disposition is async-signal-safe.
        let _ = unsafe { signal(Signal::SIGINT, SigHandler::SigDfl) };

        if let Some((path, flags)) = &self.target {
            if let Err(errno) = redirect_stdout(path, *flags) {
                report_errno(&self.redirect_failure, errno);
                return REDIRECT_FAILURE_STATUS;
            }
        }

        if let Err(errno) = execvp(&self.argv[0], &self.argv) {
            report_errno(&self.exec_failure, errno);
        }
        EXEC_FAILURE_STATUS
    }
}

fn to_cstring(arg: &str) -> Result<CString, ProcessError> {
    CString::new(arg).map_err(|_| ProcessError::InvalidArgument(arg.to_string()))
}

fn redirect_stdout(path: &CStr, flags: OFlag) -> nix::Result<()> {
    let fd = open(path, flags, Mode::from_bits_truncate(REDIRECT_MODE))?;
    dup2(fd, libc::STDOUT_FILENO)?;
    close(fd)
}

/// Writes `prefix` and the errno description to stderr without allocating.
pub(crate) fn report_errno(prefix: &[u8], errno: Errno) {
    // SAFETY: fd 2 stays open for the lifetime of the process.
    let stderr = unsafe { BorrowedFd::borrow_raw(libc::STDERR_FILENO) };
    let _ = write(stderr, prefix);
    let _ = write(stderr, errno.desc().as_bytes());
    let _ = write(stderr, b"\n");
}

/// Blocks until `child` itself terminates.
pub(crate) fn wait_for(child: Pid) -> Result<ExitStatus, ProcessError> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ExitStatus::Exited(code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(ExitStatus::Signaled(signal)),
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(errno) => return Err(ProcessError::Wait(errno)),
        }
    }
}
