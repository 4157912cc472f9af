use std::fmt;

use nix::errno::Errno;
use nix::sys::signal::Signal;

pub mod executor;
pub mod redirect;
pub mod signal;

pub use executor::ProcessRunner;
pub use redirect::{RedirectError, RedirectPlan, RedirectTarget};
pub use signal::{SignalCallbacks, SignalGuard, SignalPolicy};

#[derive(Debug)]
pub enum ProcessError {
    Fork(Errno),
    Wait(Errno),
    InvalidArgument(String),
    SignalError(String),
    Other(String),
}

impl From<std::io::Error> for ProcessError {
    fn from(e: std::io::Error) -> Self {
        ProcessError::Other(e.to_string())
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Fork(errno) => write!(f, "cannot create process: {}", errno.desc()),
            ProcessError::Wait(errno) => write!(f, "cannot wait for process: {}", errno.desc()),
            ProcessError::InvalidArgument(arg) => {
                write!(f, "argument contains a NUL byte: {:?}", arg)
            }
            ProcessError::SignalError(msg) => write!(f, "Signal error: {}", msg),
            ProcessError::Other(msg) => write!(f, "Other error: {}", msg),
        }
    }
}

impl std::error::Error for ProcessError {}

/// How a waited-on child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Exited(i32),
    Signaled(Signal),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Exited(0))
    }

    /// Shell-style numeric code: the exit code, or 128 + signal number.
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Exited(code) => *code,
            ExitStatus::Signaled(signal) => 128 + *signal as i32,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Exited(code) => write!(f, "exit status {}", code),
            ExitStatus::Signaled(signal) => write!(f, "killed by {}", signal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status_code() {
        assert!(ExitStatus::Exited(0).success());
        assert!(!ExitStatus::Exited(2).success());
        assert_eq!(ExitStatus::Exited(2).code(), 2);
        assert_eq!(ExitStatus::Signaled(Signal::SIGINT).code(), 130);
        assert!(!ExitStatus::Signaled(Signal::SIGKILL).success());
    }

    #[test]
    fn test_process_error_display() {
        let errors = vec![
            ProcessError::Fork(Errno::EAGAIN),
            ProcessError::Wait(Errno::ECHILD),
            ProcessError::InvalidArgument("a\0b".to_string()),
            ProcessError::SignalError("bad".to_string()),
            ProcessError::Other("other".to_string()),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
        }
    }
}
