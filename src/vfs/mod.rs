//! Read-only synthetic filesystem exposing the user's crontab as `/tasks`.
//!
//! [`Namespace`] answers path-based calls and holds no per-open state, so each
//! read runs the task query again. Two reads of `/tasks` can therefore return
//! different bytes when the crontab changes in between. [`TasksFs`] adapts it
//! to FUSE and [`VfsMounter`] launches it as a detached service.

use std::fmt;
use std::path::PathBuf;

mod fuse;
mod mounter;
mod namespace;
mod tasks;

pub use fuse::TasksFs;
pub use mounter::{MountOutcome, VfsMounter};
pub use namespace::{Namespace, NodeAttr, NodeKind, ROOT_PATH, TASKS_NAME, TASKS_PATH};
pub use tasks::{CommandTaskSource, TaskSource};

/// Upper bound on the bytes captured from one run of the task query.
pub const TASKS_CAPTURE_LIMIT: usize = 1024;
/// Size reported for `/tasks` before anything has been read.
pub const TASKS_ADVERTISED_SIZE: u64 = 1024;

/// Failure of a single filesystem call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    NotFound,
    Io,
}

impl FsError {
    pub fn errno(self) -> libc::c_int {
        match self {
            FsError::NotFound => libc::ENOENT,
            FsError::Io => libc::EIO,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::NotFound => write!(f, "no such file or directory"),
            FsError::Io => write!(f, "input/output error"),
        }
    }
}

impl std::error::Error for FsError {}

#[derive(Debug)]
pub enum VfsError {
    Io(std::io::Error),
    AlreadyMounted(PathBuf),
    Daemon(String),
    Mount(std::io::Error),
}

impl From<std::io::Error> for VfsError {
    fn from(err: std::io::Error) -> Self {
        VfsError::Io(err)
    }
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfsError::Io(e) => write!(f, "IO error: {}", e),
            VfsError::AlreadyMounted(path) => {
                write!(f, "{} is already a mount point", path.display())
            }
            VfsError::Daemon(msg) => write!(f, "cannot start filesystem service: {}", msg),
            VfsError::Mount(e) => write!(f, "mount failed: {}", e),
        }
    }
}

impl std::error::Error for VfsError {}
