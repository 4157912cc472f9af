use std::fs::{self, DirBuilder, File};
use std::io::{self, Read, Write};
use std::os::fd::OwnedFd;
use std::os::unix::fs::{DirBuilderExt, MetadataExt};
use std::path::{Path, PathBuf};

use fuser::{MountOption, Session};
use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2, fork, getpid, pipe, setsid, ForkResult};
use tracing::{debug, info};

use super::{CommandTaskSource, Namespace, TasksFs, VfsError};
use crate::process::executor::{report_errno, wait_for};

/// Terminates the forked child immediately, without running atexit handlers.
fn _exit(code: i32) -> ! {
    // SAFETY: `_exit` is async-signal-safe and never returns.
    unsafe { libc::_exit(code) }
}

const MOUNT_POINT_MODE: u32 = 0o755;
const FS_NAME: &str = "cronsh";

/// A service that reported a successful mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountOutcome {
    pub mount_point: PathBuf,
    pub pid: i32,
}

/// Launches [`TasksFs`] as a detached process serving `mount_point`.
#[derive(Debug, Clone)]
pub struct VfsMounter {
    mount_point: PathBuf,
    source: CommandTaskSource,
}

impl VfsMounter {
    pub fn new(mount_point: impl Into<PathBuf>, source: CommandTaskSource) -> Self {
        Self {
            mount_point: mount_point.into(),
            source,
        }
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    /// Double-forks so the service lands in its own session while the
    /// intermediate child is reaped here. Returns once the service reports
    /// whether the mount succeeded.
    pub fn mount(&self) -> Result<MountOutcome, VfsError> {
        ensure_mount_point(&self.mount_point)?;
        if is_mount_point(&self.mount_point)? {
            return Err(VfsError::AlreadyMounted(self.mount_point.clone()));
        }

        let (ready_rx, ready_tx) = pipe().map_err(io::Error::from)?;

        // SAFETY: the children never return into the shell; they exit via `_exit`.
        // The shell is multithreaded (signal thread), so the children allocate
        // and log after fork; this relies on glibc's fork-safe malloc and on
        // the signal thread holding no locks the children take.
        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                drop(ready_rx);
                _exit(self.detach(ready_tx))
            }
            Ok(ForkResult::Parent { child }) => {
                drop(ready_tx);
                let status = wait_for(child).map_err(|e| VfsError::Daemon(e.to_string()))?;
                if !status.success() {
                    return Err(VfsError::Daemon(format!("launcher failed with {}", status)));
                }
                let pid = read_ready(ready_rx)?;
                info!(mount_point = %self.mount_point.display(), pid, "filesystem service mounted");
                Ok(MountOutcome {
                    mount_point: self.mount_point.clone(),
                    pid,
                })
            }
            Err(errno) => Err(VfsError::Daemon(errno.desc().to_string())),
        }
    }

    /// Intermediate child: new session, fork the service, exit.
    fn detach(&self, ready_tx: OwnedFd) -> i32 {
        if let Err(errno) = setsid() {
            report_errno(b"cronsh: setsid: ", errno);
            return 1;
        }
        // SAFETY: the service exits via `_exit` once its session ends.
        match unsafe { fork() } {
            Ok(ForkResult::Child) => _exit(self.serve(ready_tx)),
            Ok(ForkResult::Parent { .. }) => 0,
            Err(errno) => {
                report_errno(b"cronsh: fork: ", errno);
                1
            }
        }
    }

    /// Service process: detach stdio, mount, report, serve until unmounted.
    fn serve(&self, ready_tx: OwnedFd) -> i32 {
        let mut ready = File::from(ready_tx);

        if let Err(errno) = redirect_std_streams() {
            let _ = send_ready(&mut ready, errno as i32);
            return 1;
        }

        let fs = TasksFs::new(Namespace::new(self.source.clone()));
        let options = [MountOption::RO, MountOption::FSName(FS_NAME.to_string())];
        let mut session = match Session::new(fs, &self.mount_point, &options) {
            Ok(session) => session,
            Err(e) => {
                let _ = send_ready(&mut ready, e.raw_os_error().unwrap_or(libc::EIO));
                return 1;
            }
        };

        if send_ready(&mut ready, 0).is_err() {
            return 1;
        }
        drop(ready);

        match session.run() {
            Ok(()) => 0,
            Err(_) => 1,
        }
    }
}

/// Creates the mount point if needed; an existing directory is fine.
pub(crate) fn ensure_mount_point(path: &Path) -> io::Result<()> {
    DirBuilder::new()
        .recursive(true)
        .mode(MOUNT_POINT_MODE)
        .create(path)
}

/// A directory is a mount point when it sits on a different device than its parent.
pub(crate) fn is_mount_point(path: &Path) -> io::Result<bool> {
    let path = fs::canonicalize(path)?;
    let Some(parent) = path.parent() else {
        return Ok(true);
    };
    let here = fs::metadata(&path)?.dev();
    let above = fs::metadata(parent)?.dev();
    debug!(path = %path.display(), here, above, "mount point check");
    Ok(here != above)
}

fn redirect_std_streams() -> nix::Result<()> {
    let null = open("/dev/null", OFlag::O_RDWR, Mode::empty())?;
    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        dup2(null, target)?;
    }
    if null > libc::STDERR_FILENO {
        close(null)?;
    }
    Ok(())
}

/// Ready message: status (0 or an errno) followed by the service pid.
fn send_ready(ready: &mut File, status: i32) -> io::Result<()> {
    let mut message = [0u8; 8];
    message[..4].copy_from_slice(&status.to_le_bytes());
    message[4..].copy_from_slice(&getpid().as_raw().to_le_bytes());
    ready.write_all(&message)
}

fn read_ready(ready_rx: OwnedFd) -> Result<i32, VfsError> {
    let mut ready = File::from(ready_rx);
    let mut message = [0u8; 8];
    if let Err(e) = ready.read_exact(&mut message) {
        return Err(match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                VfsError::Daemon("service exited before mounting".to_string())
            }
            _ => VfsError::Io(e),
        });
    }

    let status = i32::from_le_bytes([message[0], message[1], message[2], message[3]]);
    let pid = i32::from_le_bytes([message[4], message[5], message[6], message[7]]);
    if status != 0 {
        return Err(VfsError::Mount(io::Error::from_raw_os_error(status)));
    }
    Ok(pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_mount_point_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mount_point = dir.path().join("vfs");

        ensure_mount_point(&mount_point).unwrap();
        assert!(mount_point.is_dir());
        ensure_mount_point(&mount_point).unwrap();
        assert!(mount_point.is_dir());
    }

    #[test]
    fn test_ensure_mount_point_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        fs::write(&file, "x").unwrap();

        assert!(ensure_mount_point(&file).is_err());
    }

    #[test]
    fn test_plain_directory_is_not_a_mount_point() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain");
        fs::create_dir(&plain).unwrap();

        assert!(!is_mount_point(&plain).unwrap());
        assert!(is_mount_point(Path::new("/")).unwrap());
    }

    #[test]
    fn test_ready_message_round_trip() {
        let (rx, tx) = pipe().unwrap();
        let mut writer = File::from(tx);
        send_ready(&mut writer, 0).unwrap();
        drop(writer);

        assert_eq!(read_ready(rx).unwrap(), getpid().as_raw());
    }

    #[test]
    fn test_ready_reports_mount_errno() {
        let (rx, tx) = pipe().unwrap();
        let mut writer = File::from(tx);
        send_ready(&mut writer, libc::ENODEV).unwrap();
        drop(writer);

        match read_ready(rx) {
            Err(VfsError::Mount(e)) => assert_eq!(e.raw_os_error(), Some(libc::ENODEV)),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_ready_eof_means_service_died() {
        let (rx, tx) = pipe().unwrap();
        drop(tx);

        assert!(matches!(read_ready(rx), Err(VfsError::Daemon(_))));
    }
}
