use std::ffi::OsStr;
use std::time::{Duration, SystemTime};

use fuser::consts::FOPEN_DIRECT_IO;
use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyData, ReplyDirectory, ReplyEntry, ReplyOpen,
    Request, FUSE_ROOT_ID,
};
use nix::unistd::{getgid, getuid};
use tracing::debug;

use super::{Namespace, NodeAttr, NodeKind, ROOT_PATH, TASKS_NAME, TASKS_PATH};

const TTL: Duration = Duration::from_secs(1);
const TASKS_INO: u64 = 2;
const BLOCK_SIZE: u32 = 512;

/// FUSE adapter mapping inodes onto [`Namespace`] paths.
pub struct TasksFs {
    namespace: Namespace,
    uid: u32,
    gid: u32,
    created: SystemTime,
}

impl TasksFs {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            uid: getuid().as_raw(),
            gid: getgid().as_raw(),
            created: SystemTime::now(),
        }
    }

    fn path_of(ino: u64) -> Option<&'static str> {
        match ino {
            FUSE_ROOT_ID => Some(ROOT_PATH),
            TASKS_INO => Some(TASKS_PATH),
            _ => None,
        }
    }

    fn file_attr(&self, ino: u64, attr: NodeAttr) -> FileAttr {
        FileAttr {
            ino,
            size: attr.size,
            blocks: attr.size.div_ceil(u64::from(BLOCK_SIZE)),
            atime: self.created,
            mtime: self.created,
            ctime: self.created,
            crtime: self.created,
            kind: file_type(attr.kind),
            perm: attr.perm,
            nlink: attr.nlink,
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }
}

fn file_type(kind: NodeKind) -> FileType {
    match kind {
        NodeKind::Directory => FileType::Directory,
        NodeKind::File => FileType::RegularFile,
    }
}

impl Filesystem for TasksFs {
    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        if parent != FUSE_ROOT_ID || name.to_str() != Some(TASKS_NAME) {
            reply.error(libc::ENOENT);
            return;
        }
        match self.namespace.attributes(TASKS_PATH) {
            Ok(attr) => reply.entry(&TTL, &self.file_attr(TASKS_INO, attr), 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        let Some(path) = Self::path_of(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.namespace.attributes(path) {
            Ok(attr) => reply.attr(&TTL, &self.file_attr(ino, attr)),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let Some(path) = Self::path_of(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let entries = match self.namespace.list(path) {
            Ok(entries) => entries,
            Err(e) => {
                reply.error(e.errno());
                return;
            }
        };

        for (i, (kind, name)) in entries.into_iter().enumerate().skip(offset.max(0) as usize) {
            let entry_ino = if name == TASKS_NAME { TASKS_INO } else { FUSE_ROOT_ID };
            if reply.add(entry_ino, (i + 1) as i64, file_type(kind), name) {
                break;
            }
        }
        reply.ok();
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        let result = Self::path_of(ino)
            .ok_or(super::FsError::NotFound)
            .and_then(|path| self.namespace.open(path));
        match result {
            // Direct I/O keeps the page cache from answering later reads.
            Ok(()) => reply.opened(0, FOPEN_DIRECT_IO),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Some(path) = Self::path_of(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.namespace.read(path, offset.max(0) as u64, size as usize) {
            Ok(data) => {
                debug!(offset, size, served = data.len(), "read /tasks");
                reply.data(&data);
            }
            Err(e) => reply.error(e.errno()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::CommandTaskSource;

    #[test]
    fn test_inode_mapping() {
        assert_eq!(TasksFs::path_of(FUSE_ROOT_ID), Some("/"));
        assert_eq!(TasksFs::path_of(TASKS_INO), Some("/tasks"));
        assert_eq!(TasksFs::path_of(99), None);
    }

    #[test]
    fn test_file_attr_conversion() {
        let fs = TasksFs::new(Namespace::new(CommandTaskSource::default()));

        let root = fs.file_attr(FUSE_ROOT_ID, fs.namespace.attributes("/").unwrap());
        assert_eq!(root.kind, FileType::Directory);
        assert_eq!(root.nlink, 2);
        assert_eq!(root.perm, 0o755);

        let tasks = fs.file_attr(TASKS_INO, fs.namespace.attributes("/tasks").unwrap());
        assert_eq!(tasks.kind, FileType::RegularFile);
        assert_eq!(tasks.size, 1024);
        assert_eq!(tasks.blocks, 2);
        assert_eq!(tasks.perm, 0o444);
        assert_eq!(tasks.uid, getuid().as_raw());
    }
}
