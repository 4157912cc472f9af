use tracing::warn;

use super::{FsError, TaskSource, TASKS_ADVERTISED_SIZE, TASKS_CAPTURE_LIMIT};

pub const ROOT_PATH: &str = "/";
pub const TASKS_NAME: &str = "tasks";
pub const TASKS_PATH: &str = "/tasks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeAttr {
    pub kind: NodeKind,
    pub perm: u16,
    pub nlink: u32,
    pub size: u64,
}

const ROOT_ATTR: NodeAttr = NodeAttr {
    kind: NodeKind::Directory,
    perm: 0o755,
    nlink: 2,
    size: 0,
};

const TASKS_ATTR: NodeAttr = NodeAttr {
    kind: NodeKind::File,
    perm: 0o444,
    nlink: 1,
    size: TASKS_ADVERTISED_SIZE,
};

/// The fixed two-node tree: `/` and `/tasks`.
pub struct Namespace {
    source: Box<dyn TaskSource>,
    capture_limit: usize,
}

impl Namespace {
    pub fn new(source: impl TaskSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            capture_limit: TASKS_CAPTURE_LIMIT,
        }
    }

    pub fn with_capture_limit(mut self, capture_limit: usize) -> Self {
        self.capture_limit = capture_limit;
        self
    }

    pub fn attributes(&self, path: &str) -> Result<NodeAttr, FsError> {
        match path {
            ROOT_PATH => Ok(ROOT_ATTR),
            TASKS_PATH => Ok(TASKS_ATTR),
            _ => Err(FsError::NotFound),
        }
    }

    pub fn list(&self, path: &str) -> Result<Vec<(NodeKind, &'static str)>, FsError> {
        if path != ROOT_PATH {
            return Err(FsError::NotFound);
        }
        Ok(vec![
            (NodeKind::Directory, "."),
            (NodeKind::Directory, ".."),
            (NodeKind::File, TASKS_NAME),
        ])
    }

    pub fn open(&self, path: &str) -> Result<(), FsError> {
        match path {
            TASKS_PATH => Ok(()),
            _ => Err(FsError::NotFound),
        }
    }

    /// Serves `[offset, offset + size)` of a fresh capture, clipped to its length.
    pub fn read(&self, path: &str, offset: u64, size: usize) -> Result<Vec<u8>, FsError> {
        if path != TASKS_PATH {
            return Err(FsError::NotFound);
        }

        let mut content = self.source.capture(self.capture_limit).map_err(|e| {
            warn!(error = %e, "task query could not be started");
            FsError::Io
        })?;
        content.truncate(self.capture_limit);

        let len = content.len() as u64;
        if offset >= len {
            return Ok(Vec::new());
        }
        let start = offset as usize;
        let end = start.saturating_add(size).min(content.len());
        Ok(content[start..end].to_vec())
    }
}
