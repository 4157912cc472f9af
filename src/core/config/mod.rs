use std::{
    fmt,
    path::{Path, PathBuf},
};

mod loader;
mod paths;

use crate::path::{PathError, PathExpander};
use loader::ConfigLoader;
pub use paths::ConfigPaths;

pub const DEFAULT_HISTORY_FILE: &str = "history.txt";
pub const DEFAULT_MOUNT_POINT: &str = "/tmp/vfs";
pub const DEFAULT_TASK_QUERY: &str = "crontab -l";

/// Values the dispatcher is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub history_file: PathBuf,
    pub mount_point: PathBuf,
    pub task_query: Vec<String>,
}

impl Settings {
    pub fn defaults(launch_dir: &Path) -> Self {
        Settings {
            history_file: launch_dir.join(DEFAULT_HISTORY_FILE),
            mount_point: PathBuf::from(DEFAULT_MOUNT_POINT),
            task_query: DEFAULT_TASK_QUERY
                .split_whitespace()
                .map(String::from)
                .collect(),
        }
    }
}

pub struct Config {
    paths: ConfigPaths,
    expander: PathExpander,
    settings: Settings,
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self::with_paths(ConfigPaths::new()?, PathExpander::new()))
    }

    pub fn with_paths(paths: ConfigPaths, expander: PathExpander) -> Self {
        let settings = Settings::defaults(&paths.launch_dir);
        Config {
            paths,
            expander,
            settings,
        }
    }

    /// Rebuilds settings from defaults plus the rc file, if there is one.
    pub fn load(&mut self) -> Result<(), ConfigError> {
        let loader = ConfigLoader::new(&self.paths, &self.expander);
        self.settings = loader.load_settings()?;
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn rc_path(&self) -> Option<&Path> {
        self.paths.rc_path.as_deref()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    Malformed { line: usize, message: String },
    PathError(PathError),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<PathError> for ConfigError {
    fn from(e: PathError) -> Self {
        ConfigError::PathError(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::Malformed { line, message } => write!(f, "line {}: {}", line, message),
            ConfigError::PathError(e) => write!(f, "Path error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
