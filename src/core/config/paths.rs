use super::ConfigError;
use std::env;
use std::path::PathBuf;

const RC_FILE_NAME: &str = ".cronshrc";

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub rc_path: Option<PathBuf>,
    pub launch_dir: PathBuf,
}

impl ConfigPaths {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(ConfigPaths {
            rc_path: dirs::home_dir().map(|home| home.join(RC_FILE_NAME)),
            launch_dir: env::current_dir()?,
        })
    }

    pub fn with_rc(rc_path: impl Into<PathBuf>, launch_dir: impl Into<PathBuf>) -> Self {
        ConfigPaths {
            rc_path: Some(rc_path.into()),
            launch_dir: launch_dir.into(),
        }
    }
}
