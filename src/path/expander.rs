use super::PathError;
use std::path::{Path, PathBuf};

/// Expands a leading `~` and anchors relative paths to a base directory.
#[derive(Clone, Debug)]
pub struct PathExpander {
    home: Option<PathBuf>,
}

impl Default for PathExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl PathExpander {
    pub fn new() -> Self {
        Self {
            home: dirs::home_dir(),
        }
    }

    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: Some(home.into()),
        }
    }

    pub fn home_dir(&self) -> Result<PathBuf, PathError> {
        self.home.clone().ok_or(PathError::HomeDirNotFound)
    }

    pub fn expand(&self, path: &str) -> Result<PathBuf, PathError> {
        if path == "~" {
            return self.home_dir();
        }
        match path.strip_prefix("~/") {
            Some(rest) => {
                let mut home_path = self.home_dir()?;
                for part in rest.split('/').filter(|part| !part.is_empty()) {
                    home_path.push(part);
                }
                Ok(home_path)
            }
            // "~user" forms are left alone
            None => Ok(Path::new(path).to_path_buf()),
        }
    }

    /// Like `expand`, but a relative result is joined onto `base`.
    pub fn expand_from(&self, base: &Path, path: &str) -> Result<PathBuf, PathError> {
        let expanded = self.expand(path)?;
        if expanded.is_absolute() {
            Ok(expanded)
        } else {
            Ok(base.join(expanded))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let expander = PathExpander::with_home("/home/test");
        assert_eq!(expander.expand("~").unwrap(), PathBuf::from("/home/test"));
        assert_eq!(
            expander.expand("~/logs//cronsh").unwrap(),
            PathBuf::from("/home/test/logs/cronsh")
        );
        assert_eq!(expander.expand("~other/x").unwrap(), PathBuf::from("~other/x"));
        assert_eq!(expander.expand("/tmp/vfs").unwrap(), PathBuf::from("/tmp/vfs"));
    }

    #[test]
    fn test_missing_home() {
        let expander = PathExpander { home: None };
        assert_eq!(expander.expand("~"), Err(PathError::HomeDirNotFound));
        assert_eq!(expander.expand("plain").unwrap(), PathBuf::from("plain"));
    }

    #[test]
    fn test_expand_from_base() {
        let expander = PathExpander::with_home("/home/test");
        let base = Path::new("/work");
        assert_eq!(
            expander.expand_from(base, "history.txt").unwrap(),
            PathBuf::from("/work/history.txt")
        );
        assert_eq!(
            expander.expand_from(base, "/var/log/h").unwrap(),
            PathBuf::from("/var/log/h")
        );
        assert_eq!(
            expander.expand_from(base, "~/h").unwrap(),
            PathBuf::from("/home/test/h")
        );
    }
}
