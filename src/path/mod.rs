use std::fmt;

mod expander;

pub use expander::PathExpander;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    HomeDirNotFound,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Home directory not found"),
        }
    }
}

impl std::error::Error for PathError {}
