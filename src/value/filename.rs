use std::fmt;
use std::path::{Path, PathBuf};

/// A file path value, kept as given (no canonicalization, no filesystem access).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Filename(PathBuf);

impl Filename {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn full_path_and_name(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name().and_then(|name| name.to_str())
    }

    pub fn directory(&self) -> Option<&Path> {
        self.0.parent().filter(|parent| !parent.as_os_str().is_empty())
    }

    pub fn extension(&self) -> Option<&str> {
        self.0.extension().and_then(|ext| ext.to_str())
    }
}

impl From<PathBuf> for Filename {
    fn from(value: PathBuf) -> Self {
        Self(value)
    }
}

impl From<&Path> for Filename {
    fn from(value: &Path) -> Self {
        Self(value.to_path_buf())
    }
}

impl From<&str> for Filename {
    fn from(value: &str) -> Self {
        Self(PathBuf::from(value))
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
