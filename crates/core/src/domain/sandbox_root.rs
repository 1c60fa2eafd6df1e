use std::fmt;
use std::path::{Path, PathBuf};

use super::DomainError;
use super::path_resolver::{is_contained, normalize};

/// The absolute directory every operation is confined to. Fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SandboxRoot(PathBuf);

impl SandboxRoot {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        if path.is_absolute() {
            Ok(Self(normalize(&path)))
        } else {
            Err(DomainError::RelativeRoot(path.display().to_string()))
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn contains(&self, candidate: &Path) -> bool {
        is_contained(&self.0, candidate)
    }
}

impl AsRef<Path> for SandboxRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SandboxRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

impl TryFrom<PathBuf> for SandboxRoot {
    type Error = DomainError;

    fn try_from(value: PathBuf) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SandboxRoot> for PathBuf {
    fn from(value: SandboxRoot) -> Self {
        value.0
    }
}
