use std::path::{Path, PathBuf};

/// A reference inside a project file that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Reference {
    #[error("alias `{0}` is not declared in scope")]
    Alias(String),
    #[error("prefab `{0}` does not exist")]
    Prefab(String),
    #[error("prefab `{0}` includes itself")]
    PrefabCycle(String),
    #[error("scene `{0}` is not declared")]
    Scene(String),
    #[error("tag `{0}` is not defined")]
    Tag(String),
}

/// Coarse classification of a [`LoadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    Reference,
}

/// Errors from loading project files.
///
/// Every variant names the file that triggered it. A failed load never yields
/// a partially built object.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed markup in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("unresolved reference in {}: {reference}", .path.display())]
    Reference { path: PathBuf, reference: Reference },
}

impl LoadError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: &Path, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub(crate) fn reference(path: &Path, reference: Reference) -> Self {
        Self::Reference {
            path: path.to_path_buf(),
            reference,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Reference { .. } => ErrorKind::Reference,
        }
    }

    /// The file being loaded when the error occurred.
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } | Self::Reference { path, .. } => {
                path
            }
        }
    }
}
