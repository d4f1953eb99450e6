//! Workspace folder enumeration.
//!
//! A workspace is a list of root folders, each rendered as one trunk node in
//! the tree. The terminal host builds it from the CLI positional arguments.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// One configured root folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFolder {
    /// Display name, usually the basename of `root_path`.
    pub name: String,
    /// Absolute root path of the folder.
    pub root_path: PathBuf,
}

impl WorkspaceFolder {
    /// Create a folder whose name is the last component of `root_path`.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        let root_path = root_path.into();
        let name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root_path.to_string_lossy().to_string());
        Self { name, root_path }
    }

    /// Resolve a user-supplied path into a canonical directory folder.
    pub fn from_user_path(path: &Path) -> Result<Self> {
        let root = path
            .canonicalize()
            .map_err(|_| AppError::InvalidPath(format!("{} does not exist", path.display())))?;
        if !root.is_dir() {
            return Err(AppError::InvalidPath(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        Ok(Self::new(root))
    }
}

/// Source of the configured root folders.
pub trait Workspace {
    /// Return the current root folders. May be empty.
    fn folders(&self) -> Vec<WorkspaceFolder>;
}

/// A workspace whose folders are fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticWorkspace {
    folders: Vec<WorkspaceFolder>,
}

impl StaticWorkspace {
    pub fn new(folders: Vec<WorkspaceFolder>) -> Self {
        Self { folders }
    }

    /// Build a workspace from user paths, skipping duplicates.
    pub fn from_paths(paths: &[PathBuf]) -> Result<Self> {
        let mut folders: Vec<WorkspaceFolder> = Vec::new();
        for path in paths {
            let folder = WorkspaceFolder::from_user_path(path)?;
            if !folders.iter().any(|f| f.root_path == folder.root_path) {
                folders.push(folder);
            }
        }
        Ok(Self { folders })
    }
}

impl Workspace for StaticWorkspace {
    fn folders(&self) -> Vec<WorkspaceFolder> {
        self.folders.clone()
    }
}
