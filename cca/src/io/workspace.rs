//! Repository tools scoped to one project working directory.
//!
//! The [`Repository`] trait is what the pipeline talks to. [`Workspace`] is
//! the real implementation (filesystem + git); tests use an in-memory one.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::core::naming::is_contained_relative_path;
use crate::io::git::{Git, ToolOutput};

/// File and version-control operations the pipeline needs.
pub trait Repository {
    /// Read a file relative to the root. A missing file reads as empty text.
    fn read(&self, path: &str) -> Result<String>;
    /// Write a file relative to the root, creating parents and overwriting.
    fn write(&self, path: &str, content: &str) -> Result<()>;
    /// Stage and commit every pending change.
    fn commit(&self, message: &str) -> Result<ToolOutput>;
    /// Push the current branch.
    fn push(&self) -> Result<ToolOutput>;
}

/// A project working directory on disk.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    git: Git,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            git: Git::new(&root),
            root,
        }
    }

    /// Create the root directory if needed and return the workspace.
    pub fn ensure(root: impl Into<PathBuf>) -> Result<Self> {
        let workspace = Self::new(root);
        fs::create_dir_all(&workspace.root)
            .with_context(|| format!("create repository directory {}", workspace.root.display()))?;
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn git(&self) -> &Git {
        &self.git
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        if !is_contained_relative_path(path) {
            bail!("refusing path outside repository: {path}");
        }
        Ok(self.root.join(path))
    }
}

impl Repository for Workspace {
    fn read(&self, path: &str) -> Result<String> {
        let full = self.resolve(path)?;
        match fs::read_to_string(&full) {
            Ok(contents) => Ok(contents),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err).with_context(|| format!("read {}", full.display())),
        }
    }

    fn write(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&full, content).with_context(|| format!("write {}", full.display()))?;
        debug!(path, bytes = content.len(), "wrote file");
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<ToolOutput> {
        self.git.commit_all(message)
    }

    fn push(&self) -> Result<ToolOutput> {
        self.git.push()
    }
}
