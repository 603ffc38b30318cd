//! Per-unit scratch directories.
//!
//! Every builder owns exactly one workspace. Workspaces are never removed
//! implicitly; only [`Workspace::cleanup`] deletes them, so a failed run
//! leaves its files behind for inspection.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::UnitKind;

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "slideshow-";

/// An exclusively owned directory tree.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    kind: UnitKind,
}

impl Workspace {
    /// Create a fresh directory `<parent>/slideshow-<Kind>-NNN`.
    ///
    /// `parent` defaults to the system temp dir. The name is claimed with a
    /// plain `create_dir`, so two units can never end up sharing one. The
    /// counter is unbounded; past 999 the number simply gets wider.
    pub fn create(parent: Option<&Path>, kind: UnitKind) -> io::Result<Self> {
        let parent = match parent {
            Some(p) => p.to_path_buf(),
            None => env::temp_dir(),
        };
        fs::create_dir_all(&parent)?;

        let mut n: u64 = 0;
        loop {
            n += 1;
            let root = parent.join(format!("{}{}-{:03}", WORKSPACE_PREFIX, kind.name(), n));
            match fs::create_dir(&root) {
                Ok(()) => {
                    tracing::debug!("Created workspace {}", root.display());
                    return Ok(Self { root, kind });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Path of `name` inside the workspace.
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    /// Create a subdirectory and return its path.
    pub fn subdir(&self, name: &str) -> io::Result<PathBuf> {
        let dir = self.root.join(name);
        fs::create_dir(&dir)?;
        Ok(dir)
    }

    /// Recursively delete the workspace.
    ///
    /// Succeeds for partially populated trees and for trees already gone.
    pub fn cleanup(self) -> io::Result<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {
                tracing::debug!("Removed workspace {}", self.root.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
