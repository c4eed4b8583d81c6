//! Kiln directory management
//!
//! The [`KilnDir`] struct manages the `.kiln/` directory where the registry
//! database lives.

use std::path::{Path, PathBuf};

/// Manages the `.kiln/` directory for project-local data storage.
#[derive(Debug, Clone)]
pub struct KilnDir {
    path: PathBuf,
}

impl KilnDir {
    /// The directory name used for kiln data
    pub const NAME: &str = ".kiln";

    /// The database file name inside the directory
    pub const DB_FILE: &str = "kiln.db";

    /// Create a new `KilnDir` pointing to `.kiln/` in the current directory.
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(Self::NAME),
        }
    }

    /// Create a `KilnDir` at a custom location.
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the kiln directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the registry database.
    pub fn db_path(&self) -> PathBuf {
        self.path.join(Self::DB_FILE)
    }

    /// Check if the kiln directory exists.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Create the kiln directory if it doesn't exist.
    pub fn create(&self) -> std::io::Result<()> {
        if !self.exists() {
            std::fs::create_dir_all(&self.path)?;
        }
        Ok(())
    }
}

impl Default for KilnDir {
    fn default() -> Self {
        Self::new()
    }
}
