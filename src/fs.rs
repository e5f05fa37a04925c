// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Filesystem capability.
//!
//! The engine never touches the filesystem directly. Instead, planning and
//! execution go through the [`FileSystem`] trait so that any implementation
//! can be swapped in, e.g., the real disk through [`DiskFileSystem`], or a
//! purely in-memory tree through [`MemoryFileSystem`].
//!
//! All paths handed to a [`FileSystem`] are relative to the project root.
//!
//! [`DiskFileSystem`]: crate::fs::disk::DiskFileSystem
//! [`MemoryFileSystem`]: crate::fs::memory::MemoryFileSystem

pub mod disk;
pub mod memory;

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Minimal filesystem capability needed for reconciliation.
pub trait FileSystem {
    /// Check if path exists as either a file or directory.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path exists as a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Read file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// - Return [`FsError::Read`] if file cannot be read.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Read file as UTF-8 text, returning nothing on any failure.
    fn try_read_to_string(&self, path: &Path) -> Option<String> {
        self.read_to_string(path).ok()
    }

    /// Write file, creating missing parent directories.
    ///
    /// # Errors
    ///
    /// - Return [`FsError::Write`] if file cannot be written.
    /// - Return [`FsError::CreateDir`] if parent directories cannot be made.
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Recursively create directory.
    ///
    /// # Errors
    ///
    /// - Return [`FsError::CreateDir`] if directory cannot be made.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Remove file, or directory along with everything inside of it.
    ///
    /// Returns whether anything was removed. Missing paths are not an error.
    ///
    /// # Errors
    ///
    /// - Return [`FsError::Remove`] if path exists but cannot be removed.
    fn remove(&self, path: &Path) -> Result<bool>;

    /// Remove directory only if it is empty.
    ///
    /// Returns whether the directory was removed. Missing paths, non-empty
    /// directories, and files are left alone.
    ///
    /// # Errors
    ///
    /// - Return [`FsError::Remove`] if empty directory cannot be removed.
    fn remove_dir_if_empty(&self, path: &Path) -> Result<bool>;

    /// List immediate children of directory in sorted order.
    ///
    /// Returned paths are relative to the project root.
    ///
    /// # Errors
    ///
    /// - Return [`FsError::ListDir`] if directory cannot be listed.
    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Make every file inside of directory executable.
    ///
    /// Missing directories are silently ignored.
    ///
    /// # Errors
    ///
    /// - Return [`FsError::Permissions`] if permissions cannot be changed.
    fn set_executable(&self, dir: &Path) -> Result<()>;

    /// Check if file is executable.
    fn is_executable(&self, path: &Path) -> bool;

    /// Read structured JSON document.
    ///
    /// Returns nothing if the document does not exist. Blank documents are
    /// treated as an empty object.
    ///
    /// # Errors
    ///
    /// - Return [`FsError::Read`] if document cannot be read.
    /// - Return [`FsError::ParseJson`] if document is not valid JSON.
    fn read_json(&self, path: &Path) -> Result<Option<Value>> {
        if !self.exists(path) {
            return Ok(None);
        }

        let data = self.read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Some(Value::Object(Map::new())));
        }

        serde_json::from_str(&data)
            .map(Some)
            .map_err(|err| FsError::ParseJson {
                source: err,
                path: path.to_path_buf(),
            })
    }

    /// Write structured JSON document.
    ///
    /// Documents are pretty printed with two space indentation, and always
    /// end with a trailing newline.
    ///
    /// # Errors
    ///
    /// - Return [`FsError::SerializeJson`] if document cannot be serialized.
    /// - Return [`FsError::Write`] if document cannot be written.
    fn write_json(&self, path: &Path, value: &Value) -> Result<()> {
        let mut data =
            serde_json::to_string_pretty(value).map_err(|err| FsError::SerializeJson {
                source: err,
                path: path.to_path_buf(),
            })?;
        data.push('\n');
        self.write(path, &data)
    }
}

/// Pending edit to a single file.
///
/// Merge and patch primitives first compute what they _would_ do to a file
/// without touching it. That way the planner can predict outcomes using the
/// exact same logic the executor later commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit<T> {
    /// Leave file as is.
    Keep,

    /// Create missing file with new contents.
    Create(T),

    /// Replace contents of existing file.
    Update(T),

    /// Delete existing file.
    Delete,
}

impl<T> Edit<T> {
    /// Observable change that committing this edit causes.
    pub fn change(&self) -> Option<Change> {
        match self {
            Self::Keep => None,
            Self::Create(_) => Some(Change::Created),
            Self::Update(_) => Some(Change::Updated),
            Self::Delete => Some(Change::Removed),
        }
    }

    /// Check if edit leaves file as is.
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// Observable change to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Created,
    Updated,
    Removed,
}

/// Filesystem error types.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// File cannot be read.
    #[error("failed to read {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be written.
    #[error("failed to write {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Directory cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File or directory cannot be removed.
    #[error("failed to remove {:?}", path.display())]
    Remove {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Directory cannot be listed.
    #[error("failed to list directory {:?}", path.display())]
    ListDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File permissions cannot be changed.
    #[error("failed to set permissions of {:?}", path.display())]
    Permissions {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// JSON document cannot be parsed.
    #[error("failed to parse JSON document at {:?}", path.display())]
    ParseJson {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },

    /// JSON document cannot be serialized.
    #[error("failed to serialize JSON document for {:?}", path.display())]
    SerializeJson {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },

    /// Directory scan pattern is invalid.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

/// Friendly result alias :3
pub type Result<T, E = FsError> = std::result::Result<T, E>;
