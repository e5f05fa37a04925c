// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Real disk filesystem.

use crate::fs::{FileSystem, FsError, Result};

use glob::{glob, Pattern};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// Filesystem capability backed by the real disk.
///
/// Every relative path is resolved against a fixed project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskFileSystem {
    root: PathBuf,
}

impl DiskFileSystem {
    /// Construct new disk filesystem rooted at target directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root that relative paths resolve against.
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl FileSystem for DiskFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve(path).is_dir()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(self.resolve(path)).map_err(|err| FsError::Read {
            source: err,
            path: path.to_path_buf(),
        })
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.create_dir_all(parent)?;
        }

        fs::write(self.resolve(path), contents).map_err(|err| FsError::Write {
            source: err,
            path: path.to_path_buf(),
        })
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let created = mkdirp::mkdirp(self.resolve(path)).map_err(|err| FsError::CreateDir {
            source: err,
            path: path.to_path_buf(),
        })?;

        if let Some(first) = created {
            debug!("created directory tree starting at {:?}", first.display());
        }

        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<bool> {
        let full_path = self.resolve(path);
        let metadata = match fs::symlink_metadata(&full_path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
            Err(err) => {
                return Err(FsError::Remove {
                    source: err,
                    path: path.to_path_buf(),
                })
            }
        };

        let result = if metadata.is_dir() {
            fs::remove_dir_all(&full_path)
        } else {
            fs::remove_file(&full_path)
        };

        result.map(|_| true).map_err(|err| FsError::Remove {
            source: err,
            path: path.to_path_buf(),
        })
    }

    fn remove_dir_if_empty(&self, path: &Path) -> Result<bool> {
        let full_path = self.resolve(path);
        if !full_path.is_dir() {
            return Ok(false);
        }

        let mut entries = fs::read_dir(&full_path).map_err(|err| FsError::ListDir {
            source: err,
            path: path.to_path_buf(),
        })?;
        if entries.next().is_some() {
            debug!("directory {:?} is not empty, leaving it", path.display());
            return Ok(false);
        }

        fs::remove_dir(&full_path)
            .map(|_| true)
            .map_err(|err| FsError::Remove {
                source: err,
                path: path.to_path_buf(),
            })
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(self.resolve(path)).map_err(|err| FsError::ListDir {
            source: err,
            path: path.to_path_buf(),
        })?;

        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| FsError::ListDir {
                source: err,
                path: path.to_path_buf(),
            })?;
            children.push(path.join(entry.file_name()));
        }
        children.sort();

        Ok(children)
    }

    fn set_executable(&self, dir: &Path) -> Result<()> {
        let full_dir = self.resolve(dir);
        if !full_dir.is_dir() {
            return Ok(());
        }

        let pattern = format!("{}/*", Pattern::escape(&full_dir.to_string_lossy()));
        for entry in glob(&pattern)? {
            let script = match entry {
                Ok(script) => script,
                Err(err) => {
                    warn!("skipping unreadable script entry: {err}");
                    continue;
                }
            };

            if script.is_file() {
                make_executable(&script).map_err(|err| FsError::Permissions {
                    source: err,
                    path: script.strip_prefix(&self.root).unwrap_or(&script).to_path_buf(),
                })?;
            }
        }

        Ok(())
    }

    fn is_executable(&self, path: &Path) -> bool {
        is_executable(&self.resolve(path))
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    let mode = permissions.mode();
    if mode & 0o111 == 0o111 {
        return Ok(());
    }

    permissions.set_mode(mode | 0o111);
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
