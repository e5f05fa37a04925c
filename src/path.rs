// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for schema files, and keep every path
//! that a schema talks about relative to the project root.

use std::path::{Component, Path, PathBuf};

/// Determine default absolute path to schema file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/rigging/schema.toml` as the
/// default absolute path for a schema file. Does not check if the path
/// returned actually exists.
///
/// # Errors
///
/// - Return [`PathError::NoConfigDir`] if configuration directory path cannot
///   be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_schema_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("rigging").join("schema.toml"))
        .ok_or(PathError::NoConfigDir)
}

/// Ensure that path stays relative to the project root.
///
/// # Errors
///
/// - Return [`PathError::Absolute`] if path is absolute.
/// - Return [`PathError::EscapesRoot`] if path uses parent components.
/// - Return [`PathError::Empty`] if path has no components at all.
pub fn ensure_relative(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut components = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => components += 1,
            Component::CurDir => continue,
            Component::ParentDir => {
                return Err(PathError::EscapesRoot {
                    path: path.to_path_buf(),
                })
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::Absolute {
                    path: path.to_path_buf(),
                })
            }
        }
    }

    if components == 0 {
        return Err(PathError::Empty);
    }

    Ok(())
}

/// Number of normal components in path.
pub fn depth(path: impl AsRef<Path>) -> usize {
    path.as_ref()
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .count()
}

/// List ancestors of a relative path, nearest first, excluding the path
/// itself and the project root.
pub fn ancestors(path: &Path) -> impl Iterator<Item = &Path> {
    path.ancestors()
        .skip(1)
        .filter(|ancestor| !ancestor.as_os_str().is_empty())
}

/// Path error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Configuration directory of user cannot be determined.
    #[error("cannot determine absolute path to user's configuration directory")]
    NoConfigDir,

    /// Schema path is absolute.
    #[error("path {:?} must be relative to project root", path.display())]
    Absolute { path: PathBuf },

    /// Schema path climbs out of the project root.
    #[error("path {:?} escapes project root", path.display())]
    EscapesRoot { path: PathBuf },

    /// Schema path is empty.
    #[error("path cannot be empty")]
    Empty,
}

/// Friendly result alias :3
pub type Result<T, E = PathError> = std::result::Result<T, E>;
