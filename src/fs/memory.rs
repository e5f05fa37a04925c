// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! In-memory filesystem.
//!
//! Keeps an entire project tree in memory. Useful for previewing
//! reconciliation without a real project on disk, and for exercising the
//! planner and executor in isolation.

use crate::fs::{FileSystem, FsError, Result};

use std::{
    cell::RefCell,
    collections::BTreeMap,
    io::{Error as IoError, ErrorKind},
    path::{Component, Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Dir,
    File { contents: String, executable: bool },
}

/// Filesystem capability backed by an in-memory tree.
///
/// # Invariant
///
/// - Every ancestor of a stored path is stored as a directory.
#[derive(Debug, Default, Clone)]
pub struct MemoryFileSystem {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
}

impl MemoryFileSystem {
    /// Construct new empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct in-memory filesystem pre-populated with files.
    ///
    /// # Errors
    ///
    /// - Return [`FsError::Write`] if a file collides with a directory.
    pub fn with_files(
        files: impl IntoIterator<Item = (impl AsRef<Path>, impl AsRef<str>)>,
    ) -> Result<Self> {
        let fs = Self::new();
        for (path, contents) in files {
            fs.write(path.as_ref(), contents.as_ref())?;
        }

        Ok(fs)
    }

    /// Snapshot of every stored path. Directories map to nothing, and files
    /// map to their contents.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Option<String>> {
        self.nodes
            .borrow()
            .iter()
            .map(|(path, node)| {
                let contents = match node {
                    Node::Dir => None,
                    Node::File { contents, .. } => Some(contents.clone()),
                };
                (path.clone(), contents)
            })
            .collect()
    }

    fn insert_dirs(&self, path: &Path) -> std::io::Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        let mut chain: Vec<&Path> = path
            .ancestors()
            .filter(|ancestor| !ancestor.as_os_str().is_empty())
            .collect();
        chain.reverse();

        for dir in chain {
            match nodes.get(dir) {
                Some(Node::File { .. }) => {
                    return Err(IoError::new(
                        ErrorKind::AlreadyExists,
                        format!("{} is a file", dir.display()),
                    ))
                }
                Some(Node::Dir) => continue,
                None => {
                    nodes.insert(dir.to_path_buf(), Node::Dir);
                }
            }
        }

        Ok(())
    }

    fn children(&self, path: &Path) -> Vec<PathBuf> {
        self.nodes
            .borrow()
            .keys()
            .filter(|key| key.parent() == Some(path))
            .cloned()
            .collect()
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .collect()
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let path = normalize(path);
        path.as_os_str().is_empty() || self.nodes.borrow().contains_key(&path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = normalize(path);
        path.as_os_str().is_empty() || matches!(self.nodes.borrow().get(&path), Some(Node::Dir))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.nodes.borrow().get(&normalize(path)) {
            Some(Node::File { contents, .. }) => Ok(contents.clone()),
            Some(Node::Dir) => Err(FsError::Read {
                source: IoError::new(ErrorKind::Other, "is a directory"),
                path: path.to_path_buf(),
            }),
            None => Err(FsError::Read {
                source: IoError::from(ErrorKind::NotFound),
                path: path.to_path_buf(),
            }),
        }
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let normal = normalize(path);
        if let Some(parent) = normal.parent() {
            self.insert_dirs(parent).map_err(|err| FsError::CreateDir {
                source: err,
                path: parent.to_path_buf(),
            })?;
        }

        let mut nodes = self.nodes.borrow_mut();
        let executable = match nodes.get(&normal) {
            Some(Node::Dir) => {
                return Err(FsError::Write {
                    source: IoError::new(ErrorKind::Other, "is a directory"),
                    path: path.to_path_buf(),
                })
            }
            Some(Node::File { executable, .. }) => *executable,
            None => false,
        };
        nodes.insert(
            normal,
            Node::File {
                contents: contents.to_string(),
                executable,
            },
        );

        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.insert_dirs(&normalize(path))
            .map_err(|err| FsError::CreateDir {
                source: err,
                path: path.to_path_buf(),
            })
    }

    fn remove(&self, path: &Path) -> Result<bool> {
        let normal = normalize(path);
        let mut nodes = self.nodes.borrow_mut();
        if nodes.remove(&normal).is_none() {
            return Ok(false);
        }

        nodes.retain(|key, _| !key.starts_with(&normal));
        Ok(true)
    }

    fn remove_dir_if_empty(&self, path: &Path) -> Result<bool> {
        let normal = normalize(path);
        if !matches!(self.nodes.borrow().get(&normal), Some(Node::Dir)) {
            return Ok(false);
        }

        if !self.children(&normal).is_empty() {
            return Ok(false);
        }

        self.nodes.borrow_mut().remove(&normal);
        Ok(true)
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !self.is_dir(path) {
            return Err(FsError::ListDir {
                source: IoError::from(ErrorKind::NotFound),
                path: path.to_path_buf(),
            });
        }

        Ok(self.children(&normalize(path)))
    }

    fn set_executable(&self, dir: &Path) -> Result<()> {
        let normal = normalize(dir);
        let mut nodes = self.nodes.borrow_mut();
        for (path, node) in nodes.iter_mut() {
            if path.parent() != Some(normal.as_path()) {
                continue;
            }

            if let Node::File { executable, .. } = node {
                *executable = true;
            }
        }

        Ok(())
    }

    fn is_executable(&self, path: &Path) -> bool {
        matches!(
            self.nodes.borrow().get(&normalize(path)),
            Some(Node::File {
                executable: true,
                ..
            })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn write_creates_parent_directories() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::with_files([("a/b/c.txt", "hello")])?;

        assert!(fs.is_dir(Path::new("a")));
        assert!(fs.is_dir(Path::new("a/b")));
        assert_eq!(fs.read_to_string(Path::new("a/b/c.txt"))?, "hello");
        assert_eq!(fs.list_dir(Path::new("a"))?, vec![PathBuf::from("a/b")]);

        Ok(())
    }

    #[test]
    fn remove_dir_if_empty_respects_contents() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::with_files([("keep/user.txt", "mine")])?;
        fs.create_dir_all(Path::new("empty/nested"))?;

        assert!(!fs.remove_dir_if_empty(Path::new("keep"))?);
        assert!(!fs.remove_dir_if_empty(Path::new("empty"))?);
        assert!(fs.remove_dir_if_empty(Path::new("empty/nested"))?);
        assert!(fs.remove_dir_if_empty(Path::new("empty"))?);
        assert!(!fs.remove_dir_if_empty(Path::new("keep/user.txt"))?);

        let expect = BTreeMap::from([
            (PathBuf::from("keep"), None),
            (PathBuf::from("keep/user.txt"), Some("mine".to_string())),
        ]);
        assert_eq!(fs.snapshot(), expect);

        Ok(())
    }

    #[test]
    fn remove_deletes_whole_subtree() -> anyhow::Result<()> {
        let fs =
            MemoryFileSystem::with_files([("d/x/1.txt", "1"), ("d/2.txt", "2"), ("e.txt", "3")])?;

        assert!(fs.remove(Path::new("d"))?);
        assert!(!fs.remove(Path::new("d"))?);
        assert_eq!(fs.snapshot().into_keys().collect::<Vec<_>>(), vec![PathBuf::from("e.txt")]);

        Ok(())
    }

    #[test]
    fn write_through_file_fails() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::with_files([("a", "file")])?;

        let result = fs.write(Path::new("a/b.txt"), "nope");
        assert!(matches!(result, Err(FsError::CreateDir { .. })));

        Ok(())
    }

    #[test]
    fn set_executable_only_touches_direct_children() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::with_files([("hooks/run", ""), ("hooks/lib/util", "")])?;

        fs.set_executable(Path::new("hooks"))?;
        assert!(fs.is_executable(Path::new("hooks/run")));
        assert!(!fs.is_executable(Path::new("hooks/lib/util")));

        Ok(())
    }
}
