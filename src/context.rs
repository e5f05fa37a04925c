// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Project context.
//!
//! Information about the project being reconciled that drives generator skip
//! decisions and conditional package gating. The engine only _consumes_ this
//! information. Deciding which capabilities a project has is left to the
//! caller.

use git2::Repository;
use serde::Serialize;
use serde_json::Value;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::read_to_string,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Dependency tables of a `package.json` manifest.
const MANIFEST_DEPENDENCY_TABLES: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

/// Snapshot of the project being reconciled.
#[derive(Default, Debug, PartialEq, Eq, Clone, Serialize)]
pub struct ProjectContext {
    /// Absolute path to the project root.
    pub root: PathBuf,

    /// Detected capabilities of the project, e.g., "typescript" or "python".
    pub capabilities: BTreeMap<String, bool>,

    /// Names of currently installed dependencies.
    pub installed: BTreeSet<String>,

    /// Whether the project is under version control.
    pub vcs: bool,
}

impl ProjectContext {
    /// Construct new project context with nothing detected.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Detect basic project information at target root.
    ///
    /// Version control presence is determined by discovering a Git
    /// repository at or above the root. Installed dependency names are pulled
    /// from the dependency tables of `package.json` if it exists. Capability
    /// flags are never detected here.
    ///
    /// # Errors
    ///
    /// - Return [`ContextError::ReadManifest`] if manifest cannot be read.
    /// - Return [`ContextError::ParseManifest`] if manifest is not valid JSON.
    #[instrument(skip(root), level = "debug")]
    pub fn detect(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let vcs = Repository::discover(&root).is_ok();
        debug!("version control present at {:?}: {vcs}", root.display());

        let installed = installed_dependencies(&root.join("package.json"))?;
        debug!("found {} installed dependencies", installed.len());

        Ok(Self {
            root,
            capabilities: BTreeMap::new(),
            installed,
            vcs,
        })
    }

    /// Set capability flag.
    pub fn with_capability(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.capabilities.insert(name.into(), enabled);
        self
    }

    /// Mark listing of dependencies as installed.
    pub fn with_installed(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.installed.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set version control presence.
    pub fn with_vcs(mut self, vcs: bool) -> Self {
        self.vcs = vcs;
        self
    }

    /// Check if capability flag is set. Unknown capabilities count as unset.
    pub fn has_capability(&self, name: impl AsRef<str>) -> bool {
        self.capabilities
            .get(name.as_ref())
            .copied()
            .unwrap_or(false)
    }

    /// Check if dependency is installed.
    pub fn is_installed(&self, name: impl AsRef<str>) -> bool {
        self.installed.contains(name.as_ref())
    }
}

fn installed_dependencies(manifest: &Path) -> Result<BTreeSet<String>> {
    if !manifest.is_file() {
        return Ok(BTreeSet::new());
    }

    let data = read_to_string(manifest).map_err(|err| ContextError::ReadManifest {
        source: err,
        path: manifest.to_path_buf(),
    })?;
    let manifest_json: Value =
        serde_json::from_str(&data).map_err(|err| ContextError::ParseManifest {
            source: err,
            path: manifest.to_path_buf(),
        })?;

    let names = MANIFEST_DEPENDENCY_TABLES
        .iter()
        .filter_map(|table| manifest_json.get(table).and_then(Value::as_object))
        .flat_map(|table| table.keys().cloned())
        .collect();

    Ok(names)
}

/// Project context error types.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// Package manifest cannot be read.
    #[error("failed to read package manifest at {:?}", path.display())]
    ReadManifest {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Package manifest is not valid JSON.
    #[error("failed to parse package manifest at {:?}", path.display())]
    ParseManifest {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ContextError> = std::result::Result<T, E>;
