// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Declarative desired state.
//!
//! A [`Schema`] describes everything a piece of dev-tooling wants present in a
//! project. It is pure data. Nothing in here touches the filesystem.
//!
//! # Directory Tiers
//!
//! Directories belong to one of three tiers:
//!
//! - __Owned__ directories are created on install and removed on uninstall.
//! - __Shared__ directories are created on install, but never removed.
//! - __Preserved__ directories are created on install, and only removed on
//!   uninstall if they are empty.
//!
//! Each directory listing is ordered parent-before-child. Deletion walks them
//! in reverse.
//!
//! # File Tiers
//!
//! Files are either __owned__ or __managed__. Owned files are rewritten
//! whenever their resolved content drifts from what is on disk. Managed files
//! are only created when absent, and never touched afterwards.
//!
//! Shared files are handled through JSON merges and text patches instead,
//! which only own a slice of the file.

pub mod definition;

use crate::{
    path::{depth, ensure_relative, PathError},
    schema::definition::{FileDefinition, JsonMergeDefinition, TextPatchDefinition},
    template::TemplateRegistry,
};

use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

/// Packages wanted by a schema.
///
/// The engine never installs anything itself. It only reports which packages
/// a caller should install or remove through its package manager.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PackageTable {
    /// Packages that are always wanted.
    #[serde(default)]
    pub base: Vec<String>,

    /// Extra packages wanted only when a capability flag is set.
    #[serde(default)]
    pub conditional: BTreeMap<String, Vec<String>>,

    /// Packages wanted only when the project is under version control.
    #[serde(default)]
    pub vcs_only: Vec<String>,
}

impl PackageTable {
    /// Check if package only applies under version control.
    pub fn is_vcs_only(&self, name: impl AsRef<str>) -> bool {
        self.vcs_only.iter().any(|pkg| pkg == name.as_ref())
    }

    /// Every package the table could ever ask for, in declaration order.
    pub fn all(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.base
            .iter()
            .chain(self.vcs_only.iter())
            .chain(self.conditional.values().flatten())
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }
}

/// Versioned description of desired project state.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Version of the schema. Threaded through template rendering and the
    /// version marker.
    pub version: String,

    /// Fully controlled directories.
    pub owned_dirs: Vec<PathBuf>,

    /// Directories that are created but never deleted.
    pub shared_dirs: Vec<PathBuf>,

    /// Directories that are only deleted when empty.
    pub preserved_dirs: Vec<PathBuf>,

    /// Path prefixes that only apply under version control.
    pub vcs_paths: Vec<PathBuf>,

    /// Directories whose files should be executable.
    pub script_dirs: Vec<PathBuf>,

    /// Files left behind by prior schema versions.
    pub deprecated_files: Vec<PathBuf>,

    /// Directories left behind by prior schema versions.
    pub deprecated_dirs: Vec<PathBuf>,

    /// Packages wanted by prior schema versions, but not anymore.
    pub deprecated_packages: Vec<String>,

    /// Files rewritten whenever their content drifts.
    pub owned_files: BTreeMap<PathBuf, FileDefinition>,

    /// Files created once, and never overwritten.
    pub managed_files: BTreeMap<PathBuf, FileDefinition>,

    /// Owned slices of shared JSON documents.
    pub json_merges: BTreeMap<PathBuf, JsonMergeDefinition>,

    /// Owned blocks of shared text files.
    pub text_patches: BTreeMap<PathBuf, TextPatchDefinition>,

    /// Packages wanted by the schema.
    pub packages: PackageTable,

    /// Templates that file definitions can reference.
    pub templates: TemplateRegistry,
}

impl Schema {
    /// Start building new schema.
    pub fn builder(version: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(version)
    }

    /// Check if path only applies under version control.
    pub fn is_vcs_path(&self, path: impl AsRef<Path>) -> bool {
        self.vcs_paths
            .iter()
            .any(|prefix| path.as_ref().starts_with(prefix))
    }

    /// Check if directory is listed in any directory tier.
    pub fn is_listed_dir(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.owned_dirs
            .iter()
            .chain(self.shared_dirs.iter())
            .chain(self.preserved_dirs.iter())
            .any(|dir| dir == path)
    }

    /// Every listed directory ordered parent-before-child across all tiers.
    pub fn all_dirs(&self) -> Vec<&Path> {
        let mut seen = BTreeSet::new();
        let mut dirs: Vec<&Path> = self
            .owned_dirs
            .iter()
            .chain(self.shared_dirs.iter())
            .chain(self.preserved_dirs.iter())
            .map(PathBuf::as_path)
            .filter(|dir| seen.insert(*dir))
            .collect();
        // INVARIANT: Stable sort keeps declaration order among equal depths.
        dirs.sort_by_key(|dir| depth(dir));
        dirs
    }

    /// Check schema invariants.
    ///
    /// # Errors
    ///
    /// - Return [`SchemaError::InvalidPath`] if any path is not relative to
    ///   the project root.
    /// - Return [`SchemaError::DuplicateDir`] if a directory repeats in a
    ///   listing.
    /// - Return [`SchemaError::ChildBeforeParent`] if a directory listing is
    ///   not ordered parent-before-child.
    /// - Return [`SchemaError::DirInManyTiers`] if a directory is listed in
    ///   more than one tier.
    /// - Return [`SchemaError::ConflictingPath`] if a path is claimed by more
    ///   than one of the file, merge, or patch maps.
    /// - Return [`SchemaError::DeprecatedStillClaimed`] if a deprecated path
    ///   covers a live file or directory.
    pub fn validate(&self) -> Result<()> {
        let mut tiers: BTreeMap<&Path, &'static str> = BTreeMap::new();
        for (tier, dirs) in [
            ("owned", &self.owned_dirs),
            ("shared", &self.shared_dirs),
            ("preserved", &self.preserved_dirs),
        ] {
            validate_dir_listing(tier, dirs)?;
            for dir in dirs {
                if let Some(first) = tiers.insert(dir.as_path(), tier) {
                    return Err(SchemaError::DirInManyTiers {
                        path: dir.clone(),
                        first,
                        second: tier,
                    });
                }
            }
        }

        for path in self
            .vcs_paths
            .iter()
            .chain(self.script_dirs.iter())
            .chain(self.deprecated_files.iter())
            .chain(self.deprecated_dirs.iter())
        {
            ensure_relative(path)?;
        }

        let mut claimed: BTreeMap<&Path, &'static str> = BTreeMap::new();
        let claims = self
            .owned_files
            .keys()
            .map(|path| (path, "owned files"))
            .chain(self.managed_files.keys().map(|path| (path, "managed files")))
            .chain(self.json_merges.keys().map(|path| (path, "JSON merges")))
            .chain(self.text_patches.keys().map(|path| (path, "text patches")));
        for (path, kind) in claims {
            ensure_relative(path)?;
            if let Some(first) = claimed.insert(path.as_path(), kind) {
                return Err(SchemaError::ConflictingPath {
                    path: path.clone(),
                    first,
                    second: kind,
                });
            }
        }

        // INVARIANT: Deprecated paths never overlap live ones, or upgrades
        // would keep deleting and recreating the same files.
        for deprecated in self.deprecated_files.iter().chain(self.deprecated_dirs.iter()) {
            let live = claimed
                .keys()
                .copied()
                .chain(self.all_dirs())
                .find(|path| path.starts_with(deprecated));
            if let Some(live) = live {
                return Err(SchemaError::DeprecatedStillClaimed {
                    deprecated: deprecated.clone(),
                    path: live.to_path_buf(),
                });
            }
        }

        Ok(())
    }
}

fn validate_dir_listing(tier: &'static str, dirs: &[PathBuf]) -> Result<()> {
    for (index, dir) in dirs.iter().enumerate() {
        ensure_relative(dir)?;
        for earlier in &dirs[..index] {
            if earlier == dir {
                return Err(SchemaError::DuplicateDir {
                    tier,
                    path: dir.clone(),
                });
            }

            if earlier.starts_with(dir) {
                return Err(SchemaError::ChildBeforeParent {
                    tier,
                    child: earlier.clone(),
                    parent: dir.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Incremental schema construction.
///
/// Collects schema entries, and checks every schema invariant once
/// [`SchemaBuilder::build`] is called.
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: Schema,
    conflicts: Vec<(PathBuf, &'static str)>,
}

impl SchemaBuilder {
    /// Construct new schema builder for a schema version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            schema: Schema {
                version: version.into(),
                owned_dirs: Vec::new(),
                shared_dirs: Vec::new(),
                preserved_dirs: Vec::new(),
                vcs_paths: Vec::new(),
                script_dirs: Vec::new(),
                deprecated_files: Vec::new(),
                deprecated_dirs: Vec::new(),
                deprecated_packages: Vec::new(),
                owned_files: BTreeMap::new(),
                managed_files: BTreeMap::new(),
                json_merges: BTreeMap::new(),
                text_patches: BTreeMap::new(),
                packages: PackageTable::default(),
                templates: TemplateRegistry::new(),
            },
            conflicts: Vec::new(),
        }
    }

    pub fn owned_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema.owned_dirs.push(path.into());
        self
    }

    pub fn shared_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema.shared_dirs.push(path.into());
        self
    }

    pub fn preserved_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema.preserved_dirs.push(path.into());
        self
    }

    /// Mark path prefix as only applying under version control.
    pub fn vcs_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema.vcs_paths.push(path.into());
        self
    }

    /// Mark directory as holding scripts that must be executable.
    pub fn script_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema.script_dirs.push(path.into());
        self
    }

    pub fn deprecated_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema.deprecated_files.push(path.into());
        self
    }

    pub fn deprecated_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema.deprecated_dirs.push(path.into());
        self
    }

    pub fn deprecated_package(mut self, name: impl Into<String>) -> Self {
        self.schema.deprecated_packages.push(name.into());
        self
    }

    pub fn owned_file(mut self, path: impl Into<PathBuf>, definition: FileDefinition) -> Self {
        let path = path.into();
        if self.schema.owned_files.insert(path.clone(), definition).is_some() {
            self.conflicts.push((path, "owned files"));
        }
        self
    }

    pub fn managed_file(mut self, path: impl Into<PathBuf>, definition: FileDefinition) -> Self {
        let path = path.into();
        if self.schema.managed_files.insert(path.clone(), definition).is_some() {
            self.conflicts.push((path, "managed files"));
        }
        self
    }

    pub fn json_merge(mut self, path: impl Into<PathBuf>, definition: JsonMergeDefinition) -> Self {
        let path = path.into();
        if self.schema.json_merges.insert(path.clone(), definition).is_some() {
            self.conflicts.push((path, "JSON merges"));
        }
        self
    }

    pub fn text_patch(mut self, path: impl Into<PathBuf>, definition: TextPatchDefinition) -> Self {
        let path = path.into();
        if self.schema.text_patches.insert(path.clone(), definition).is_some() {
            self.conflicts.push((path, "text patches"));
        }
        self
    }

    /// Record schema version in a plain-text owned file.
    pub fn version_marker(self, path: impl Into<PathBuf>) -> Self {
        let content = format!("{}\n", self.schema.version);
        self.owned_file(path, FileDefinition::content(content))
    }

    pub fn base_package(mut self, name: impl Into<String>) -> Self {
        self.schema.packages.base.push(name.into());
        self
    }

    pub fn conditional_package(
        mut self,
        capability: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.schema
            .packages
            .conditional
            .entry(capability.into())
            .or_default()
            .push(name.into());
        self
    }

    pub fn vcs_package(mut self, name: impl Into<String>) -> Self {
        self.schema.packages.vcs_only.push(name.into());
        self
    }

    /// Replace entire package table.
    pub fn packages(mut self, packages: PackageTable) -> Self {
        self.schema.packages = packages;
        self
    }

    /// Use template registry for template references.
    pub fn templates(mut self, templates: TemplateRegistry) -> Self {
        self.schema.templates = templates;
        self
    }

    /// Finish building schema.
    ///
    /// # Errors
    ///
    /// - Return [`SchemaError::DuplicatePath`] if a path was added twice to
    ///   the same map.
    /// - Return any error of [`Schema::validate`].
    pub fn build(self) -> Result<Schema> {
        if let Some((path, kind)) = self.conflicts.into_iter().next() {
            return Err(SchemaError::DuplicatePath { path, kind });
        }

        self.schema.validate()?;
        Ok(self.schema)
    }
}

/// Schema error types.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Path is not relative to the project root.
    #[error(transparent)]
    InvalidPath(#[from] PathError),

    /// Directory appears twice in the same tier.
    #[error("directory {:?} listed twice in {tier} directories", path.display())]
    DuplicateDir { tier: &'static str, path: PathBuf },

    /// Directory listed in more than one tier.
    #[error("directory {:?} listed in both {first} and {second} directories", path.display())]
    DirInManyTiers {
        path: PathBuf,
        first: &'static str,
        second: &'static str,
    },

    /// Child directory listed before its parent.
    #[error(
        "{tier} directory {:?} listed before its parent {:?}",
        child.display(),
        parent.display()
    )]
    ChildBeforeParent {
        tier: &'static str,
        child: PathBuf,
        parent: PathBuf,
    },

    /// Path added twice to the same map.
    #[error("path {:?} added twice to {kind}", path.display())]
    DuplicatePath { path: PathBuf, kind: &'static str },

    /// Path claimed by more than one map.
    #[error("path {:?} claimed by both {first} and {second}", path.display())]
    ConflictingPath {
        path: PathBuf,
        first: &'static str,
        second: &'static str,
    },

    /// Deprecated path still covers a live path.
    #[error(
        "deprecated path {:?} still covers live path {:?}",
        deprecated.display(),
        path.display()
    )]
    DeprecatedStillClaimed { deprecated: PathBuf, path: PathBuf },
}

/// Friendly result alias :3
pub type Result<T, E = SchemaError> = std::result::Result<T, E>;
