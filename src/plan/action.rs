// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Plan actions.

use crate::schema::definition::{JsonMergeDefinition, TextPatchDefinition};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

/// Single filesystem operation of a plan.
///
/// Actions are self-contained. Merge and patch actions carry their own
/// definition so that an action list can be executed without the schema that
/// produced it.
#[derive(Debug, Clone)]
pub enum Action {
    /// Create directory along with missing parents.
    CreateDir(PathBuf),

    /// Remove directory only if empty.
    RemoveDir(PathBuf),

    /// Write file content.
    Write { path: PathBuf, content: String },

    /// Remove file, or directory along with its contents.
    Remove(PathBuf),

    /// Make scripts inside of directories executable.
    Chmod(Vec<PathBuf>),

    /// Merge owned keys into JSON document.
    JsonMerge {
        path: PathBuf,
        definition: JsonMergeDefinition,
    },

    /// Strip owned keys from JSON document.
    JsonUnmerge {
        path: PathBuf,
        definition: JsonMergeDefinition,
    },

    /// Place owned block into text file.
    TextPatch {
        path: PathBuf,
        definition: TextPatchDefinition,
    },

    /// Remove owned block from text file.
    TextUnpatch {
        path: PathBuf,
        definition: TextPatchDefinition,
    },
}

impl Action {
    /// Short name of action kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateDir(_) => "mkdir",
            Self::RemoveDir(_) => "rmdir",
            Self::Write { .. } => "write",
            Self::Remove(_) => "rm",
            Self::Chmod(_) => "chmod",
            Self::JsonMerge { .. } => "json-merge",
            Self::JsonUnmerge { .. } => "json-unmerge",
            Self::TextPatch { .. } => "text-patch",
            Self::TextUnpatch { .. } => "text-unpatch",
        }
    }

    /// Paths the action operates on.
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            Self::CreateDir(path) | Self::RemoveDir(path) | Self::Remove(path) => vec![path],
            Self::Write { path, .. }
            | Self::JsonMerge { path, .. }
            | Self::JsonUnmerge { path, .. }
            | Self::TextPatch { path, .. }
            | Self::TextUnpatch { path, .. } => vec![path],
            Self::Chmod(paths) => paths.iter().map(PathBuf::as_path).collect(),
        }
    }
}

impl Display for Action {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.kind())?;
        for path in self.paths() {
            write!(fmt, " {}", path.display())?;
        }

        Ok(())
    }
}
