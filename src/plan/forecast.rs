// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Outcome prediction for plans.

use crate::fs::{Change, FileSystem, Result};

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

/// Predicted outcome of a plan.
///
/// Tracks what each planned action is expected to change, including paths
/// that will be gone by the time a later action runs. This lets the planner
/// tell whether a directory will be empty once earlier removals happen.
#[derive(Debug, Default, Clone)]
pub(crate) struct Forecast {
    pub(crate) created: Vec<PathBuf>,
    pub(crate) updated: Vec<PathBuf>,
    pub(crate) removed: Vec<PathBuf>,
    gone: BTreeSet<PathBuf>,
}

impl Forecast {
    /// Record predicted change to path.
    pub(crate) fn record(&mut self, change: Change, path: &Path) {
        let path = path.to_path_buf();
        match change {
            Change::Created => self.created.push(path),
            Change::Updated => self.updated.push(path),
            Change::Removed => {
                self.gone.insert(path.clone());
                self.removed.push(path);
            }
        }
    }

    /// Check if path is predicted to be removed by an earlier action.
    pub(crate) fn is_gone(&self, path: &Path) -> bool {
        self.gone.contains(path)
    }

    /// Check if directory will be empty by the time the next action runs.
    pub(crate) fn will_be_empty<F>(&self, fs: &F, dir: &Path) -> Result<bool>
    where
        F: FileSystem + ?Sized,
    {
        Ok(fs
            .list_dir(dir)?
            .iter()
            .all(|child| self.gone.contains(child)))
    }
}
