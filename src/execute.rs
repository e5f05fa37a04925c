// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Plan execution.
//!
//! Apply the actions of a [`Plan`] in strict order, and record what actually
//! changed. Execution stops at the first failing action. Actions already
//! applied stay applied.

use crate::{
    context::ProjectContext,
    fs::{Change, FileSystem, FsError},
    merge, patch,
    plan::{action::Action, Plan},
};

use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Observed outcome of executing a plan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Paths that were created.
    pub created: Vec<PathBuf>,

    /// Paths whose contents were replaced.
    pub updated: Vec<PathBuf>,

    /// Paths that were removed.
    pub removed: Vec<PathBuf>,
}

impl Outcome {
    fn record(&mut self, change: Option<Change>, path: &Path) {
        let path = path.to_path_buf();
        match change {
            Some(Change::Created) => self.created.push(path),
            Some(Change::Updated) => self.updated.push(path),
            Some(Change::Removed) => self.removed.push(path),
            None => {}
        }
    }
}

/// Execute plan against filesystem.
///
/// # Errors
///
/// - Return [`ExecuteError::Fs`] if any action fails.
#[instrument(skip_all, fields(mode = %plan.mode), level = "debug")]
pub fn execute<F>(plan: &Plan, ctx: &ProjectContext, fs: &F) -> Result<Outcome>
where
    F: FileSystem + ?Sized,
{
    let mut outcome = Outcome::default();
    for action in &plan.actions {
        debug!("apply {action}");
        apply(action, ctx, fs, &mut outcome)?;
    }

    info!(
        "applied {} ({} created, {} updated, {} removed)",
        plan.mode,
        outcome.created.len(),
        outcome.updated.len(),
        outcome.removed.len()
    );

    Ok(outcome)
}

fn apply<F>(action: &Action, ctx: &ProjectContext, fs: &F, outcome: &mut Outcome) -> Result<()>
where
    F: FileSystem + ?Sized,
{
    match action {
        Action::CreateDir(dir) => {
            let existed = fs.is_dir(dir);
            fs.create_dir_all(dir)?;
            if !existed {
                outcome.record(Some(Change::Created), dir);
            }
        }
        Action::RemoveDir(dir) => {
            if fs.remove_dir_if_empty(dir)? {
                outcome.record(Some(Change::Removed), dir);
            } else {
                debug!("keep non-empty directory {:?}", dir.display());
            }
        }
        Action::Write { path, content } => {
            let change = if fs.exists(path) {
                Change::Updated
            } else {
                Change::Created
            };
            fs.write(path, content)?;
            outcome.record(Some(change), path);
        }
        Action::Remove(path) => {
            if fs.remove(path)? {
                outcome.record(Some(Change::Removed), path);
            }
        }
        Action::Chmod(dirs) => {
            for dir in dirs.iter().filter(|dir| fs.is_dir(dir)) {
                fs.set_executable(dir)?;
            }
        }
        Action::JsonMerge { path, definition } => {
            let edit = merge::merge_edit(fs, path, definition, ctx)?;
            outcome.record(merge::commit(fs, path, edit)?, path);
        }
        Action::JsonUnmerge { path, definition } => {
            let edit = merge::unmerge_edit(fs, path, definition)?;
            outcome.record(merge::commit(fs, path, edit)?, path);
        }
        Action::TextPatch { path, definition } => {
            let edit = patch::patch_edit(fs, path, definition)?;
            outcome.record(patch::commit(fs, path, edit)?, path);
        }
        Action::TextUnpatch { path, definition } => {
            let edit = patch::unpatch_edit(fs, path, definition)?;
            outcome.record(patch::commit(fs, path, edit)?, path);
        }
    }

    Ok(())
}

/// Execution error types.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// Action failed on the filesystem.
    #[error(transparent)]
    Fs(#[from] FsError),
}

/// Friendly result alias :3
pub type Result<T, E = ExecuteError> = std::result::Result<T, E>;
