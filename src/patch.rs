// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Text patch primitives.
//!
//! Own a block of text inside of a shared text file, e.g., a few lines in
//! `.gitignore`. Each block carries a __marker__ substring that detects
//! whether the block was already applied, and locates the block for removal.
//!
//! # Drift
//!
//! Blocks change between schema versions. Thus, the block currently sitting
//! in a user's file may not match the block rigging would write today.
//! Removal first tries to cut out the exact block. If that fails, every line
//! holding the marker is dropped instead.

use crate::{
    fs::{Change, Edit, FileSystem, Result},
    schema::definition::{PatchOperation, TextPatchDefinition},
};

use std::path::Path;

/// Apply patch to text.
///
/// Returns nothing if the marker is already present.
pub fn patch_text(existing: &str, definition: &TextPatchDefinition) -> Option<String> {
    if existing.contains(&definition.marker) {
        return None;
    }

    let patched = match definition.operation {
        PatchOperation::Prepend => format!("{}{existing}", definition.content),
        PatchOperation::Append => format!("{existing}{}", definition.content),
    };

    Some(patched)
}

/// Remove patch from text.
///
/// Returns nothing if neither the block nor its marker can be found.
pub fn unpatch_text(existing: &str, definition: &TextPatchDefinition) -> Option<String> {
    let mut result = existing.to_string();
    if !definition.content.is_empty() {
        result = result.replace(&definition.content, "");
    }

    // INVARIANT: Only filter by marker if the exact block was not found.
    if result == existing && !definition.marker.is_empty() && result.contains(&definition.marker) {
        result = drop_marker_lines(&result, &definition.marker);
    }

    if result == existing {
        return None;
    }

    Some(result)
}

fn drop_marker_lines(text: &str, marker: &str) -> String {
    // INVARIANT: Kept lines retain their own line endings.
    text.split_inclusive('\n')
        .filter(|line| !line.contains(marker))
        .skip_while(|line| line.trim().is_empty())
        .collect()
}

/// Compute edit that applies patch to file at path.
///
/// Missing files count as empty when the patch creates missing files, and
/// are left alone otherwise.
///
/// # Errors
///
/// - Return [`FsError::Read`] if file cannot be read.
///
/// [`FsError::Read`]: crate::fs::FsError::Read
pub fn patch_edit<F>(fs: &F, path: &Path, definition: &TextPatchDefinition) -> Result<Edit<String>>
where
    F: FileSystem + ?Sized,
{
    if !fs.exists(path) {
        if !definition.create_if_missing {
            return Ok(Edit::Keep);
        }

        return Ok(patch_text("", definition).map_or(Edit::Keep, Edit::Create));
    }

    let existing = fs.read_to_string(path)?;
    Ok(patch_text(&existing, definition).map_or(Edit::Keep, Edit::Update))
}

/// Compute edit that removes patch from file at path.
///
/// Missing files are left alone. Files left with nothing but whitespace are
/// deleted if the definition asks for it.
///
/// # Errors
///
/// - Return [`FsError::Read`] if file cannot be read.
///
/// [`FsError::Read`]: crate::fs::FsError::Read
pub fn unpatch_edit<F>(
    fs: &F,
    path: &Path,
    definition: &TextPatchDefinition,
) -> Result<Edit<String>>
where
    F: FileSystem + ?Sized,
{
    if !fs.exists(path) {
        return Ok(Edit::Keep);
    }

    let existing = fs.read_to_string(path)?;
    let unpatched = match unpatch_text(&existing, definition) {
        Some(unpatched) => unpatched,
        None => return Ok(Edit::Keep),
    };

    if definition.remove_file_if_empty && unpatched.trim().is_empty() {
        return Ok(Edit::Delete);
    }

    Ok(Edit::Update(unpatched))
}

/// Commit text edit to file at path.
///
/// # Errors
///
/// - Return [`FsError::Write`] if file cannot be written.
/// - Return [`FsError::Remove`] if file cannot be deleted.
///
/// [`FsError::Write`]: crate::fs::FsError::Write
/// [`FsError::Remove`]: crate::fs::FsError::Remove
pub fn commit<F>(fs: &F, path: &Path, edit: Edit<String>) -> Result<Option<Change>>
where
    F: FileSystem + ?Sized,
{
    let change = edit.change();
    match edit {
        Edit::Keep => {}
        Edit::Create(text) | Edit::Update(text) => fs.write(path, &text)?,
        Edit::Delete => {
            fs.remove(path)?;
        }
    }

    Ok(change)
}
