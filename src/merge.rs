// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! JSON merge primitives.
//!
//! Own a slice of a shared JSON document without overwriting the rest of it.
//! Keys are addressed through __dot-paths__, e.g., `scripts.lint` refers to
//! the `lint` key inside of the top-level `scripts` object.
//!
//! Merging and unmerging are split into two steps. First an [`Edit`] is
//! computed from the current document without touching it. Then the edit is
//! committed. The planner only ever performs the first step, which is how
//! dry runs stay consistent with real runs.

use crate::{
    context::ProjectContext,
    fs::{Change, Edit, FileSystem, Result},
    schema::definition::JsonMergeDefinition,
};

use serde_json::{Map, Value};
use std::path::Path;
use tracing::warn;

/// Top-level keys that carry no meaning on their own.
const INERT_KEYS: [&str; 1] = ["$schema"];

/// Set value at dot-path, creating intermediate objects as needed.
///
/// Intermediate values that are not objects get replaced by objects.
pub fn set_path(doc: &mut Value, key: &str, value: Value) {
    let mut parts: Vec<&str> = key.split('.').collect();
    let last = match parts.pop() {
        Some(last) => last,
        None => return,
    };

    let mut current = doc;
    for part in parts {
        current = as_object(current)
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    as_object(current).insert(last.to_string(), value);
}

/// Remove value at dot-path.
///
/// Parent objects that become empty because of the removal are pruned as
/// well. Returns the removed value, if any.
pub fn remove_path(doc: &mut Value, key: &str) -> Option<Value> {
    let parts: Vec<&str> = key.split('.').collect();
    remove_parts(doc, &parts)
}

fn remove_parts(value: &mut Value, parts: &[&str]) -> Option<Value> {
    let map = value.as_object_mut()?;
    match parts {
        [] => None,
        [last] => map.shift_remove(*last),
        [head, rest @ ..] => {
            let child = map.get_mut(*head)?;
            let removed = remove_parts(child, rest)?;
            if child.as_object().is_some_and(Map::is_empty) {
                map.shift_remove(*head);
            }
            Some(removed)
        }
    }
}

fn as_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }

    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

/// Check if document holds nothing meaningful.
///
/// A document is meaningfully empty when it is null, or an object whose only
/// keys are inert, e.g., `$schema`.
pub fn is_meaningfully_empty(doc: &Value) -> bool {
    match doc {
        Value::Null => true,
        Value::Object(map) => map.keys().all(|key| INERT_KEYS.contains(&key.as_str())),
        _ => false,
    }
}

/// Compute edit that merges owned keys into document at path.
///
/// Missing documents start out as an empty object, unless the definition
/// skips missing files. Documents whose root is not an object are left alone.
///
/// # Errors
///
/// - Return [`FsError::Read`] if document cannot be read.
/// - Return [`FsError::ParseJson`] if document is not valid JSON.
///
/// [`FsError::Read`]: crate::fs::FsError::Read
/// [`FsError::ParseJson`]: crate::fs::FsError::ParseJson
pub fn merge_edit<F>(
    fs: &F,
    path: &Path,
    definition: &JsonMergeDefinition,
    ctx: &ProjectContext,
) -> Result<Edit<Value>>
where
    F: FileSystem + ?Sized,
{
    let existing = match fs.read_json(path)? {
        Some(existing) => existing,
        None if definition.skips_if_missing() => return Ok(Edit::Keep),
        None => return Ok(Edit::Create(definition.merge(Value::Object(Map::new()), ctx))),
    };

    if !existing.is_object() {
        warn!("JSON document at {:?} is not an object, leaving it", path.display());
        return Ok(Edit::Keep);
    }

    let merged = definition.merge(existing.clone(), ctx);
    if merged == existing {
        return Ok(Edit::Keep);
    }

    Ok(Edit::Update(merged))
}

/// Compute edit that strips owned keys from document at path.
///
/// Missing documents are left alone. Documents left meaningfully empty are
/// deleted if the definition asks for it.
///
/// # Errors
///
/// - Return [`FsError::Read`] if document cannot be read.
/// - Return [`FsError::ParseJson`] if document is not valid JSON.
///
/// [`FsError::Read`]: crate::fs::FsError::Read
/// [`FsError::ParseJson`]: crate::fs::FsError::ParseJson
pub fn unmerge_edit<F>(fs: &F, path: &Path, definition: &JsonMergeDefinition) -> Result<Edit<Value>>
where
    F: FileSystem + ?Sized,
{
    let existing = match fs.read_json(path)? {
        Some(existing) if existing.is_object() => existing,
        Some(_) => {
            warn!("JSON document at {:?} is not an object, leaving it", path.display());
            return Ok(Edit::Keep);
        }
        None => return Ok(Edit::Keep),
    };

    let unmerged = definition.unmerge(existing.clone());
    if definition.removes_file_if_empty() && is_meaningfully_empty(&unmerged) {
        return Ok(Edit::Delete);
    }

    if unmerged == existing {
        return Ok(Edit::Keep);
    }

    Ok(Edit::Update(unmerged))
}

/// Commit JSON edit to document at path.
///
/// # Errors
///
/// - Return [`FsError::Write`] if document cannot be written.
/// - Return [`FsError::Remove`] if document cannot be deleted.
///
/// [`FsError::Write`]: crate::fs::FsError::Write
/// [`FsError::Remove`]: crate::fs::FsError::Remove
pub fn commit<F>(fs: &F, path: &Path, edit: Edit<Value>) -> Result<Option<Change>>
where
    F: FileSystem + ?Sized,
{
    let change = edit.change();
    match edit {
        Edit::Keep => {}
        Edit::Create(doc) | Edit::Update(doc) => fs.write_json(path, &doc)?,
        Edit::Delete => {
            fs.remove(path)?;
        }
    }

    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory::MemoryFileSystem;
    use indoc::indoc;
    use serde_json::json;
    use simple_test_case::test_case;

    fn lint_scripts() -> JsonMergeDefinition {
        JsonMergeDefinition::set_keys([
            ("scripts.lint", json!("rigging lint")),
            ("scripts.lint:fix", json!("rigging lint --fix")),
            ("rigging.version", json!(2)),
        ])
    }

    #[test_case(json!({}); "empty document")]
    #[test_case(json!({ "name": "demo", "scripts": { "test": "jest" } }); "unrelated keys")]
    #[test_case(
        json!({
            "scripts": { "lint": "eslint .", "build": "tsc" },
            "rigging": { "version": 1, "extra": true },
        });
        "owned keys with stale values"
    )]
    #[test]
    fn merge_is_idempotent_and_reversible(existing: Value) {
        let definition = lint_scripts();
        let ctx = ProjectContext::default();

        let merged = definition.merge(existing.clone(), &ctx);
        pretty_assertions::assert_eq!(definition.merge(merged.clone(), &ctx), merged);

        let restored = definition.unmerge(merged);
        let mut expect = existing;
        for key in definition.owned_keys() {
            remove_path(&mut expect, key);
        }
        pretty_assertions::assert_eq!(restored, expect);
    }

    #[test]
    fn unmerge_prunes_parent_emptied_by_owned_keys() {
        let definition = lint_scripts();
        let existing = json!({ "name": "demo", "scripts": {} });

        let merged = definition.merge(existing, &ProjectContext::default());
        pretty_assertions::assert_eq!(merged["scripts"]["lint"], json!("rigging lint"));

        // Once owned keys are gone, no trace of their parent is kept.
        let restored = definition.unmerge(merged);
        pretty_assertions::assert_eq!(restored, json!({ "name": "demo" }));
    }

    #[test]
    fn set_path_keeps_sibling_order() {
        let mut doc = json!({ "a": 1, "scripts": { "test": "jest" }, "z": 2 });
        set_path(&mut doc, "scripts.lint", json!("eslint ."));
        set_path(&mut doc, "a", json!(10));

        let result = serde_json::to_string(&doc).unwrap();
        pretty_assertions::assert_eq!(
            result,
            r#"{"a":10,"scripts":{"test":"jest","lint":"eslint ."},"z":2}"#,
        );
    }

    #[test]
    fn remove_path_prunes_emptied_parents() {
        let mut doc = json!({ "a": { "b": { "c": 1 } }, "d": { "e": 1, "f": 2 } });

        pretty_assertions::assert_eq!(remove_path(&mut doc, "a.b.c"), Some(json!(1)));
        pretty_assertions::assert_eq!(remove_path(&mut doc, "d.e"), Some(json!(1)));
        pretty_assertions::assert_eq!(remove_path(&mut doc, "x.y"), None);
        pretty_assertions::assert_eq!(doc, json!({ "d": { "f": 2 } }));
    }

    #[test_case(json!({}), true; "empty object")]
    #[test_case(json!({ "$schema": "https://example.com/schema.json" }), true; "only schema key")]
    #[test_case(json!({ "rules": {} }), false; "empty nested object")]
    #[test_case(json!(null), true; "null")]
    #[test_case(json!([]), false; "array")]
    #[test]
    fn meaningfully_empty(doc: Value, expect: bool) {
        pretty_assertions::assert_eq!(is_meaningfully_empty(&doc), expect);
    }

    #[test]
    fn merge_edit_respects_skip_if_missing() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::new();
        let ctx = ProjectContext::default();
        let path = Path::new("tsconfig.json");

        let skipping = lint_scripts().with_skip_if_missing(true);
        pretty_assertions::assert_eq!(merge_edit(&fs, path, &skipping, &ctx)?, Edit::Keep);

        let creating = lint_scripts();
        let edit = merge_edit(&fs, path, &creating, &ctx)?;
        pretty_assertions::assert_eq!(edit.change(), Some(Change::Created));

        Ok(())
    }

    #[test]
    fn merge_edit_skips_identical_documents() -> anyhow::Result<()> {
        // Formatting differs from what rigging would write, but keys match.
        let fs = MemoryFileSystem::with_files([(
            "package.json",
            r#"{"scripts":{"lint":"rigging lint","lint:fix":"rigging lint --fix"},"rigging":{"version":2}}"#,
        )])?;

        let edit = merge_edit(
            &fs,
            Path::new("package.json"),
            &lint_scripts(),
            &ProjectContext::default(),
        )?;
        pretty_assertions::assert_eq!(edit, Edit::Keep);

        Ok(())
    }

    #[test]
    fn unmerge_edit_deletes_meaningfully_empty_documents() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::with_files([(
            ".rigging.json",
            indoc! {r#"
                {
                  "$schema": "https://example.com/rigging.json",
                  "rigging": { "version": 2 }
                }
            "#},
        )])?;
        let path = Path::new(".rigging.json");
        let definition = JsonMergeDefinition::set_keys([("rigging.version", json!(2))]);

        let keeping = unmerge_edit(&fs, path, &definition)?;
        pretty_assertions::assert_eq!(
            keeping,
            Edit::Update(json!({ "$schema": "https://example.com/rigging.json" }))
        );

        let deleting = definition.with_remove_file_if_empty(true);
        let edit = unmerge_edit(&fs, path, &deleting)?;
        pretty_assertions::assert_eq!(edit, Edit::Delete);
        pretty_assertions::assert_eq!(commit(&fs, path, edit)?, Some(Change::Removed));
        assert!(!fs.exists(path));

        Ok(())
    }

    #[test]
    fn non_object_documents_are_left_alone() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::with_files([("list.json", "[1, 2, 3]\n")])?;
        let path = Path::new("list.json");
        let ctx = ProjectContext::default();

        pretty_assertions::assert_eq!(merge_edit(&fs, path, &lint_scripts(), &ctx)?, Edit::Keep);
        pretty_assertions::assert_eq!(unmerge_edit(&fs, path, &lint_scripts())?, Edit::Keep);

        Ok(())
    }

    #[test]
    fn commit_writes_pretty_json() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::new();
        let path = Path::new("package.json");

        let change = commit(&fs, path, Edit::Create(json!({ "scripts": { "lint": "x" } })))?;
        pretty_assertions::assert_eq!(change, Some(Change::Created));

        let expect = indoc! {r#"
            {
              "scripts": {
                "lint": "x"
              }
            }
        "#};
        pretty_assertions::assert_eq!(fs.read_to_string(path)?, expect);

        Ok(())
    }
}
