// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Content definitions.
//!
//! Definitions describe _what_ should end up inside of a path, not how it gets
//! there. A [`FileDefinition`] resolves to the full content of a file, a
//! [`JsonMergeDefinition`] owns a slice of a shared JSON document, and a
//! [`TextPatchDefinition`] owns a block of text inside of a shared text file.

use crate::{
    context::ProjectContext,
    merge::{remove_path, set_path},
    template::{Result as TemplateResult, TemplateRegistry},
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

/// Content generator. Returning nothing means the file does not apply to the
/// project and should be skipped.
pub type Generator = Arc<dyn Fn(&ProjectContext) -> Option<String> + Send + Sync>;

/// Merge owned keys into an existing JSON document.
pub type MergeFn = Arc<dyn Fn(Value, &ProjectContext) -> Value + Send + Sync>;

/// Strip owned keys from an existing JSON document.
pub type UnmergeFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Source of a file's content.
///
/// Every file definition resolves to a string at plan time, or to nothing if
/// the file does not apply to the project being reconciled.
#[derive(Clone)]
pub enum FileDefinition {
    /// Reference to a template in the schema's [`TemplateRegistry`].
    Template(String),

    /// Static content.
    Content(String),

    /// Content computed on demand.
    Lazy(fn() -> String),

    /// Content computed from the project context.
    Generator(Generator),

    /// Inner definition that only applies when a capability flag is set.
    Gated {
        capability: String,
        inner: Box<FileDefinition>,
    },
}

impl FileDefinition {
    /// Construct template reference.
    pub fn template(id: impl Into<String>) -> Self {
        Self::Template(id.into())
    }

    /// Construct static content.
    pub fn content(content: impl Into<String>) -> Self {
        Self::Content(content.into())
    }

    /// Construct lazily computed content.
    pub fn lazy(content: fn() -> String) -> Self {
        Self::Lazy(content)
    }

    /// Construct content generator.
    pub fn generator<G>(generator: G) -> Self
    where
        G: Fn(&ProjectContext) -> Option<String> + Send + Sync + 'static,
    {
        Self::Generator(Arc::new(generator))
    }

    /// Gate definition behind a capability flag.
    pub fn gated(capability: impl Into<String>, inner: FileDefinition) -> Self {
        Self::Gated {
            capability: capability.into(),
            inner: Box::new(inner),
        }
    }

    /// Resolve definition into file content.
    ///
    /// Returns nothing if the file should be skipped for the project.
    ///
    /// # Errors
    ///
    /// - Return [`TemplateError::Unknown`] if a referenced template does not
    ///   exist.
    /// - Return [`TemplateError::Render`] if a referenced template cannot be
    ///   rendered.
    ///
    /// [`TemplateError::Unknown`]: crate::template::TemplateError::Unknown
    /// [`TemplateError::Render`]: crate::template::TemplateError::Render
    pub fn resolve(
        &self,
        ctx: &ProjectContext,
        templates: &TemplateRegistry,
        version: &str,
    ) -> TemplateResult<Option<String>> {
        match self {
            Self::Template(id) => templates.render(id, ctx, version).map(Some),
            Self::Content(content) => Ok(Some(content.clone())),
            Self::Lazy(content) => Ok(Some(content())),
            Self::Generator(generator) => Ok(generator(ctx)),
            Self::Gated { capability, inner } => {
                if !ctx.has_capability(capability) {
                    return Ok(None);
                }
                inner.resolve(ctx, templates, version)
            }
        }
    }
}

impl Debug for FileDefinition {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Template(id) => fmt.debug_tuple("Template").field(id).finish(),
            Self::Content(content) => fmt.debug_tuple("Content").field(content).finish(),
            Self::Lazy(_) => fmt.write_str("Lazy(..)"),
            Self::Generator(_) => fmt.write_str("Generator(..)"),
            Self::Gated { capability, inner } => fmt
                .debug_struct("Gated")
                .field("capability", capability)
                .field("inner", inner)
                .finish(),
        }
    }
}

/// Ownership of a slice of a shared JSON document.
///
/// # Invariants
///
/// - `merge(merge(x)) == merge(x)`.
/// - Merging never disturbs keys outside of the owned keys.
/// - Unmerging removes exactly the owned keys.
#[derive(Clone)]
pub struct JsonMergeDefinition {
    owned_keys: Vec<String>,
    merge: MergeFn,
    unmerge: UnmergeFn,
    remove_file_if_empty: bool,
    skip_if_missing: bool,
}

impl JsonMergeDefinition {
    /// Own a listing of dot-path keys with fixed values.
    ///
    /// Merging sets each key to its value, and unmerging removes each key
    /// along with any parent object left empty by that removal.
    pub fn set_keys(keys: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        let keys: Vec<(String, Value)> = keys.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let owned_keys: Vec<String> = keys.iter().map(|(key, _)| key.clone()).collect();
        let merge_keys = keys.clone();
        let unmerge_keys = keys.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

        Self::custom(
            owned_keys,
            move |mut doc, _| {
                for (key, value) in &merge_keys {
                    set_path(&mut doc, key, value.clone());
                }
                doc
            },
            move |mut doc| {
                for key in &unmerge_keys {
                    remove_path(&mut doc, key);
                }
                doc
            },
        )
    }

    /// Own a listing of dot-path keys through custom merge functions.
    pub fn custom<M, U>(
        owned_keys: impl IntoIterator<Item = impl Into<String>>,
        merge: M,
        unmerge: U,
    ) -> Self
    where
        M: Fn(Value, &ProjectContext) -> Value + Send + Sync + 'static,
        U: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self {
            owned_keys: owned_keys.into_iter().map(Into::into).collect(),
            merge: Arc::new(merge),
            unmerge: Arc::new(unmerge),
            remove_file_if_empty: false,
            skip_if_missing: false,
        }
    }

    /// Delete file when unmerging leaves nothing meaningful behind.
    pub fn with_remove_file_if_empty(mut self, enabled: bool) -> Self {
        self.remove_file_if_empty = enabled;
        self
    }

    /// Never create file if it does not already exist.
    pub fn with_skip_if_missing(mut self, enabled: bool) -> Self {
        self.skip_if_missing = enabled;
        self
    }

    /// Dot-path keys owned by this definition.
    pub fn owned_keys(&self) -> &[String] {
        self.owned_keys.as_slice()
    }

    /// Check if file gets deleted when unmerging leaves it empty.
    pub fn removes_file_if_empty(&self) -> bool {
        self.remove_file_if_empty
    }

    /// Check if missing file is left alone.
    pub fn skips_if_missing(&self) -> bool {
        self.skip_if_missing
    }

    /// Merge owned keys into document.
    ///
    /// Documents whose root is not an object are replaced by an empty object
    /// before merging.
    pub fn merge(&self, existing: Value, ctx: &ProjectContext) -> Value {
        let existing = match existing {
            Value::Object(_) => existing,
            _ => Value::Object(Map::new()),
        };
        (self.merge)(existing, ctx)
    }

    /// Strip owned keys from document.
    pub fn unmerge(&self, existing: Value) -> Value {
        if !existing.is_object() {
            return existing;
        }
        (self.unmerge)(existing)
    }
}

impl Debug for JsonMergeDefinition {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.debug_struct("JsonMergeDefinition")
            .field("owned_keys", &self.owned_keys)
            .field("remove_file_if_empty", &self.remove_file_if_empty)
            .field("skip_if_missing", &self.skip_if_missing)
            .finish_non_exhaustive()
    }
}

/// Where a text patch goes inside of a file.
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOperation {
    Prepend,

    #[default]
    Append,
}

/// Ownership of a block of text inside of a shared text file.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct TextPatchDefinition {
    /// Where to place the block.
    #[serde(default)]
    pub operation: PatchOperation,

    /// Literal block of text to place.
    pub content: String,

    /// Substring that marks the block as applied, and locates it for removal.
    pub marker: String,

    /// Create file if it does not already exist.
    #[serde(default)]
    pub create_if_missing: bool,

    /// Delete file when removing the block leaves nothing but whitespace.
    #[serde(default)]
    pub remove_file_if_empty: bool,
}

impl TextPatchDefinition {
    /// Construct new text patch.
    pub fn new(
        operation: PatchOperation,
        content: impl Into<String>,
        marker: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            content: content.into(),
            marker: marker.into(),
            create_if_missing: false,
            remove_file_if_empty: false,
        }
    }

    /// Create file if it does not already exist.
    pub fn with_create_if_missing(mut self, enabled: bool) -> Self {
        self.create_if_missing = enabled;
        self
    }

    /// Delete file when removing the block leaves nothing but whitespace.
    pub fn with_remove_file_if_empty(mut self, enabled: bool) -> Self {
        self.remove_file_if_empty = enabled;
        self
    }
}
