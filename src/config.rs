// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of schema files so that a [`Schema`] can be described
//! in TOML instead of Rust. Serialization and deserialization go through
//! [`FromStr`] and [`Display`]. Reading schema files is provided through
//! [`SchemaDocument::load`] for convenience.

use crate::{
    schema::{
        definition::{FileDefinition, JsonMergeDefinition, TextPatchDefinition},
        PackageTable, Schema, SchemaError,
    },
    template::{TemplateError, TemplateRegistry},
};

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Schema document layout.
///
/// A schema document lists everything a piece of dev-tooling wants present
/// in a project. It maps one-to-one onto [`Schema`], with the exception of
/// generators and custom merge functions, which can only be expressed in
/// Rust.
///
/// # General Layout
///
/// Top-level settings come first: the schema version, an optional directory
/// of templates, and an optional version marker path. Directory tiers and
/// deprecated leftovers follow in their own tables. Files, JSON merges, and
/// text patches are tables keyed by path. Packages come last.
///
/// Inline templates can be listed in the `templates` table, keyed by
/// identifier. They take precedence over templates of the same name loaded
/// from the template directory.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
pub struct SchemaDocument {
    /// Version of the schema.
    pub version: String,

    /// Directory to load templates from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,

    /// Path of owned file recording the schema version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_marker: Option<PathBuf>,

    /// Directory tiers.
    #[serde(default)]
    pub dirs: DirLayout,

    /// Leftovers of prior schema versions.
    #[serde(default)]
    pub deprecated: DeprecatedLayout,

    /// Files rewritten whenever their content drifts.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub owned_files: BTreeMap<PathBuf, FileLayout>,

    /// Files created once, and never overwritten.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub managed_files: BTreeMap<PathBuf, FileLayout>,

    /// Owned slices of shared JSON documents.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub json_merges: BTreeMap<PathBuf, JsonMergeLayout>,

    /// Owned blocks of shared text files.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub text_patches: BTreeMap<PathBuf, TextPatchDefinition>,

    /// Packages wanted by the schema.
    #[serde(default)]
    pub packages: PackageTable,

    /// Inline template sources keyed by identifier.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub templates: BTreeMap<String, String>,
}

impl SchemaDocument {
    /// Read schema document from file.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file cannot be read.
    /// - Return any error of [`SchemaDocument::from_str`].
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("load schema document {:?}", path.display());
        let data = read_to_string(path).map_err(|err| ConfigError::Read {
            source: err,
            path: path.to_path_buf(),
        })?;

        data.parse()
    }

    /// Convert document into validated schema.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Template`] if templates cannot be loaded.
    /// - Return [`ConfigError::MissingContentSource`] if a file lists neither
    ///   content nor template.
    /// - Return [`ConfigError::AmbiguousContentSource`] if a file lists both
    ///   content and template.
    /// - Return [`ConfigError::MergeKeys`] if JSON merge keys cannot be
    ///   converted.
    /// - Return [`ConfigError::Schema`] if resulting schema is invalid.
    pub fn into_schema(self) -> Result<Schema> {
        let mut templates = TemplateRegistry::new();
        if let Some(dir) = &self.template_dir {
            templates.load_dir(dir)?;
        }
        for (id, source) in self.templates {
            templates.add(id, source)?;
        }

        let mut builder = Schema::builder(self.version)
            .templates(templates)
            .packages(self.packages);

        for dir in self.dirs.owned {
            builder = builder.owned_dir(dir);
        }
        for dir in self.dirs.shared {
            builder = builder.shared_dir(dir);
        }
        for dir in self.dirs.preserved {
            builder = builder.preserved_dir(dir);
        }
        for path in self.dirs.vcs {
            builder = builder.vcs_path(path);
        }
        for dir in self.dirs.scripts {
            builder = builder.script_dir(dir);
        }

        for path in self.deprecated.files {
            builder = builder.deprecated_file(path);
        }
        for dir in self.deprecated.dirs {
            builder = builder.deprecated_dir(dir);
        }
        for name in self.deprecated.packages {
            builder = builder.deprecated_package(name);
        }

        if let Some(marker) = self.version_marker {
            builder = builder.version_marker(marker);
        }

        for (path, layout) in self.owned_files {
            let definition = layout.into_definition(&path)?;
            builder = builder.owned_file(path, definition);
        }
        for (path, layout) in self.managed_files {
            let definition = layout.into_definition(&path)?;
            builder = builder.managed_file(path, definition);
        }
        for (path, layout) in self.json_merges {
            let definition = layout.into_definition(&path)?;
            builder = builder.json_merge(path, definition);
        }
        for (path, definition) in self.text_patches {
            builder = builder.text_patch(path, definition);
        }

        Ok(builder.build()?)
    }
}

impl FromStr for SchemaDocument {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut document: SchemaDocument =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on template directory field.
        if let Some(dir) = document.template_dir.take() {
            let expanded = shellexpand::full(dir.to_string_lossy().as_ref())
                .map_err(ConfigError::ShellExpansion)?
                .into_owned();
            document.template_dir = Some(PathBuf::from(expanded));
        }

        Ok(document)
    }
}

impl Display for SchemaDocument {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Directory tier listing.
///
/// Each listing must be ordered parent-before-child.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct DirLayout {
    /// Fully controlled directories.
    #[serde(default)]
    pub owned: Vec<PathBuf>,

    /// Directories that are created but never deleted.
    #[serde(default)]
    pub shared: Vec<PathBuf>,

    /// Directories that are only deleted when empty.
    #[serde(default)]
    pub preserved: Vec<PathBuf>,

    /// Path prefixes that only apply under version control.
    #[serde(default)]
    pub vcs: Vec<PathBuf>,

    /// Directories whose files should be executable.
    #[serde(default)]
    pub scripts: Vec<PathBuf>,
}

/// Leftovers of prior schema versions, removed on upgrade.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct DeprecatedLayout {
    #[serde(default)]
    pub files: Vec<PathBuf>,

    #[serde(default)]
    pub dirs: Vec<PathBuf>,

    #[serde(default)]
    pub packages: Vec<String>,
}

/// File content source.
///
/// Exactly one of `content` or `template` must be given. Files that list a
/// required capability are skipped for projects lacking it.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct FileLayout {
    /// Literal file content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Identifier of template to render.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Capability the project must have for the file to apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<String>,
}

impl FileLayout {
    fn into_definition(self, path: &Path) -> Result<FileDefinition> {
        let definition = match (self.content, self.template) {
            (Some(content), None) => FileDefinition::content(content),
            (None, Some(id)) => FileDefinition::template(id),
            (None, None) => {
                return Err(ConfigError::MissingContentSource {
                    path: path.to_path_buf(),
                })
            }
            (Some(_), Some(_)) => {
                return Err(ConfigError::AmbiguousContentSource {
                    path: path.to_path_buf(),
                })
            }
        };

        match self.requires {
            Some(capability) => Ok(FileDefinition::gated(capability, definition)),
            None => Ok(definition),
        }
    }
}

/// JSON merge listing.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
pub struct JsonMergeLayout {
    /// Owned keys as dot-paths mapped to their values.
    #[serde(default)]
    pub set: toml::Table,

    /// Delete document when unmerging leaves nothing meaningful.
    #[serde(default)]
    pub remove_file_if_empty: bool,

    /// Never create document if it does not already exist.
    #[serde(default)]
    pub skip_if_missing: bool,
}

impl JsonMergeLayout {
    fn into_definition(self, path: &Path) -> Result<JsonMergeDefinition> {
        let keys = self
            .set
            .into_iter()
            .map(|(key, value)| serde_json::to_value(value).map(|value| (key, value)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ConfigError::MergeKeys {
                source: err,
                path: path.to_path_buf(),
            })?;

        Ok(JsonMergeDefinition::set_keys(keys)
            .with_remove_file_if_empty(self.remove_file_if_empty)
            .with_skip_if_missing(self.skip_if_missing))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Failed to read configuration file.
    #[error("failed to read schema document {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File lists neither content nor template.
    #[error("file {:?} needs either content or template", path.display())]
    MissingContentSource { path: PathBuf },

    /// File lists both content and template.
    #[error("file {:?} lists both content and template", path.display())]
    AmbiguousContentSource { path: PathBuf },

    /// JSON merge keys cannot be converted.
    #[error("failed to convert JSON merge keys for {:?}", path.display())]
    MergeKeys {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },

    /// Templates cannot be loaded.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Resulting schema is invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{context::ProjectContext, schema::definition::PatchOperation};
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use serde_json::json;
    use std::fs::{create_dir_all, write};

    const DOCUMENT: &str = indoc! {r##"
        version = "2.1.0"
        template_dir = "$RIGGING_TEMPLATES"
        version_marker = ".rigging/version"

        [dirs]
        owned = [".rigging", ".rigging/hooks"]
        shared = [".github"]
        vcs = [".rigging/hooks"]
        scripts = [".rigging/hooks"]

        [deprecated]
        files = [".rigging/old.json"]
        packages = ["old-linter"]

        [owned_files.".rigging/hooks/pre-commit"]
        template = "pre-commit"

        [managed_files."docs/GUIDE.md"]
        content = "# Guide\n"
        requires = "typescript"

        [json_merges."package.json"]
        set = { "scripts.lint" = "rigging lint" }
        skip_if_missing = true

        [text_patches.".gitignore"]
        operation = "append"
        content = "# rigging\n.rigging/cache\n"
        marker = "# rigging"
        create_if_missing = true

        [packages]
        base = ["eslint"]
        vcs_only = ["husky"]
        conditional = { typescript = ["typescript-eslint"] }

        [templates]
        pre-commit = "#!/bin/sh\nrigging lint {{ version }}\n"
    "##};

    #[sealed_test(env = [("RIGGING_TEMPLATES", "/home/blah/templates")])]
    fn deserialize_schema_document() -> anyhow::Result<()> {
        let result: SchemaDocument = DOCUMENT.parse()?;

        let expect = SchemaDocument {
            version: "2.1.0".into(),
            template_dir: Some("/home/blah/templates".into()),
            version_marker: Some(".rigging/version".into()),
            dirs: DirLayout {
                owned: vec![".rigging".into(), ".rigging/hooks".into()],
                shared: vec![".github".into()],
                preserved: vec![],
                vcs: vec![".rigging/hooks".into()],
                scripts: vec![".rigging/hooks".into()],
            },
            deprecated: DeprecatedLayout {
                files: vec![".rigging/old.json".into()],
                dirs: vec![],
                packages: vec!["old-linter".into()],
            },
            owned_files: BTreeMap::from([(
                ".rigging/hooks/pre-commit".into(),
                FileLayout {
                    template: Some("pre-commit".into()),
                    ..Default::default()
                },
            )]),
            managed_files: BTreeMap::from([(
                "docs/GUIDE.md".into(),
                FileLayout {
                    content: Some("# Guide\n".into()),
                    requires: Some("typescript".into()),
                    ..Default::default()
                },
            )]),
            json_merges: BTreeMap::from([(
                "package.json".into(),
                JsonMergeLayout {
                    set: toml::Table::from_iter([(
                        "scripts.lint".to_string(),
                        toml::Value::String("rigging lint".into()),
                    )]),
                    remove_file_if_empty: false,
                    skip_if_missing: true,
                },
            )]),
            text_patches: BTreeMap::from([(
                ".gitignore".into(),
                TextPatchDefinition::new(
                    PatchOperation::Append,
                    "# rigging\n.rigging/cache\n",
                    "# rigging",
                )
                .with_create_if_missing(true),
            )]),
            packages: PackageTable {
                base: vec!["eslint".into()],
                conditional: BTreeMap::from([(
                    "typescript".into(),
                    vec!["typescript-eslint".into()],
                )]),
                vcs_only: vec!["husky".into()],
            },
            templates: BTreeMap::from([(
                "pre-commit".into(),
                "#!/bin/sh\nrigging lint {{ version }}\n".into(),
            )]),
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[sealed_test(env = [("RIGGING_TEMPLATES", "/home/blah/templates")])]
    fn serialized_document_parses_back() -> anyhow::Result<()> {
        let document: SchemaDocument = DOCUMENT.parse()?;
        let result = document.to_string();

        assert!(result.starts_with("version = \"2.1.0\"\n"));
        assert_eq!(result.parse::<SchemaDocument>()?, document);

        Ok(())
    }

    #[sealed_test(env = [("RIGGING_TEMPLATES", "templates")])]
    fn document_converts_into_schema() -> anyhow::Result<()> {
        create_dir_all("templates/hooks")?;
        write("templates/hooks/commit-msg", "#!/bin/sh\n")?;

        let document: SchemaDocument = DOCUMENT.parse()?;
        let schema = document.into_schema()?;

        assert_eq!(schema.version, "2.1.0");
        assert!(schema.templates.contains("hooks/commit-msg"));
        assert!(schema.owned_files.contains_key(Path::new(".rigging/version")));
        assert_eq!(schema.deprecated_packages, vec!["old-linter"]);
        assert!(schema.is_vcs_path(".rigging/hooks/pre-commit"));

        let ctx = ProjectContext::default();
        let hook = &schema.owned_files[Path::new(".rigging/hooks/pre-commit")];
        assert_eq!(
            hook.resolve(&ctx, &schema.templates, &schema.version)?,
            Some("#!/bin/sh\nrigging lint 2.1.0\n".into())
        );

        let guide = &schema.managed_files[Path::new("docs/GUIDE.md")];
        assert_eq!(guide.resolve(&ctx, &schema.templates, &schema.version)?, None);

        let merge = &schema.json_merges[Path::new("package.json")];
        assert_eq!(merge.owned_keys(), ["scripts.lint"]);
        assert!(merge.skips_if_missing());
        assert_eq!(
            merge.merge(json!({}), &ctx),
            json!({ "scripts": { "lint": "rigging lint" } })
        );

        Ok(())
    }

    #[test]
    fn reject_file_without_content_source() {
        let result = indoc! {r#"
            version = "1"

            [owned_files."a.txt"]
            requires = "typescript"
        "#}
        .parse::<SchemaDocument>()
        .map(SchemaDocument::into_schema);

        assert!(matches!(
            result,
            Ok(Err(ConfigError::MissingContentSource { path })) if path == Path::new("a.txt")
        ));
    }

    #[test]
    fn reject_file_with_two_content_sources() -> anyhow::Result<()> {
        let document: SchemaDocument = indoc! {r#"
            version = "1"

            [managed_files."a.txt"]
            content = "x"
            template = "a"
        "#}
        .parse()?;

        assert!(matches!(
            document.into_schema(),
            Err(ConfigError::AmbiguousContentSource { .. })
        ));

        Ok(())
    }

    #[test]
    fn reject_invalid_schema() -> anyhow::Result<()> {
        let document: SchemaDocument = indoc! {r#"
            version = "1"

            [dirs]
            owned = ["a/b", "a"]
        "#}
        .parse()?;

        assert!(matches!(
            document.into_schema(),
            Err(ConfigError::Schema(SchemaError::ChildBeforeParent { .. }))
        ));

        Ok(())
    }
}
