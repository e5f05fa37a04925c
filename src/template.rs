// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Template resolution.
//!
//! File definitions can reference a template by identifier instead of
//! carrying their content inline. The [`TemplateRegistry`] maps those
//! identifiers to minijinja templates, and renders them against the current
//! [`ProjectContext`] and schema version.
//!
//! # Template Scope
//!
//! The following variables are available to every template:
//!
//! - `root`: absolute path to the project root.
//! - `capabilities`: map of capability names to flags.
//! - `installed`: list of installed dependency names.
//! - `vcs`: whether the project is under version control.
//! - `version`: version of the schema being reconciled.

use crate::context::ProjectContext;

use glob::{glob, Pattern};
use minijinja::{context, Environment};
use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Registry of named templates.
#[derive(Clone)]
pub struct TemplateRegistry {
    env: Environment<'static>,
}

impl TemplateRegistry {
    /// Construct new empty template registry.
    pub fn new() -> Self {
        let mut env = Environment::new();
        // INVARIANT: Rendered files keep their final newline.
        env.set_keep_trailing_newline(true);
        Self { env }
    }

    /// Add template source under identifier.
    ///
    /// # Errors
    ///
    /// - Return [`TemplateError::Parse`] if template source is invalid.
    pub fn add(&mut self, id: impl Into<String>, source: impl Into<String>) -> Result<()> {
        let id = id.into();
        self.env
            .add_template_owned(id.clone(), source.into())
            .map_err(|err| TemplateError::Parse { source: err, id })
    }

    /// Load every file inside of directory as a template.
    ///
    /// The identifier of each template is its path relative to the directory
    /// using forward slashes, e.g., `hooks/pre-commit`. Returns the number of
    /// templates loaded.
    ///
    /// # Errors
    ///
    /// - Return [`TemplateError::Pattern`] if directory path cannot be turned
    ///   into a scan pattern.
    /// - Return [`TemplateError::Glob`] if directory cannot be scanned.
    /// - Return [`TemplateError::Read`] if template file cannot be read.
    /// - Return [`TemplateError::Parse`] if template source is invalid.
    #[instrument(skip(self, dir), level = "debug")]
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let pattern = format!("{}/**/*", Pattern::escape(&dir.to_string_lossy()));
        let mut loaded = 0;

        for entry in glob(&pattern)? {
            let path = entry?;
            if !path.is_file() {
                continue;
            }

            let id = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let source = read_to_string(&path).map_err(|err| TemplateError::Read {
                source: err,
                path: path.clone(),
            })?;

            debug!("load template {id:?} from {:?}", path.display());
            self.add(id, source)?;
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Check if template is registered.
    pub fn contains(&self, id: impl AsRef<str>) -> bool {
        self.env.get_template(id.as_ref()).is_ok()
    }

    /// Render template against project context.
    ///
    /// # Errors
    ///
    /// - Return [`TemplateError::Unknown`] if no template has the identifier.
    /// - Return [`TemplateError::Render`] if rendering fails.
    pub fn render(
        &self,
        id: impl AsRef<str>,
        ctx: &ProjectContext,
        version: impl AsRef<str>,
    ) -> Result<String> {
        let id = id.as_ref();
        let template = self
            .env
            .get_template(id)
            .map_err(|_| TemplateError::Unknown { id: id.to_string() })?;

        template
            .render(context! {
                root => ctx.root.display().to_string(),
                capabilities => &ctx.capabilities,
                installed => &ctx.installed,
                vcs => ctx.vcs,
                version => version.as_ref(),
            })
            .map_err(|err| TemplateError::Render {
                source: err,
                id: id.to_string(),
            })
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for TemplateRegistry {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let ids: Vec<&str> = self.env.templates().map(|(id, _)| id).collect();
        fmt.debug_struct("TemplateRegistry")
            .field("templates", &ids)
            .finish()
    }
}

/// Template error types.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// No template registered under identifier.
    #[error("unknown template {id:?}")]
    Unknown { id: String },

    /// Template source is invalid.
    #[error("failed to parse template {id:?}")]
    Parse {
        #[source]
        source: minijinja::Error,
        id: String,
    },

    /// Template cannot be rendered.
    #[error("failed to render template {id:?}")]
    Render {
        #[source]
        source: minijinja::Error,
        id: String,
    },

    /// Template file cannot be read.
    #[error("failed to read template file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Template directory pattern is invalid.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Template directory cannot be scanned.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
}

/// Friendly result alias :3
pub type Result<T, E = TemplateError> = std::result::Result<T, E>;
