// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Reconciliation planning.
//!
//! Compare a [`Schema`] against the current state of a project, and produce a
//! [`Plan`] of [`Action`]s that would bring the project into the state the
//! requested [`Mode`] asks for. Planning only ever reads the filesystem.
//!
//! Along with the actions, a plan predicts which paths will be created,
//! updated, or removed. Predictions are computed with the same edit logic the
//! executor commits with, so a dry run reports exactly what a real run would
//! do against the same starting state.

pub mod action;

mod forecast;

use crate::{
    context::ProjectContext,
    fs::{Change, FileSystem, FsError},
    merge::{merge_edit, unmerge_edit},
    patch::{patch_edit, unpatch_edit},
    path::{ancestors, depth},
    plan::{action::Action, forecast::Forecast},
    schema::{Schema, SchemaError},
    template::TemplateError,
};

use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, info, instrument};

/// Lifecycle mode of reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Bring project into desired state from scratch.
    Install,

    /// Bring previously installed project up to date.
    Upgrade,

    /// Remove owned state, keep managed files.
    Uninstall,

    /// Remove owned and managed state.
    UninstallFull,
}

impl Mode {
    /// Check if mode removes state rather than adds it.
    pub fn is_uninstall(&self) -> bool {
        matches!(self, Self::Uninstall | Self::UninstallFull)
    }
}

impl Display for Mode {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Install => "install",
            Self::Upgrade => "upgrade",
            Self::Uninstall => "uninstall",
            Self::UninstallFull => "uninstall-full",
        };
        fmt.write_str(name)
    }
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data {
            "install" => Ok(Self::Install),
            "upgrade" => Ok(Self::Upgrade),
            "uninstall" => Ok(Self::Uninstall),
            "uninstall-full" => Ok(Self::UninstallFull),
            _ => Err(UnknownMode(data.to_string())),
        }
    }
}

/// Mode name is not recognized.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode {0:?}, expected install, upgrade, uninstall, or uninstall-full")]
pub struct UnknownMode(pub String);

/// Ordered list of actions with predicted outcome.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Mode the plan was computed for.
    pub mode: Mode,

    /// Actions in strict execution order.
    pub actions: Vec<Action>,

    /// Paths expected to be created.
    pub would_create: Vec<PathBuf>,

    /// Paths expected to have their contents replaced.
    pub would_update: Vec<PathBuf>,

    /// Paths expected to be removed.
    pub would_remove: Vec<PathBuf>,

    /// Packages the caller should install.
    pub packages_to_install: Vec<String>,

    /// Packages the caller should remove.
    pub packages_to_remove: Vec<String>,
}

impl Plan {
    /// Check if plan has nothing to do on the filesystem.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Compute plan that brings project into state requested by mode.
///
/// # Errors
///
/// - Return [`PlanError::Schema`] if schema is invalid.
/// - Return [`PlanError::Template`] if file content cannot be resolved.
/// - Return [`PlanError::Fs`] if the project cannot be inspected.
#[instrument(skip(schema, ctx, fs), level = "debug")]
pub fn compute_plan<F>(schema: &Schema, mode: Mode, ctx: &ProjectContext, fs: &F) -> Result<Plan>
where
    F: FileSystem + ?Sized,
{
    schema.validate()?;

    let mut planner = Planner::new(schema, ctx, fs);
    match mode {
        Mode::Install => planner.install()?,
        Mode::Upgrade => planner.upgrade()?,
        Mode::Uninstall => planner.uninstall(false)?,
        Mode::UninstallFull => planner.uninstall(true)?,
    }

    let plan = planner.finish(mode);
    info!(
        "planned {mode} with {} actions ({} create, {} update, {} remove)",
        plan.actions.len(),
        plan.would_create.len(),
        plan.would_update.len(),
        plan.would_remove.len()
    );

    Ok(plan)
}

struct Planner<'a, F: ?Sized> {
    schema: &'a Schema,
    ctx: &'a ProjectContext,
    fs: &'a F,
    actions: Vec<Action>,
    forecast: Forecast,
    packages_to_install: Vec<String>,
    packages_to_remove: Vec<String>,
}

impl<'a, F> Planner<'a, F>
where
    F: FileSystem + ?Sized,
{
    fn new(schema: &'a Schema, ctx: &'a ProjectContext, fs: &'a F) -> Self {
        Self {
            schema,
            ctx,
            fs,
            actions: Vec::new(),
            forecast: Forecast::default(),
            packages_to_install: Vec::new(),
            packages_to_remove: Vec::new(),
        }
    }

    fn install(&mut self) -> Result<()> {
        self.create_missing_dirs();
        self.write_owned(true)?;
        self.write_managed()?;
        self.chmod_scripts(true)?;
        self.merge_json(true)?;
        self.patch_text(true)?;
        self.packages_to_install = self.wanted_packages();

        Ok(())
    }

    fn upgrade(&mut self) -> Result<()> {
        // INVARIANT: Deprecated leftovers go before anything new is written.
        self.remove_deprecated();
        self.create_missing_dirs();
        self.write_owned(false)?;
        self.write_managed()?;
        self.chmod_scripts(false)?;
        self.merge_json(false)?;
        self.patch_text(false)?;
        self.packages_to_install = self.wanted_packages();
        self.packages_to_remove = self
            .schema
            .deprecated_packages
            .iter()
            .filter(|name| self.ctx.is_installed(name))
            .cloned()
            .collect();

        Ok(())
    }

    fn uninstall(&mut self, full: bool) -> Result<()> {
        let schema = self.schema;
        let mut files: Vec<&Path> = schema.owned_files.keys().map(PathBuf::as_path).collect();
        if full {
            files.extend(schema.managed_files.keys().map(PathBuf::as_path));
        }

        let mut orphans = BTreeSet::new();
        for path in files {
            if !self.fs.exists(path) {
                continue;
            }

            self.push(Action::Remove(path.to_path_buf()), Some(Change::Removed), path);
            collect_orphans(schema, path, &mut orphans);
        }

        for (path, definition) in &schema.json_merges {
            if !self.fs.exists(path) {
                continue;
            }

            let change = unmerge_edit(self.fs, path, definition)?.change();
            if change == Some(Change::Removed) {
                collect_orphans(schema, path, &mut orphans);
            }
            let action = Action::JsonUnmerge {
                path: path.clone(),
                definition: definition.clone(),
            };
            self.push(action, change, path);
        }

        for (path, definition) in &schema.text_patches {
            let patched = self
                .fs
                .try_read_to_string(path)
                .is_some_and(|text| text.contains(&definition.marker));
            if !patched {
                continue;
            }

            let change = unpatch_edit(self.fs, path, definition)?.change();
            if change == Some(Change::Removed) {
                collect_orphans(schema, path, &mut orphans);
            }
            let action = Action::TextUnpatch {
                path: path.clone(),
                definition: definition.clone(),
            };
            self.push(action, change, path);
        }

        for dir in schema.preserved_dirs.iter().chain(schema.owned_dirs.iter()) {
            collect_orphans(schema, dir, &mut orphans);
            orphans.insert(dir.clone());
        }

        // INVARIANT: Directories go deepest first, so that parents get a
        // chance to become empty before their own turn comes.
        let mut dirs: Vec<PathBuf> = orphans.into_iter().collect();
        dirs.sort_by(|a, b| depth(b).cmp(&depth(a)).then_with(|| b.cmp(a)));
        for dir in &dirs {
            self.remove_dir(dir)?;
        }

        if full {
            self.packages_to_remove = schema
                .packages
                .all()
                .into_iter()
                .filter(|name| self.ctx.is_installed(name))
                .collect();
        }

        Ok(())
    }

    fn finish(self, mode: Mode) -> Plan {
        Plan {
            mode,
            actions: self.actions,
            would_create: self.forecast.created,
            would_update: self.forecast.updated,
            would_remove: self.forecast.removed,
            packages_to_install: self.packages_to_install,
            packages_to_remove: self.packages_to_remove,
        }
    }

    fn push(&mut self, action: Action, change: Option<Change>, path: &Path) {
        debug!("plan {action}");
        if let Some(change) = change {
            self.forecast.record(change, path);
        }
        self.actions.push(action);
    }

    fn applies(&self, path: &Path) -> bool {
        self.ctx.vcs || !self.schema.is_vcs_path(path)
    }

    fn remove_deprecated(&mut self) {
        let schema = self.schema;
        for path in schema
            .deprecated_files
            .iter()
            .chain(schema.deprecated_dirs.iter())
        {
            if self.fs.exists(path) {
                self.push(Action::Remove(path.clone()), Some(Change::Removed), path);
            }
        }
    }

    fn create_missing_dirs(&mut self) {
        let schema = self.schema;
        for dir in schema.all_dirs() {
            if !self.applies(dir) || self.fs.is_dir(dir) {
                continue;
            }

            self.push(Action::CreateDir(dir.to_path_buf()), Some(Change::Created), dir);
        }
    }

    fn write_owned(&mut self, always: bool) -> Result<()> {
        let schema = self.schema;
        for (path, definition) in &schema.owned_files {
            if !self.applies(path) {
                continue;
            }

            let Some(content) = definition.resolve(self.ctx, &schema.templates, &schema.version)?
            else {
                debug!("generator skipped {:?}", path.display());
                continue;
            };

            let existing = self.fs.try_read_to_string(path);
            if !always && existing.as_deref().map(str::trim) == Some(content.trim()) {
                continue;
            }

            let change = if self.fs.exists(path) {
                Change::Updated
            } else {
                Change::Created
            };
            let action = Action::Write {
                path: path.clone(),
                content,
            };
            self.push(action, Some(change), path);
        }

        Ok(())
    }

    fn write_managed(&mut self) -> Result<()> {
        let schema = self.schema;
        for (path, definition) in &schema.managed_files {
            if !self.applies(path) || self.fs.exists(path) {
                continue;
            }

            let Some(content) = definition.resolve(self.ctx, &schema.templates, &schema.version)?
            else {
                debug!("generator skipped {:?}", path.display());
                continue;
            };

            let action = Action::Write {
                path: path.clone(),
                content,
            };
            self.push(action, Some(Change::Created), path);
        }

        Ok(())
    }

    fn chmod_scripts(&mut self, always: bool) -> Result<()> {
        let dirs: Vec<PathBuf> = self
            .schema
            .script_dirs
            .iter()
            .filter(|dir| self.applies(dir))
            .cloned()
            .collect();
        if dirs.is_empty() {
            return Ok(());
        }

        if !always && !self.needs_chmod(&dirs)? {
            return Ok(());
        }

        debug!("plan chmod of {} script directories", dirs.len());
        self.actions.push(Action::Chmod(dirs));

        Ok(())
    }

    fn needs_chmod(&self, dirs: &[PathBuf]) -> Result<bool> {
        let writes_script = self.actions.iter().any(|action| match action {
            Action::Write { path, .. } => dirs.iter().any(|dir| path.starts_with(dir)),
            _ => false,
        });
        if writes_script {
            return Ok(true);
        }

        for dir in dirs {
            if !self.fs.is_dir(dir) {
                continue;
            }

            for child in self.fs.list_dir(dir)? {
                if !self.fs.is_dir(&child) && !self.fs.is_executable(&child) {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    fn merge_json(&mut self, always: bool) -> Result<()> {
        let schema = self.schema;
        for (path, definition) in &schema.json_merges {
            if !self.applies(path) {
                continue;
            }

            let change = merge_edit(self.fs, path, definition, self.ctx)?.change();
            if change.is_none() && !always {
                continue;
            }

            let action = Action::JsonMerge {
                path: path.clone(),
                definition: definition.clone(),
            };
            self.push(action, change, path);
        }

        Ok(())
    }

    fn patch_text(&mut self, always: bool) -> Result<()> {
        let schema = self.schema;
        for (path, definition) in &schema.text_patches {
            if !self.applies(path) {
                continue;
            }

            let change = patch_edit(self.fs, path, definition)?.change();
            if change.is_none() && !always {
                continue;
            }

            let action = Action::TextPatch {
                path: path.clone(),
                definition: definition.clone(),
            };
            self.push(action, change, path);
        }

        Ok(())
    }

    fn remove_dir(&mut self, dir: &Path) -> Result<()> {
        if !self.fs.is_dir(dir) || self.forecast.is_gone(dir) {
            return Ok(());
        }

        // INVARIANT: Directories holding anything we did not remove stay.
        let change = self
            .forecast
            .will_be_empty(self.fs, dir)?
            .then_some(Change::Removed);
        self.push(Action::RemoveDir(dir.to_path_buf()), change, dir);

        Ok(())
    }

    fn wanted_packages(&self) -> Vec<String> {
        let packages = &self.schema.packages;
        let vcs = self.ctx.vcs;

        let base = packages
            .base
            .iter()
            .filter(|name| vcs || !packages.is_vcs_only(name));
        let vcs_only = packages.vcs_only.iter().filter(|_| vcs);
        let conditional = packages
            .conditional
            .iter()
            .filter(|(capability, _)| self.ctx.has_capability(capability))
            .flat_map(|(_, names)| names);

        let mut seen = BTreeSet::new();
        base.chain(vcs_only)
            .chain(conditional)
            .filter(|name| seen.insert(name.as_str()))
            .filter(|name| !self.ctx.is_installed(name))
            .cloned()
            .collect()
    }
}

/// Collect unlisted ancestors of a removed path.
fn collect_orphans(schema: &Schema, path: &Path, orphans: &mut BTreeSet<PathBuf>) {
    for ancestor in ancestors(path) {
        if schema.is_listed_dir(ancestor) {
            break;
        }
        orphans.insert(ancestor.to_path_buf());
    }
}

/// Planning error types.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Schema is invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// File content cannot be resolved.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Project cannot be inspected.
    #[error(transparent)]
    Fs(#[from] FsError),
}

/// Friendly result alias :3
pub type Result<T, E = PlanError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fs::memory::MemoryFileSystem,
        schema::definition::{
            FileDefinition, JsonMergeDefinition, PatchOperation, TextPatchDefinition,
        },
    };
    use serde_json::json;
    use simple_test_case::test_case;

    fn names(plan: &Plan) -> Vec<String> {
        plan.actions.iter().map(ToString::to_string).collect()
    }

    fn paths(paths: &[&str]) -> Vec<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    fn single_file_schema() -> Schema {
        Schema::builder("1")
            .owned_dir("a")
            .owned_file("a/f.txt", FileDefinition::content("x"))
            .build()
            .unwrap()
    }

    fn tooling_schema() -> Schema {
        Schema::builder("2.0.0")
            .owned_dir(".rigging")
            .owned_dir(".rigging/hooks")
            .preserved_dir(".rigging/rules")
            .vcs_path(".rigging/hooks")
            .script_dir(".rigging/hooks")
            .deprecated_file(".rigging/old.txt")
            .deprecated_package("tslint")
            .version_marker(".rigging/version")
            .owned_file(
                ".rigging/hooks/pre-commit",
                FileDefinition::content("#!/bin/sh\nrigging lint\n"),
            )
            .managed_file(".rigging/rules/custom.md", FileDefinition::content("# Rules\n"))
            .json_merge(
                "package.json",
                JsonMergeDefinition::set_keys([("scripts.lint", json!("rigging lint"))]),
            )
            .text_patch(
                ".gitignore",
                TextPatchDefinition::new(
                    PatchOperation::Append,
                    "# >>> rigging\n.rigging/cache/\n",
                    ">>> rigging",
                )
                .with_create_if_missing(true),
            )
            .build()
            .unwrap()
    }

    #[test_case("install", Mode::Install; "install")]
    #[test_case("upgrade", Mode::Upgrade; "upgrade")]
    #[test_case("uninstall", Mode::Uninstall; "uninstall")]
    #[test_case("uninstall-full", Mode::UninstallFull; "uninstall full")]
    #[test]
    fn mode_names_round_trip(name: &str, mode: Mode) {
        pretty_assertions::assert_eq!(name.parse::<Mode>(), Ok(mode));
        pretty_assertions::assert_eq!(mode.to_string(), name);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        pretty_assertions::assert_eq!(
            "reinstall".parse::<Mode>(),
            Err(UnknownMode("reinstall".into())),
        );
    }

    #[test]
    fn install_single_file_into_empty_project() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::new();
        let plan = compute_plan(
            &single_file_schema(),
            Mode::Install,
            &ProjectContext::default(),
            &fs,
        )?;

        pretty_assertions::assert_eq!(names(&plan), vec!["mkdir a", "write a/f.txt"]);
        pretty_assertions::assert_eq!(plan.would_create, paths(&["a", "a/f.txt"]));
        assert!(plan.would_update.is_empty());
        assert!(plan.would_remove.is_empty());
        assert!(fs.snapshot().is_empty());

        Ok(())
    }

    #[test]
    fn uninstall_single_file_project() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::with_files([("a/f.txt", "x")])?;
        let plan = compute_plan(
            &single_file_schema(),
            Mode::Uninstall,
            &ProjectContext::default(),
            &fs,
        )?;

        pretty_assertions::assert_eq!(names(&plan), vec!["rm a/f.txt", "rmdir a"]);
        pretty_assertions::assert_eq!(plan.would_remove, paths(&["a/f.txt", "a"]));

        Ok(())
    }

    #[test]
    fn install_skips_vcs_paths_outside_version_control() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::new();
        let plan = compute_plan(&tooling_schema(), Mode::Install, &ProjectContext::default(), &fs)?;

        pretty_assertions::assert_eq!(
            names(&plan),
            vec![
                "mkdir .rigging",
                "mkdir .rigging/rules",
                "write .rigging/version",
                "write .rigging/rules/custom.md",
                "json-merge package.json",
                "text-patch .gitignore",
            ]
        );
        pretty_assertions::assert_eq!(
            plan.would_create,
            paths(&[
                ".rigging",
                ".rigging/rules",
                ".rigging/version",
                ".rigging/rules/custom.md",
                "package.json",
                ".gitignore",
            ])
        );

        Ok(())
    }

    #[test]
    fn install_under_version_control_makes_hooks_executable() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::new();
        let ctx = ProjectContext::default().with_vcs(true);
        let plan = compute_plan(&tooling_schema(), Mode::Install, &ctx, &fs)?;

        pretty_assertions::assert_eq!(
            names(&plan),
            vec![
                "mkdir .rigging",
                "mkdir .rigging/hooks",
                "mkdir .rigging/rules",
                "write .rigging/hooks/pre-commit",
                "write .rigging/version",
                "write .rigging/rules/custom.md",
                "chmod .rigging/hooks",
                "json-merge package.json",
                "text-patch .gitignore",
            ]
        );

        Ok(())
    }

    #[test]
    fn install_never_overwrites_managed_files() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::with_files([(".rigging/rules/custom.md", "mine\n")])?;
        let plan = compute_plan(&tooling_schema(), Mode::Install, &ProjectContext::default(), &fs)?;

        assert!(!names(&plan).contains(&"write .rigging/rules/custom.md".to_string()));
        assert!(!plan.would_update.contains(&PathBuf::from(".rigging/rules/custom.md")));

        Ok(())
    }

    #[test]
    fn upgrade_only_touches_drift() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::with_files([
            (".rigging/version", "1.0.0\n"),
            (".rigging/old.txt", "stale"),
            (".rigging/rules/custom.md", "mine\n"),
            ("package.json", r#"{"scripts":{"lint":"rigging lint"}}"#),
            (".gitignore", "# >>> rigging\n.rigging/cache/\n"),
        ])?;
        let ctx = ProjectContext::default().with_installed(["tslint", "eslint"]);
        let plan = compute_plan(&tooling_schema(), Mode::Upgrade, &ctx, &fs)?;

        pretty_assertions::assert_eq!(
            names(&plan),
            vec!["rm .rigging/old.txt", "write .rigging/version"],
        );
        pretty_assertions::assert_eq!(plan.would_update, paths(&[".rigging/version"]));
        pretty_assertions::assert_eq!(plan.would_remove, paths(&[".rigging/old.txt"]));
        pretty_assertions::assert_eq!(plan.packages_to_remove, vec!["tslint"]);

        Ok(())
    }

    #[test]
    fn upgrade_ignores_trailing_whitespace_drift() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::with_files([("a/f.txt", "x\n\n")])?;
        let plan = compute_plan(
            &single_file_schema(),
            Mode::Upgrade,
            &ProjectContext::default(),
            &fs,
        )?;
        assert!(plan.is_empty());

        Ok(())
    }

    #[test]
    fn upgrade_fixes_non_executable_scripts() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::with_files([
            (".rigging/version", "2.0.0\n"),
            (".rigging/hooks/pre-commit", "#!/bin/sh\nrigging lint\n"),
            (".rigging/rules/custom.md", "# Rules\n"),
            ("package.json", r#"{"scripts":{"lint":"rigging lint"}}"#),
            (".gitignore", "# >>> rigging\n.rigging/cache/\n"),
        ])?;
        let ctx = ProjectContext::default().with_vcs(true);
        let plan = compute_plan(&tooling_schema(), Mode::Upgrade, &ctx, &fs)?;
        pretty_assertions::assert_eq!(names(&plan), vec!["chmod .rigging/hooks"]);

        fs.set_executable(Path::new(".rigging/hooks"))?;
        let plan = compute_plan(&tooling_schema(), Mode::Upgrade, &ctx, &fs)?;
        assert!(plan.is_empty());

        Ok(())
    }

    #[test]
    fn uninstall_respects_ownership_boundaries() -> anyhow::Result<()> {
        let fs = MemoryFileSystem::with_files([
            (".rigging/version", "2.0.0\n"),
            (".rigging/rules/custom.md", "# Rules\n"),
            (".rigging/rules/mine.md", "user rules\n"),
            ("package.json", r#"{"name":"demo","scripts":{"lint":"rigging lint"}}"#),
            (".gitignore", "node_modules/\n# >>> rigging\n.rigging/cache/\n"),
        ])?;
        let plan = compute_plan(
            &tooling_schema(),
            Mode::Uninstall,
            &ProjectContext::default(),
            &fs,
        )?;

        pretty_assertions::assert_eq!(
            names(&plan),
            vec![
                "rm .rigging/version",
                "json-unmerge package.json",
                "text-unpatch .gitignore",
                "rmdir .rigging/rules",
                "rmdir .rigging",
            ]
        );
        pretty_assertions::assert_eq!(plan.would_update, paths(&["package.json", ".gitignore"]));
        pretty_assertions::assert_eq!(plan.would_remove, paths(&[".rigging/version"]));

        let plan = compute_plan(
            &tooling_schema(),
            Mode::UninstallFull,
            &ProjectContext::default(),
            &fs,
        )?;
        pretty_assertions::assert_eq!(
            plan.would_remove,
            paths(&[".rigging/version", ".rigging/rules/custom.md"])
        );

        Ok(())
    }

    #[test]
    fn uninstall_removes_unlisted_parents_deepest_first() -> anyhow::Result<()> {
        let schema = Schema::builder("1")
            .owned_file("tools/bin/run.sh", FileDefinition::content("#!/bin/sh\n"))
            .build()?;
        let fs = MemoryFileSystem::with_files([("tools/bin/run.sh", "#!/bin/sh\n")])?;
        let plan = compute_plan(&schema, Mode::Uninstall, &ProjectContext::default(), &fs)?;

        pretty_assertions::assert_eq!(
            names(&plan),
            vec!["rm tools/bin/run.sh", "rmdir tools/bin", "rmdir tools"]
        );
        pretty_assertions::assert_eq!(
            plan.would_remove,
            paths(&["tools/bin/run.sh", "tools/bin", "tools"])
        );

        Ok(())
    }

    #[test]
    fn uninstall_removes_unlisted_parent_after_listed_child() -> anyhow::Result<()> {
        let schema = Schema::builder("1")
            .owned_dir("tools/bin")
            .owned_file("tools/run.sh", FileDefinition::content("#!/bin/sh\n"))
            .build()?;
        let fs = MemoryFileSystem::with_files([("tools/run.sh", "#!/bin/sh\n")])?;
        fs.create_dir_all(Path::new("tools/bin"))?;
        let plan = compute_plan(&schema, Mode::Uninstall, &ProjectContext::default(), &fs)?;

        pretty_assertions::assert_eq!(
            names(&plan),
            vec!["rm tools/run.sh", "rmdir tools/bin", "rmdir tools"]
        );
        pretty_assertions::assert_eq!(
            plan.would_remove,
            paths(&["tools/run.sh", "tools/bin", "tools"])
        );

        Ok(())
    }

    #[test]
    fn uninstall_full_reports_installed_packages() -> anyhow::Result<()> {
        let schema = Schema::builder("1")
            .base_package("eslint")
            .vcs_package("husky")
            .conditional_package("typescript", "typescript-eslint")
            .build()?;
        let ctx = ProjectContext::default().with_installed(["husky", "typescript-eslint", "react"]);

        let plan = compute_plan(&schema, Mode::Uninstall, &ctx, &MemoryFileSystem::new())?;
        assert!(plan.packages_to_remove.is_empty());

        let plan = compute_plan(&schema, Mode::UninstallFull, &ctx, &MemoryFileSystem::new())?;
        pretty_assertions::assert_eq!(plan.packages_to_remove, vec!["husky", "typescript-eslint"]);

        Ok(())
    }

    #[test_case(false, &[], vec!["eslint", "typescript-eslint"]; "no vcs")]
    #[test_case(true, &[], vec!["eslint", "husky", "lint-staged", "typescript-eslint"]; "with vcs")]
    #[test_case(
        true,
        &["eslint", "husky"],
        vec!["lint-staged", "typescript-eslint"];
        "partially installed"
    )]
    #[test]
    fn install_gates_packages(
        vcs: bool,
        installed: &[&str],
        expect: Vec<&str>,
    ) -> anyhow::Result<()> {
        let schema = Schema::builder("1")
            .base_package("eslint")
            .base_package("husky")
            .vcs_package("husky")
            .vcs_package("lint-staged")
            .conditional_package("typescript", "typescript-eslint")
            .conditional_package("react", "eslint-plugin-react")
            .build()?;
        let ctx = ProjectContext::default()
            .with_vcs(vcs)
            .with_capability("typescript", true)
            .with_capability("react", false)
            .with_installed(installed.iter().copied());

        let plan = compute_plan(&schema, Mode::Install, &ctx, &MemoryFileSystem::new())?;
        pretty_assertions::assert_eq!(plan.packages_to_install, expect);

        Ok(())
    }

    #[test]
    fn invalid_schema_is_rejected() {
        let mut schema = single_file_schema();
        schema.owned_dirs.push("a".into());

        let result = compute_plan(
            &schema,
            Mode::Install,
            &ProjectContext::default(),
            &MemoryFileSystem::new(),
        );
        assert!(matches!(result, Err(PlanError::Schema(SchemaError::DuplicateDir { .. }))));
    }

    #[test]
    fn dir_in_two_tiers_is_rejected() {
        let mut schema = single_file_schema();
        schema.preserved_dirs.push("a".into());

        let result = compute_plan(
            &schema,
            Mode::Uninstall,
            &ProjectContext::default(),
            &MemoryFileSystem::new(),
        );
        assert!(matches!(result, Err(PlanError::Schema(SchemaError::DirInManyTiers { .. }))));
    }
}
