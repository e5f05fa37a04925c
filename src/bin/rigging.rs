// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use rigging::{
    path::default_schema_path, DiskFileSystem, Mode, ProjectContext, ReconcileOptions,
    ReconcileResult, Reconciler, SchemaDocument,
};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::{env::current_dir, path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  rigging [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(flatten)]
    pub globals: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Install(opts) => run_mode(&self.globals, Mode::Install, opts.dry_run),
            Command::Upgrade(opts) => run_mode(&self.globals, Mode::Upgrade, opts.dry_run),
            Command::Uninstall(opts) => {
                let mode = if opts.full {
                    Mode::UninstallFull
                } else {
                    Mode::Uninstall
                };
                run_mode(&self.globals, mode, opts.dry_run)
            }
            Command::Diff(opts) => run_mode(&self.globals, opts.mode, true),
        }
    }
}

#[derive(Debug, Clone, Args)]
struct GlobalOptions {
    /// Path to schema document.
    #[arg(short, long, global = true, value_name = "path")]
    pub schema: Option<PathBuf>,

    /// Root of project to reconcile.
    #[arg(short, long, global = true, value_name = "dir")]
    pub root: Option<PathBuf>,

    /// Mark capability as present in the project.
    #[arg(short = 'w', long = "with", global = true, value_name = "capability")]
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Bring project into desired state from scratch.
    #[command(override_usage = "rigging install [options]")]
    Install(ModeOptions),

    /// Bring previously installed project up to date.
    #[command(override_usage = "rigging upgrade [options]")]
    Upgrade(ModeOptions),

    /// Remove everything rigging added to project.
    #[command(override_usage = "rigging uninstall [options]")]
    Uninstall(UninstallOptions),

    /// Show what a mode would change without changing anything.
    #[command(override_usage = "rigging diff [options] <mode>")]
    Diff(DiffOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ModeOptions {
    /// Show planned changes without applying them.
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct UninstallOptions {
    /// Remove managed files and report every installed package as well.
    #[arg(short, long)]
    pub full: bool,

    /// Show planned changes without applying them.
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DiffOptions {
    /// Mode to preview: install, upgrade, uninstall, or uninstall-full.
    #[arg(required = true, value_name = "mode")]
    pub mode: Mode,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_mode(globals: &GlobalOptions, mode: Mode, dry_run: bool) -> Result<()> {
    let root = match &globals.root {
        Some(root) => root.clone(),
        None => current_dir()?,
    };
    let schema_path = match &globals.schema {
        Some(path) => path.clone(),
        None => default_schema_path()?,
    };

    let schema = SchemaDocument::load(&schema_path)?.into_schema()?;
    let mut ctx = ProjectContext::detect(&root)?;
    for capability in &globals.capabilities {
        ctx = ctx.with_capability(capability, true);
    }

    let reconciler = Reconciler::new(schema, DiskFileSystem::new(&root))?;
    let result = reconciler.reconcile(mode, &ctx, ReconcileOptions { dry_run })?;
    report(&result);

    Ok(())
}

fn report(result: &ReconcileResult) {
    for action in &result.actions {
        info!("{action}");
    }

    let prefix = if result.applied { "" } else { "would be " };
    for path in &result.created {
        info!("{prefix}created {:?}", path.display());
    }
    for path in &result.updated {
        info!("{prefix}updated {:?}", path.display());
    }
    for path in &result.removed {
        info!("{prefix}removed {:?}", path.display());
    }

    if !result.packages_to_install.is_empty() {
        info!("packages to install: {}", result.packages_to_install.join(" "));
    }
    if !result.packages_to_remove.is_empty() {
        info!("packages to remove: {}", result.packages_to_remove.join(" "));
    }

    if result.actions.is_empty() {
        info!("{} has nothing to do", result.mode);
    }
}
