// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Reconciliation entry point.
//!
//! Tie planning and execution together. A dry run stops after planning, and
//! reports the predicted outcome instead of the observed one.

use crate::{
    context::ProjectContext,
    execute::{execute, ExecuteError, Outcome},
    fs::{disk::DiskFileSystem, FileSystem},
    plan::{action::Action, compute_plan, Mode, Plan, PlanError},
    schema::Schema,
};

use std::path::PathBuf;
use tracing::{info, instrument};

/// Knobs for a single reconciliation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Compute plan without applying it.
    pub dry_run: bool,
}

/// Result of a single reconciliation run.
///
/// Paths are what was observed when the plan was applied, or what was
/// predicted during a dry run.
#[derive(Debug, Clone)]
pub struct ReconcileResult {
    /// Mode that was reconciled.
    pub mode: Mode,

    /// Actions of the plan.
    pub actions: Vec<Action>,

    /// Whether actions were applied.
    pub applied: bool,

    /// Paths created.
    pub created: Vec<PathBuf>,

    /// Paths whose contents were replaced.
    pub updated: Vec<PathBuf>,

    /// Paths removed.
    pub removed: Vec<PathBuf>,

    /// Packages the caller should install.
    pub packages_to_install: Vec<String>,

    /// Packages the caller should remove.
    pub packages_to_remove: Vec<String>,
}

impl ReconcileResult {
    fn predicted(plan: Plan) -> Self {
        Self {
            mode: plan.mode,
            actions: plan.actions,
            applied: false,
            created: plan.would_create,
            updated: plan.would_update,
            removed: plan.would_remove,
            packages_to_install: plan.packages_to_install,
            packages_to_remove: plan.packages_to_remove,
        }
    }

    fn observed(plan: Plan, outcome: Outcome) -> Self {
        Self {
            mode: plan.mode,
            actions: plan.actions,
            applied: true,
            created: outcome.created,
            updated: outcome.updated,
            removed: outcome.removed,
            packages_to_install: plan.packages_to_install,
            packages_to_remove: plan.packages_to_remove,
        }
    }

    /// Check if nothing changed, or nothing would change.
    pub fn is_unchanged(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Reconcile project with schema under mode.
///
/// # Errors
///
/// - Return [`ReconcileError::Plan`] if plan cannot be computed.
/// - Return [`ReconcileError::Execute`] if plan cannot be applied.
#[instrument(skip(schema, ctx, fs), level = "debug")]
pub fn reconcile<F>(
    schema: &Schema,
    mode: Mode,
    ctx: &ProjectContext,
    fs: &F,
    options: ReconcileOptions,
) -> Result<ReconcileResult>
where
    F: FileSystem + ?Sized,
{
    let plan = compute_plan(schema, mode, ctx, fs)?;
    if options.dry_run {
        info!("dry run of {mode}, nothing applied");
        return Ok(ReconcileResult::predicted(plan));
    }

    let outcome = execute(&plan, ctx, fs)?;
    Ok(ReconcileResult::observed(plan, outcome))
}

/// Schema bound to the filesystem it reconciles.
///
/// Defaults to the real disk through [`DiskFileSystem`].
#[derive(Debug)]
pub struct Reconciler<F = DiskFileSystem>
where
    F: FileSystem,
{
    schema: Schema,
    fs: F,
}

impl<F> Reconciler<F>
where
    F: FileSystem,
{
    /// Bind schema to filesystem.
    ///
    /// # Errors
    ///
    /// - Return [`ReconcileError::Plan`] if schema is invalid.
    pub fn new(schema: Schema, fs: F) -> Result<Self> {
        schema.validate().map_err(PlanError::from)?;
        Ok(Self { schema, fs })
    }

    /// Compute plan for mode.
    ///
    /// # Errors
    ///
    /// - Return [`ReconcileError::Plan`] if plan cannot be computed.
    pub fn plan(&self, mode: Mode, ctx: &ProjectContext) -> Result<Plan> {
        compute_plan(&self.schema, mode, ctx, &self.fs).map_err(Into::into)
    }

    /// Apply previously computed plan.
    ///
    /// # Errors
    ///
    /// - Return [`ReconcileError::Execute`] if plan cannot be applied.
    pub fn execute(&self, plan: &Plan, ctx: &ProjectContext) -> Result<Outcome> {
        execute(plan, ctx, &self.fs).map_err(Into::into)
    }

    /// Plan and apply mode in one go.
    ///
    /// # Errors
    ///
    /// - Return [`ReconcileError::Plan`] if plan cannot be computed.
    /// - Return [`ReconcileError::Execute`] if plan cannot be applied.
    pub fn reconcile(
        &self,
        mode: Mode,
        ctx: &ProjectContext,
        options: ReconcileOptions,
    ) -> Result<ReconcileResult> {
        reconcile(&self.schema, mode, ctx, &self.fs, options)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }
}

/// Reconciliation error types.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Plan cannot be computed.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Plan cannot be applied.
    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

/// Friendly result alias :3
pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
