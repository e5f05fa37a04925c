// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Local configuration reconciliation engine.
//!
//! Rigging takes a declarative [`Schema`] of the directories, files, JSON
//! fragments, text fragments, and packages that a piece of dev-tooling wants
//! present in a project, and brings an arbitrary existing project into that
//! state. Later on, it can remove exactly what it added.
//!
//! # Lifecycle Modes
//!
//! Reconciliation happens in one of four [`Mode`]s: install, upgrade,
//! uninstall, and full uninstall. Each mode first computes a [`Plan`], which
//! is a pure and inspectable listing of [`Action`]s along with the paths that
//! are expected to be created, updated, or removed. A plan can be previewed as
//! a dry run, or handed over to the executor to mutate the project.
//!
//! # Ownership Model
//!
//! Every path in a schema belongs to one of three tiers:
//!
//! 1. __Owned__ paths are fully controlled. They are rewritten whenever their
//!    content drifts, and deleted on uninstall.
//! 2. __Managed__ paths are created once if absent, and never overwritten
//!    afterwards so that user customization survives upgrades.
//! 3. __Preserved__ directories are created on install, but only removed on
//!    uninstall if they turn out to be empty.
//!
//! Shared configuration files are never owned outright. Instead, rigging owns
//! a _slice_ of them through JSON merges and text patches that can be applied
//! and reverted symmetrically.

pub mod config;
pub mod context;
pub mod execute;
pub mod fs;
pub mod merge;
pub mod patch;
pub mod path;
pub mod plan;
pub mod reconcile;
pub mod schema;
pub mod template;

#[doc(inline)]
pub use crate::{
    config::SchemaDocument,
    context::ProjectContext,
    execute::{execute, Outcome},
    fs::{disk::DiskFileSystem, memory::MemoryFileSystem, FileSystem},
    plan::{action::Action, compute_plan, Mode, Plan},
    reconcile::{reconcile, ReconcileOptions, ReconcileResult, Reconciler},
    schema::{
        definition::{FileDefinition, JsonMergeDefinition, PatchOperation, TextPatchDefinition},
        PackageTable, Schema, SchemaBuilder,
    },
    template::TemplateRegistry,
};
