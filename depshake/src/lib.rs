//! Core library for the depshake import analyzer.
//!
//! Given the compiled artifacts of a module graph, depshake works out which
//! imports each module actually needs and computes the minimal edits that make
//! every module import exactly those modules, directly or through a covering
//! transitive chain.
//!
//! The pipeline, leaf first:
//!
//! 1. [`graph::ModuleRegistry`] loads artifacts through an
//!    [`artifact::ArtifactSource`] and numbers modules so that dependencies
//!    always have smaller ids than their dependents.
//! 2. [`graph::SymbolIndex`] maps declared symbols to their modules.
//! 3. [`usage::UsageAnalyzer`] computes each module's needs set.
//! 4. [`advisor::ImportAdvisor`] turns needs and current imports into an
//!    [`edits::EditSet`], honouring [`overrides::OverrideRules`].
//! 5. [`fix`] applies edits to source files.

#![allow(
    clippy::similar_names,
    clippy::format_push_string,
    clippy::items_after_statements
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Import advice: minimal remove/add edits and downstream repair.
pub mod advisor;

/// Compiled module artifacts and the sources that load them.
pub mod artifact;

/// Dense bitsets over module ids.
pub mod bitset;

/// Module for defining the command-line interface arguments and structs.
pub mod cli;

/// Module for handling CLI commands and their execution logic.
pub mod commands;

/// Module for loading configuration.
pub mod config;

/// Module containing shared constants and regex patterns.
pub mod constants;

/// Accumulated per-module edits.
pub mod edits;

/// Module defining the entry point logic.
pub mod entry_point;

/// Source patching: header parsing and byte-range rewriting.
pub mod fix;

/// Module graph and symbol index.
pub mod graph;

/// Module for CLI output formatting with colored text and progress bars.
pub mod output;

/// The override document and its resolved rules.
pub mod overrides;

/// Builders for artifacts used by unit and integration tests.
pub mod test_utils;

/// Usage analysis: which modules a module references.
pub mod usage;

/// Module containing utility functions.
pub mod utils;
