//! Commands module - CLI command implementations.
//!
//! `shake` drives a full analysis run; `fix` writes the resulting edits back
//! to module sources.

mod fix;
mod shake;

pub use fix::{run_fix_imports, FixResult, ImportFixOptions};
pub use shake::{
    run_shake, ModuleFinding, NamedFix, NeedExplanation, ShakeOptions, ShakeReport, Workspace,
    EXIT_FINDINGS, EXIT_LOAD_ERROR,
};
