//! Module dependency graph.
//!
//! - `registry`: load-order module numbering with direct and transitive
//!   dependency bitsets
//! - `symbols`: global symbol to owning module index

mod registry;
mod symbols;

pub use registry::{ImportList, Module, ModuleId, ModuleRegistry};
pub use symbols::{DuplicateSymbol, SymbolIndex};
