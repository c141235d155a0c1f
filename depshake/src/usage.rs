//! Usage analysis: which modules does a module actually need?
//!
//! A module needs another module when one of its declarations (type or body)
//! references a symbol the other module declares. The computation is a pure
//! function of the module and the symbol index, so all modules are analysed in
//! parallel and the results are joined by module id.

use indicatif::ProgressBar;
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::bitset::ModuleSet;
use crate::graph::{ModuleId, ModuleRegistry, SymbolIndex};

/// Why a module is needed: the first declaration that references it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedReason {
    /// Declaration of the analysed module containing the reference.
    pub declaration: String,
    /// Referenced symbol owned by the needed module.
    pub symbol: String,
}

/// Computes needs sets over a loaded registry.
#[derive(Debug, Clone, Copy)]
pub struct UsageAnalyzer<'a> {
    registry: &'a ModuleRegistry,
    index: &'a SymbolIndex,
}

impl<'a> UsageAnalyzer<'a> {
    /// Create an analyzer over `registry` resolving symbols through `index`.
    #[must_use]
    pub fn new(registry: &'a ModuleRegistry, index: &'a SymbolIndex) -> Self {
        Self { registry, index }
    }

    /// Modules owning a symbol referenced anywhere in `id`'s declarations.
    /// Never contains `id` itself.
    #[must_use]
    pub fn calc_needs(&self, id: ModuleId) -> ModuleSet {
        let mut needs = ModuleSet::with_capacity(self.registry.len());
        for decl in &self.registry.module(id).declarations {
            let mut record = |symbol: &str| {
                if let Some(owner) = self.index.owner_of(symbol) {
                    needs.insert(owner);
                }
            };
            decl.ty.for_each_reference(&mut record);
            if let Some(value) = &decl.value {
                value.for_each_reference(&mut record);
            }
        }
        needs.remove(id);
        needs
    }

    /// Needs of every loaded module, indexed by module id.
    ///
    /// Work is spread over the rayon pool; `progress` is advanced once per
    /// finished module.
    #[must_use]
    pub fn calc_all_needs(&self, progress: Option<&ProgressBar>) -> Vec<ModuleSet> {
        (0..self.registry.len())
            .into_par_iter()
            .map(|id| {
                let needs = self.calc_needs(id);
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                needs
            })
            .collect()
    }

    /// For every module `id` needs, the first declaration and symbol that
    /// caused the need, in declaration order.
    #[must_use]
    pub fn explain_needs(&self, id: ModuleId) -> BTreeMap<ModuleId, NeedReason> {
        let mut reasons = BTreeMap::new();
        for decl in &self.registry.module(id).declarations {
            let mut record = |symbol: &str| {
                let Some(owner) = self.index.owner_of(symbol) else {
                    return;
                };
                if owner != id {
                    reasons.entry(owner).or_insert_with(|| NeedReason {
                        declaration: decl.name.clone(),
                        symbol: symbol.to_owned(),
                    });
                }
            };
            decl.ty.for_each_reference(&mut record);
            if let Some(value) = &decl.value {
                value.for_each_reference(&mut record);
            }
        }
        reasons
    }
}
