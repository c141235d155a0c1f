//! Global symbol index.
//!
//! Maps every declared symbol name to the module that declares it.

use rustc_hash::FxHashMap;

use super::{ModuleId, ModuleRegistry};

/// A symbol declared by more than one module.
///
/// Well-formed input never produces these; the first declaration wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSymbol {
    /// The symbol name.
    pub symbol: String,
    /// Module that keeps ownership (lowest id).
    pub owner: ModuleId,
    /// Module whose declaration was ignored.
    pub ignored: ModuleId,
}

/// Symbol name to owning module.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    owners: FxHashMap<String, ModuleId>,
    duplicates: Vec<DuplicateSymbol>,
}

impl SymbolIndex {
    /// Fold the declared symbols of every loaded module into one index.
    #[must_use]
    pub fn build(registry: &ModuleRegistry) -> Self {
        let capacity = registry
            .iter()
            .map(|(_, module)| module.declarations.len())
            .sum();
        let mut index = Self {
            owners: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            duplicates: Vec::new(),
        };
        for (id, module) in registry.iter() {
            for decl in &module.declarations {
                if let Some(&owner) = index.owners.get(&decl.name) {
                    index.duplicates.push(DuplicateSymbol {
                        symbol: decl.name.clone(),
                        owner,
                        ignored: id,
                    });
                } else {
                    index.owners.insert(decl.name.clone(), id);
                }
            }
        }
        index
    }

    /// Module declaring `symbol`, if any loaded module does.
    #[must_use]
    pub fn owner_of(&self, symbol: &str) -> Option<ModuleId> {
        self.owners.get(symbol).copied()
    }

    /// Number of indexed symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Symbols that were declared more than once.
    #[must_use]
    pub fn duplicates(&self) -> &[DuplicateSymbol] {
        &self.duplicates
    }
}
