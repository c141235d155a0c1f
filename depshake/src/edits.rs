//! Accumulated import edits, keyed by module.

use serde::Serialize;
use std::collections::btree_map::{self, BTreeMap};

use crate::advisor::transitive_reduction;
use crate::bitset::ModuleSet;
use crate::graph::{ModuleId, ModuleRegistry};

/// Imports to drop from and add to one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleEdit {
    /// Imports to remove.
    pub remove: ModuleSet,
    /// Imports to add.
    pub add: ModuleSet,
}

impl ModuleEdit {
    /// Whether the edit changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }
}

/// An edit with module ids replaced by names, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedEdit {
    /// Edited module.
    pub module: String,
    /// Imports to remove, ascending by module id.
    pub remove: Vec<String>,
    /// Imports to add, ascending by module id.
    pub add: Vec<String>,
}

/// Per-module edits of a run.
#[derive(Debug, Clone, Default)]
pub struct EditSet {
    entries: BTreeMap<ModuleId, ModuleEdit>,
}

impl EditSet {
    /// Create an empty edit set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `target` for removal from `module`'s imports.
    pub fn remove(&mut self, module: ModuleId, target: ModuleId) {
        self.entries.entry(module).or_default().remove.insert(target);
    }

    /// Mark `target` for addition to `module`'s imports.
    pub fn add(&mut self, module: ModuleId, target: ModuleId) {
        self.entries.entry(module).or_default().add.insert(target);
    }

    /// The edit recorded for `module`, if any.
    #[must_use]
    pub fn get(&self, module: ModuleId) -> Option<&ModuleEdit> {
        self.entries.get(&module)
    }

    /// Edits in ascending module order.
    pub fn iter(&self) -> btree_map::Iter<'_, ModuleId, ModuleEdit> {
        self.entries.iter()
    }

    /// Number of edited modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no module is edited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every added import that another added import of the same module
    /// already implies transitively.
    pub fn reduce(&mut self, registry: &ModuleRegistry) {
        for edit in self.entries.values_mut() {
            edit.add = transitive_reduction(registry, &edit.add);
        }
        self.entries.retain(|_, edit| !edit.is_empty());
    }

    /// Keep only the edits of modules for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(ModuleId) -> bool) {
        self.entries.retain(|&module, _| keep(module));
    }

    /// The edits with names instead of ids.
    #[must_use]
    pub fn named(&self, registry: &ModuleRegistry) -> Vec<NamedEdit> {
        self.entries
            .iter()
            .map(|(&module, edit)| NamedEdit {
                module: registry.name(module).to_owned(),
                remove: registry.names(&edit.remove),
                add: registry.names(&edit.add),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a EditSet {
    type Item = (&'a ModuleId, &'a ModuleEdit);
    type IntoIter = btree_map::Iter<'a, ModuleId, ModuleEdit>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::MemorySource;
    use crate::test_utils::module;

    fn chain() -> ModuleRegistry {
        // C -> B -> A, D standalone
        let source = MemorySource::new()
            .with(module("A", &[], vec![]))
            .with(module("B", &["A"], vec![]))
            .with(module("C", &["B"], vec![]))
            .with(module("D", &[], vec![]))
            .with(module("Top", &["C", "D"], vec![]));
        let mut registry = ModuleRegistry::new();
        registry.load(&source, &["Top"]).unwrap();
        registry
    }

    #[test]
    fn test_accumulates_per_module() {
        let mut edits = EditSet::new();
        edits.remove(4, 1);
        edits.add(4, 0);
        edits.add(2, 0);
        edits.add(4, 0);

        assert_eq!(edits.len(), 2);
        let top = edits.get(4).unwrap();
        assert_eq!(top.remove, ModuleSet::singleton(1));
        assert_eq!(top.add, ModuleSet::singleton(0));
        let order: Vec<_> = edits.iter().map(|(&id, _)| id).collect();
        assert_eq!(order, vec![2, 4]);

        edits.retain(|id| id != 2);
        assert_eq!(edits.len(), 1);
        assert!(edits.get(2).is_none());
    }

    #[test]
    fn test_reduce_drops_implied_additions() {
        let registry = chain();
        let (a, b, c, d, top) = (0, 1, 2, 3, 4);
        let mut edits = EditSet::new();
        edits.add(top, a);
        edits.add(top, c);
        edits.add(top, d);
        edits.remove(top, b);
        edits.reduce(&registry);

        let edit = edits.get(top).unwrap();
        assert_eq!(edit.add, [c, d].into_iter().collect());
        assert_eq!(edit.remove, ModuleSet::singleton(b));
    }

    #[test]
    fn test_named_lists_names_in_id_order() {
        let registry = chain();
        let mut edits = EditSet::new();
        edits.remove(4, 3);
        edits.remove(4, 2);
        edits.add(4, 0);
        let named = edits.named(&registry);
        assert_eq!(
            named,
            vec![NamedEdit {
                module: "Top".to_owned(),
                remove: vec!["C".to_owned(), "D".to_owned()],
                add: vec!["A".to_owned()],
            }]
        );
    }
}
