//! Import advice: the minimal edits that make a module import exactly what it
//! needs.
//!
//! For one module the advisor:
//!
//! 1. reduces the needs set to a minimal antichain of modules that generate
//!    it transitively, and computes the full closure of needs plus ignored
//!    modules;
//! 2. classifies every current import as used (in the closure) or unused;
//! 3. if anything is unused, re-adds the fewest needed modules whose closures
//!    restore coverage once the unused imports are gone;
//! 4. optionally repairs downstream modules that reached a removed import
//!    only through the edited module.
//!
//! Steps 1 to 3 only read the graph and are run in parallel. Step 4 writes
//! into other modules' edits and runs on the aggregating thread in ascending
//! module order, which keeps the output deterministic.
//!
//! Every ascending loop below relies on dependencies having smaller ids than
//! their dependents: when module `k` is examined, `trans_deps(k)` only
//! contains ids `<= k`.

use rayon::prelude::*;

use crate::bitset::ModuleSet;
use crate::edits::EditSet;
use crate::graph::{ModuleId, ModuleRegistry};
use crate::overrides::OverrideRules;

/// Result of reducing a needs set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    /// Minimal antichain generating the needs.
    pub deps: ModuleSet,
    /// Transitive closure of the needs plus the ignored modules.
    pub closure: ModuleSet,
}

/// Reduce `needs` to its minimal generating set and compute the closure of
/// `needs ∪ ignored`.
#[must_use]
pub fn reduce_needs(
    registry: &ModuleRegistry,
    needs: &ModuleSet,
    ignored: &ModuleSet,
) -> Reduction {
    let mut deps = needs.clone();
    let mut closure = needs | ignored;
    let mut cursor = deps.next_set_bit(0);
    while let Some(k) = cursor {
        let trans = registry.trans_deps(k);
        // Drop everything k already implies, but keep k itself.
        deps.difference_with(trans);
        deps.insert(k);
        closure |= trans;
        cursor = deps.next_set_bit(k + 1);
    }
    Reduction { deps, closure }
}

/// Minimal subset of `set` whose transitive closures cover all of `set`.
#[must_use]
pub fn transitive_reduction(registry: &ModuleRegistry, set: &ModuleSet) -> ModuleSet {
    reduce_needs(registry, set, &ModuleSet::new()).deps
}

/// Edits proposed for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advice {
    /// The module being edited.
    pub module: ModuleId,
    /// Unused imports, in import order, without duplicates.
    pub remove: Vec<ModuleId>,
    /// Imports to add so the remaining imports still cover the needs,
    /// ascending.
    pub add: Vec<ModuleId>,
}

/// Compute the remove/add advice for module `id`.
///
/// `ignored` holds modules that count as used even without a reference.
/// Returns `None` when no import is unused: additions are only proposed to
/// compensate for removals.
#[must_use]
pub fn visit_module(
    registry: &ModuleRegistry,
    id: ModuleId,
    needs: &ModuleSet,
    ignored: &ModuleSet,
) -> Option<Advice> {
    let Reduction { deps, closure } = reduce_needs(registry, needs, ignored);

    let mut remove = Vec::new();
    let mut removed = ModuleSet::new();
    let mut covered = ModuleSet::with_capacity(registry.len());
    for &import in registry.imports(id) {
        if closure.contains(import) {
            covered |= registry.trans_deps(import);
        } else if removed.insert(import) {
            remove.push(import);
        }
    }
    if remove.is_empty() {
        return None;
    }

    let mut add = Vec::new();
    for needed in &deps {
        if !covered.contains(needed) {
            add.push(needed);
            covered |= registry.trans_deps(needed);
        }
    }

    Some(Advice {
        module: id,
        remove,
        add,
    })
}

/// Modules that must import `removed` directly once `advice` is applied.
///
/// A candidate is a module above `advice.module` that needs `removed` and
/// reaches it only through the edited module: every import path from the
/// candidate to `removed` runs through it. Modules with another path, such
/// as a direct import of `removed`, keep their coverage and are skipped.
/// Candidates are then reduced to the minimal ones: a candidate is dropped
/// when another candidate lies in its transitive dependencies, since fixing
/// that one restores its coverage too.
///
/// Costs one scan over the modules above `advice.module` per removed import.
#[must_use]
pub fn downstream_targets(
    registry: &ModuleRegistry,
    needs: &[ModuleSet],
    advice: &Advice,
    removed: ModuleId,
) -> Vec<ModuleId> {
    let module = advice.module;
    let reaches = |k: ModuleId| registry.trans_deps(k).contains(removed);
    let still_reached = registry
        .imports(module)
        .iter()
        .filter(|&&k| !advice.remove.contains(&k))
        .chain(&advice.add)
        .any(|&k| reaches(k));
    if still_reached {
        return Vec::new();
    }

    // Modules that lose `removed` with the edit. Only modules with a larger
    // id can depend on `module`, and imports are settled before importers.
    let mut cut = ModuleSet::singleton(module);
    for j in module + 1..registry.len() {
        if !reaches(j) || !registry.trans_deps(j).contains(module) {
            continue;
        }
        let lost = registry
            .imports(j)
            .iter()
            .all(|&k| cut.contains(k) || !reaches(k));
        if lost {
            cut.insert(j);
        }
    }
    cut.remove(module);

    let candidates: ModuleSet = cut.iter().filter(|&j| needs[j].contains(removed)).collect();
    candidates
        .iter()
        .filter(|&j| (&candidates & registry.trans_deps(j)).len() == 1)
        .collect()
}

/// Downstream repair for one removed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamFix {
    /// The import that was removed.
    pub removed: ModuleId,
    /// Modules that get `removed` added directly, ascending.
    pub targets: Vec<ModuleId>,
}

/// Everything the advisor decided for one visited module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReport {
    /// The visited module.
    pub module: ModuleId,
    /// Unused imports.
    pub remove: Vec<ModuleId>,
    /// Imports added to restore coverage.
    pub add: Vec<ModuleId>,
    /// Downstream repairs, one per removed import that needed any.
    pub fixes: Vec<DownstreamFix>,
}

/// Output of a full advisor run.
#[derive(Debug, Clone, Default)]
pub struct AdvisorOutcome {
    /// Reduced edits for every affected module.
    pub edits: EditSet,
    /// Per visited module findings, ascending by module id.
    pub reports: Vec<ModuleReport>,
}

/// Runs the advice algorithm over a set of modules.
#[derive(Debug, Clone, Copy)]
pub struct ImportAdvisor<'a> {
    registry: &'a ModuleRegistry,
    needs: &'a [ModuleSet],
    overrides: &'a OverrideRules,
    downstream: bool,
}

impl<'a> ImportAdvisor<'a> {
    /// Create an advisor. `needs` must be indexed by module id.
    #[must_use]
    pub fn new(
        registry: &'a ModuleRegistry,
        needs: &'a [ModuleSet],
        overrides: &'a OverrideRules,
    ) -> Self {
        debug_assert_eq!(registry.len(), needs.len());
        Self {
            registry,
            needs,
            overrides,
            downstream: true,
        }
    }

    /// Builder-style method to enable or disable downstream repair.
    #[must_use]
    pub fn with_downstream(mut self, enabled: bool) -> Self {
        self.downstream = enabled;
        self
    }

    /// Advice for one module, honouring the override rules.
    #[must_use]
    pub fn visit(&self, id: ModuleId) -> Option<Advice> {
        if self.overrides.is_ignored_all(id) {
            return None;
        }
        visit_module(
            self.registry,
            id,
            &self.needs[id],
            &self.overrides.ignore_for(id),
        )
    }

    /// Downstream repairs for every import `advice` removes.
    #[must_use]
    pub fn downstream_fixes(&self, advice: &Advice) -> Vec<DownstreamFix> {
        advice
            .remove
            .iter()
            .filter_map(|&removed| {
                let targets = downstream_targets(self.registry, self.needs, advice, removed);
                (!targets.is_empty()).then_some(DownstreamFix { removed, targets })
            })
            .collect()
    }

    /// Visit every module in `modules` and collect the resulting edits.
    #[must_use]
    pub fn run(&self, modules: &ModuleSet) -> AdvisorOutcome {
        let ids: Vec<ModuleId> = modules.iter().collect();
        // Collecting an indexed parallel iterator keeps ascending id order.
        let advice: Vec<Advice> = ids.par_iter().filter_map(|&id| self.visit(id)).collect();

        let mut edits = EditSet::new();
        let mut reports = Vec::with_capacity(advice.len());
        for advice in advice {
            for &removed in &advice.remove {
                edits.remove(advice.module, removed);
            }
            for &added in &advice.add {
                edits.add(advice.module, added);
            }
            let fixes = if self.downstream {
                self.downstream_fixes(&advice)
            } else {
                Vec::new()
            };
            for fix in &fixes {
                for &target in &fix.targets {
                    edits.add(target, fix.removed);
                }
            }
            reports.push(ModuleReport {
                module: advice.module,
                remove: advice.remove,
                add: advice.add,
                fixes,
            });
        }
        edits.reduce(self.registry);
        AdvisorOutcome { edits, reports }
    }
}
