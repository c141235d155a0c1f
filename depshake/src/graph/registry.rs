//! Module registry and dependency graph.
//!
//! Modules are numbered densely in load order. A module only receives its id
//! after all of its imports have been loaded, so every dependency has a
//! strictly smaller id than its dependents. The analysis relies on this: a
//! pass over ids in ascending order always sees a module's transitive closure
//! fully resolved.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::artifact::{ArtifactSource, Declaration, LoadError};
use crate::bitset::ModuleSet;

/// Dense module index, assigned in load order.
pub type ModuleId = usize;

/// Import list of one module. Most modules import only a handful of others.
pub type ImportList = SmallVec<[ModuleId; 8]>;

/// A loaded module.
#[derive(Debug, Clone)]
pub struct Module {
    /// Dotted module name.
    pub name: String,
    /// Direct imports in source order. May contain duplicates.
    pub imports: ImportList,
    /// Declarations of the module.
    pub declarations: Vec<Declaration>,
}

/// All loaded modules plus their direct and transitive dependency sets.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<Module>,
    ids: FxHashMap<String, ModuleId>,
    deps: Vec<ModuleSet>,
    trans_deps: Vec<ModuleSet>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `roots` and everything they import.
    ///
    /// Returns the set of roots and the union of their transitive closures.
    /// Modules already registered by an earlier call are reused.
    ///
    /// # Errors
    ///
    /// Fails if any reachable artifact is missing or unusable, or if the
    /// imports form a cycle. No partial graph should be used after an error.
    pub fn load<S, N>(
        &mut self,
        source: &S,
        roots: &[N],
    ) -> Result<(ModuleSet, ModuleSet), LoadError>
    where
        S: ArtifactSource + ?Sized,
        N: AsRef<str>,
    {
        let mut direct = ModuleSet::new();
        let mut transitive = ModuleSet::new();
        let mut in_progress = Vec::new();
        for root in roots {
            let id = self.load_module(source, root.as_ref(), &mut in_progress)?;
            direct.insert(id);
            transitive |= &self.trans_deps[id];
        }
        Ok((direct, transitive))
    }

    fn load_module<S>(
        &mut self,
        source: &S,
        name: &str,
        in_progress: &mut Vec<String>,
    ) -> Result<ModuleId, LoadError>
    where
        S: ArtifactSource + ?Sized,
    {
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }
        if let Some(start) = in_progress.iter().position(|pending| pending == name) {
            let mut cycle = in_progress[start..].to_vec();
            cycle.push(name.to_owned());
            return Err(LoadError::Cycle(cycle));
        }

        let artifact = source.load(name)?;
        if artifact.name != name {
            return Err(LoadError::NameMismatch {
                expected: name.to_owned(),
                found: artifact.name,
            });
        }

        in_progress.push(artifact.name.clone());
        let mut imports = ImportList::new();
        let mut deps = ModuleSet::new();
        let mut trans_deps = ModuleSet::new();
        for import in &artifact.imports {
            let dep = self.load_module(source, import, in_progress)?;
            imports.push(dep);
            deps.insert(dep);
            trans_deps |= &self.trans_deps[dep];
        }
        in_progress.pop();

        let id = self.modules.len();
        trans_deps.insert(id);
        self.ids.insert(artifact.name.clone(), id);
        self.modules.push(Module {
            name: artifact.name,
            imports,
            declarations: artifact.declarations,
        });
        self.deps.push(deps);
        self.trans_deps.push(trans_deps);
        Ok(id)
    }

    /// Number of loaded modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module has been loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Id of the module called `name`, if loaded.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<ModuleId> {
        self.ids.get(name).copied()
    }

    /// The module with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this registry.
    #[must_use]
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id]
    }

    /// Name of the module with the given id.
    #[must_use]
    pub fn name(&self, id: ModuleId) -> &str {
        &self.modules[id].name
    }

    /// Names of the given modules, in the iteration order of `ids`.
    pub fn names<I>(&self, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = ModuleId>,
    {
        ids.into_iter().map(|id| self.name(id).to_owned()).collect()
    }

    /// Direct imports of a module, in source order.
    #[must_use]
    pub fn imports(&self, id: ModuleId) -> &[ModuleId] {
        &self.modules[id].imports
    }

    /// Direct dependency set of a module.
    #[must_use]
    pub fn deps(&self, id: ModuleId) -> &ModuleSet {
        &self.deps[id]
    }

    /// Reflexive transitive closure of a module's imports.
    #[must_use]
    pub fn trans_deps(&self, id: ModuleId) -> &ModuleSet {
        &self.trans_deps[id]
    }

    /// Iterate over `(id, module)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules.iter().enumerate()
    }

    /// Whether the module belongs to `package`: it is the package root itself
    /// or one of its dotted descendants.
    #[must_use]
    pub fn in_package(&self, id: ModuleId, package: &str) -> bool {
        let name = self.name(id);
        name == package
            || name
                .strip_prefix(package)
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::MemorySource;
    use crate::test_utils::module;

    fn diamond() -> MemorySource {
        // D -> B -> A, D -> C -> A
        MemorySource::new()
            .with(module("A", &[], vec![]))
            .with(module("B", &["A"], vec![]))
            .with(module("C", &["A"], vec![]))
            .with(module("D", &["B", "C"], vec![]))
    }

    #[test]
    fn test_dependencies_get_smaller_ids() {
        let mut registry = ModuleRegistry::new();
        registry.load(&diamond(), &["D"]).unwrap();

        assert_eq!(registry.len(), 4);
        for (id, _) in registry.iter() {
            for dep in registry.trans_deps(id) {
                assert!(dep <= id);
            }
        }
        assert_eq!(registry.id_of("A"), Some(0));
        assert_eq!(registry.id_of("D"), Some(3));
    }

    #[test]
    fn test_transitive_closure_is_reflexive_and_monotone() {
        let mut registry = ModuleRegistry::new();
        registry.load(&diamond(), &["D"]).unwrap();

        for (id, _) in registry.iter() {
            assert!(registry.trans_deps(id).contains(id));
            for dep in registry.deps(id) {
                assert!(registry.trans_deps(dep).is_subset(registry.trans_deps(id)));
            }
        }
        let d = registry.id_of("D").unwrap();
        assert_eq!(registry.trans_deps(d).len(), 4);
    }

    #[test]
    fn test_load_returns_root_sets_and_memoizes() {
        let mut registry = ModuleRegistry::new();
        let (direct, transitive) = registry.load(&diamond(), &["B", "C"]).unwrap();
        let b = registry.id_of("B").unwrap();
        let c = registry.id_of("C").unwrap();
        assert_eq!(direct, [b, c].into_iter().collect());
        assert_eq!(transitive.len(), 3);

        // Second call reuses A, B and C.
        registry.load(&diamond(), &["D"]).unwrap();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.id_of("B"), Some(b));
    }

    #[test]
    fn test_duplicate_imports_keep_order_but_single_bit() {
        let source = MemorySource::new()
            .with(module("A", &[], vec![]))
            .with(module("B", &["A", "A"], vec![]));
        let mut registry = ModuleRegistry::new();
        registry.load(&source, &["B"]).unwrap();
        let b = registry.id_of("B").unwrap();
        assert_eq!(registry.imports(b), &[0, 0]);
        assert_eq!(registry.deps(b).len(), 1);
    }

    #[test]
    fn test_missing_module_is_fatal() {
        let source = MemorySource::new().with(module("B", &["A"], vec![]));
        let mut registry = ModuleRegistry::new();
        let err = registry.load(&source, &["B"]).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { ref name, .. } if name == "A"));
    }

    #[test]
    fn test_cycle_fails_fast() {
        let source = MemorySource::new()
            .with(module("A", &["C"], vec![]))
            .with(module("B", &["A"], vec![]))
            .with(module("C", &["B"], vec![]));
        let mut registry = ModuleRegistry::new();
        let err = registry.load(&source, &["A"]).unwrap_err();
        match err {
            LoadError::Cycle(path) => assert_eq!(path, vec!["A", "C", "B", "A"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_import_is_a_cycle() {
        let source = MemorySource::new().with(module("A", &["A"], vec![]));
        let err = ModuleRegistry::new().load(&source, &["A"]).unwrap_err();
        assert!(matches!(err, LoadError::Cycle(_)));
    }

    #[test]
    fn test_name_mismatch() {
        let mut source = MemorySource::new();
        source.insert(module("Other", &[], vec![]));
        // Serve "Other" under the name "A".
        struct Renamed(MemorySource);
        impl ArtifactSource for Renamed {
            fn load(&self, _name: &str) -> Result<crate::artifact::ModuleArtifact, LoadError> {
                self.0.load("Other")
            }
        }
        let err = ModuleRegistry::new()
            .load(&Renamed(source), &["A"])
            .unwrap_err();
        assert!(matches!(err, LoadError::NameMismatch { .. }));
    }

    #[test]
    fn test_in_package() {
        let source = MemorySource::new()
            .with(module("Pkg", &[], vec![]))
            .with(module("Pkg.Core", &["Pkg"], vec![]))
            .with(module("PkgExtra", &["Pkg.Core"], vec![]));
        let mut registry = ModuleRegistry::new();
        registry.load(&source, &["PkgExtra"]).unwrap();
        assert!(registry.in_package(registry.id_of("Pkg").unwrap(), "Pkg"));
        assert!(registry.in_package(registry.id_of("Pkg.Core").unwrap(), "Pkg"));
        assert!(!registry.in_package(registry.id_of("PkgExtra").unwrap(), "Pkg"));
    }
}
