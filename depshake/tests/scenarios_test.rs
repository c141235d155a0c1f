//! End-to-end tests for the advice pipeline on small module graphs.
//!
//! Each test builds artifacts in memory, runs load -> index -> needs ->
//! advisor, and checks the reported edits by module name.
#![allow(clippy::unwrap_used)]

use depshake::advisor::{AdvisorOutcome, ImportAdvisor};
use depshake::artifact::{MemorySource, ModuleArtifact};
use depshake::bitset::ModuleSet;
use depshake::edits::NamedEdit;
use depshake::graph::{ModuleRegistry, SymbolIndex};
use depshake::overrides::{OverrideDocument, OverrideRules};
use depshake::test_utils::{decl, module};
use depshake::usage::UsageAnalyzer;

struct Run {
    registry: ModuleRegistry,
    outcome: AdvisorOutcome,
}

impl Run {
    fn edits(&self) -> Vec<NamedEdit> {
        self.outcome.edits.named(&self.registry)
    }

    fn edit(&self, module: &str) -> Option<NamedEdit> {
        self.edits().into_iter().find(|e| e.module == module)
    }
}

fn shake(artifacts: &[ModuleArtifact], doc: &OverrideDocument, downstream: bool) -> Run {
    let source = artifacts
        .iter()
        .cloned()
        .fold(MemorySource::new(), MemorySource::with);
    let roots: Vec<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
    let mut registry = ModuleRegistry::new();
    registry.load(&source, &roots).unwrap();
    let index = SymbolIndex::build(&registry);
    let needs = UsageAnalyzer::new(&registry, &index).calc_all_needs(None);
    let rules = OverrideRules::resolve(doc, &registry);
    let all: ModuleSet = (0..registry.len()).collect();
    let outcome = ImportAdvisor::new(&registry, &needs, &rules)
        .with_downstream(downstream)
        .run(&all);
    Run { registry, outcome }
}

fn no_overrides() -> OverrideDocument {
    OverrideDocument {
        ignore_import: Vec::new(),
        ..OverrideDocument::default()
    }
}

/// Rewrite the artifacts' import lists as a source fix would.
fn apply(artifacts: &[ModuleArtifact], edits: &[NamedEdit]) -> Vec<ModuleArtifact> {
    artifacts
        .iter()
        .map(|artifact| {
            let mut artifact = artifact.clone();
            if let Some(edit) = edits.iter().find(|e| e.module == artifact.name) {
                let mut seen = Vec::new();
                artifact.imports.retain(|i| {
                    let keep = !edit.remove.contains(i) && !seen.contains(i);
                    seen.push(i.clone());
                    keep
                });
                for added in &edit.add {
                    if !artifact.imports.contains(added) {
                        artifact.imports.push(added.clone());
                    }
                }
            }
            artifact
        })
        .collect()
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|&s| s.to_owned()).collect()
}

#[test]
fn test_unused_import_is_removed() {
    let artifacts = vec![
        module("A", &[], vec![decl("A.s", &[])]),
        module("B", &["A"], vec![decl("B.t", &["A.s"])]),
        module("C", &["B"], vec![decl("C.u", &[])]),
    ];
    let run = shake(&artifacts, &no_overrides(), true);

    assert!(run.edit("B").is_none());
    let c = run.edit("C").unwrap();
    assert_eq!(c.remove, names(&["B"]));
    assert!(c.add.is_empty());
    assert_eq!(run.edits().len(), 1);
}

#[test]
fn test_lost_coverage_is_re_added_directly() {
    let artifacts = vec![
        module("A", &[], vec![decl("A.s", &[])]),
        module("B", &["A"], vec![decl("B.t", &["A.s"])]),
        module("Z", &[], vec![decl("Z.z", &[])]),
        module("C", &["B", "Z"], vec![decl("C.u", &["A.s"])]),
    ];
    let run = shake(&artifacts, &no_overrides(), true);

    let c = run.edit("C").unwrap();
    assert_eq!(c.remove, names(&["B", "Z"]));
    assert_eq!(c.add, names(&["A"]));

    let report = &run.outcome.reports[0];
    assert_eq!(run.registry.name(report.module), "C");
    assert_eq!(report.remove.len(), 2);
}

fn downstream_chain(c_needs_a: bool) -> Vec<ModuleArtifact> {
    let c_refs: &[&str] = if c_needs_a {
        &["A.s", "B.t"]
    } else {
        &["B.t"]
    };
    vec![
        module("A", &[], vec![decl("A.s", &[])]),
        module("B", &["A"], vec![decl("B.t", &[])]),
        module("C", &["B"], vec![decl("C.u", c_refs)]),
        module("D", &["C"], vec![decl("D.v", &["A.s", "C.u"])]),
    ]
}

#[test]
fn test_downstream_repair_targets_first_module_needing_the_import() {
    let run = shake(&downstream_chain(false), &no_overrides(), true);

    let b = run.edit("B").unwrap();
    assert_eq!(b.remove, names(&["A"]));
    // C never uses A, so the closest module that does is D.
    assert!(run.edit("C").is_none());
    assert_eq!(run.edit("D").unwrap().add, names(&["A"]));

    let fixes = &run.outcome.reports[0].fixes;
    assert_eq!(fixes.len(), 1);
    assert_eq!(run.registry.name(fixes[0].removed), "A");
}

#[test]
fn test_downstream_repair_keeps_only_minimal_targets() {
    let run = shake(&downstream_chain(true), &no_overrides(), true);

    assert_eq!(run.edit("B").unwrap().remove, names(&["A"]));
    // Fixing C restores A for D as well.
    assert_eq!(run.edit("C").unwrap().add, names(&["A"]));
    assert!(run.edit("D").is_none());
}

#[test]
fn test_downstream_repair_can_be_disabled() {
    let run = shake(&downstream_chain(true), &no_overrides(), false);
    assert_eq!(run.edits().len(), 1);
    assert!(run.outcome.reports[0].fixes.is_empty());
}

#[test]
fn test_downstream_repair_skips_modules_importing_it_directly() {
    let artifacts = vec![
        module("A", &[], vec![decl("A.s", &[])]),
        module("B", &["A"], vec![decl("B.t", &[])]),
        module("C", &["B", "A"], vec![decl("C.u", &["A.s", "B.t"])]),
    ];
    let run = shake(&artifacts, &no_overrides(), true);

    assert_eq!(run.edit("B").unwrap().remove, names(&["A"]));
    assert!(run.edit("C").is_none());
    assert_eq!(run.edits().len(), 1);
    assert!(run.outcome.reports[0].fixes.is_empty());
}

#[test]
fn test_ignore_all_suppresses_removals() {
    let artifacts = vec![
        module("A", &[], vec![decl("A.s", &[])]),
        module("B", &["A"], vec![decl("B.t", &[])]),
        module("C", &["B"], vec![decl("C.u", &[])]),
    ];
    let mut doc = no_overrides();
    doc.ignore_all = names(&["C"]);
    let run = shake(&artifacts, &doc, true);

    assert!(run.edit("C").is_none());
    // B is still analysed.
    assert_eq!(run.edit("B").unwrap().remove, names(&["A"]));
}

#[test]
fn test_ignored_imports_count_as_used() {
    let artifacts = vec![
        module("Init", &[], vec![decl("Init.Nat", &[])]),
        module("A", &["Init"], vec![decl("A.s", &[])]),
        module("B", &["Init", "A"], vec![decl("B.t", &["A.s"])]),
        module("C", &["Init", "B"], vec![decl("C.u", &["B.t"])]),
    ];
    let run = shake(&artifacts, &OverrideDocument::default(), true);
    assert!(run.edits().is_empty());

    // Without overrides only A's direct import of Init is unused: B and C
    // still reach Init through A.
    let run = shake(&artifacts, &no_overrides(), true);
    assert_eq!(run.edit("A").unwrap().remove, names(&["Init"]));
    assert_eq!(run.edits().len(), 1);

    let mut doc = no_overrides();
    doc.ignore.insert("A".to_owned(), names(&["Init"]));
    let run = shake(&artifacts, &doc, true);
    assert!(run.edits().is_empty());
}

#[test]
fn test_applying_edits_reaches_a_fixed_point() {
    let graphs = vec![
        vec![
            module("A", &[], vec![decl("A.s", &[])]),
            module("B", &["A"], vec![decl("B.t", &["A.s"])]),
            module("Z", &[], vec![decl("Z.z", &[])]),
            module("C", &["B", "Z", "B"], vec![decl("C.u", &["A.s"])]),
        ],
        downstream_chain(false),
        downstream_chain(true),
        vec![
            module("A", &[], vec![decl("A.a", &[])]),
            module("B", &["A"], vec![decl("B.b", &["A.a"])]),
            module("C", &["A"], vec![decl("C.c", &["A.a"])]),
            module("D", &["B", "C"], vec![decl("D.d", &["B.b"])]),
            module("E", &["D"], vec![decl("E.e", &["C.c", "D.d"])]),
            module("F", &["E", "A"], vec![decl("F.f", &["A.a", "C.c"])]),
        ],
    ];
    for artifacts in graphs {
        let first = shake(&artifacts, &no_overrides(), true);
        assert!(!first.edits().is_empty());
        let fixed = apply(&artifacts, &first.edits());
        let second = shake(&fixed, &no_overrides(), true);
        assert!(
            second.edits().is_empty(),
            "edits after fixing: {:?}",
            second.edits()
        );
    }
}
