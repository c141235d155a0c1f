//! The shake command: load the module graph, compute needs and import
//! advice, report it, and optionally record exceptions or fix sources.

use crate::advisor::{ImportAdvisor, ModuleReport};
use crate::artifact::SearchPathSource;
use crate::bitset::ModuleSet;
use crate::edits::NamedEdit;
use crate::graph::{ModuleRegistry, SymbolIndex};
use crate::output::{create_progress_bar, print_report};
use crate::overrides::{OverrideDocument, OverrideRules};
use crate::usage::UsageAnalyzer;
use crate::utils::normalize_display_path;

use super::fix::{run_fix_imports, FixResult, ImportFixOptions};

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

/// Exit code when edits were found in a dry run.
pub const EXIT_FINDINGS: i32 = 1;
/// Exit code when the module graph cannot be loaded.
pub const EXIT_LOAD_ERROR: i32 = 2;

/// Resolved options for a shake run (CLI flags merged over the settings file).
#[derive(Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ShakeOptions {
    /// Root modules to load.
    pub roots: Vec<String>,
    /// Primary package.
    pub package: Option<String>,
    /// Artifact search path.
    pub search_path: Vec<PathBuf>,
    /// Source directories for `--fix`.
    pub source_roots: Vec<PathBuf>,
    /// Source file extension.
    pub source_extension: String,
    /// Override document path.
    pub overrides_path: PathBuf,
    /// Apply edits to sources.
    pub fix: bool,
    /// Record findings as exceptions.
    pub update: bool,
    /// Record exceptions globally.
    pub global: bool,
    /// Restrict analysis and edits to the primary package.
    pub package_only: bool,
    /// Repair downstream modules.
    pub downstream: bool,
    /// Explain kept and added imports.
    pub explain: bool,
    /// JSON output.
    pub json: bool,
    /// Verbose logging.
    pub verbose: bool,
}

/// Downstream repair with names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedFix {
    /// Import removed from the visited module.
    pub removed: String,
    /// Modules that get it added directly.
    pub targets: Vec<String>,
}

/// Why a kept or added import is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeedExplanation {
    /// The needed module.
    pub module: String,
    /// Declaration containing the first reference.
    pub declaration: String,
    /// Referenced symbol.
    pub symbol: String,
}

/// Findings for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleFinding {
    /// Module name.
    pub module: String,
    /// Unused imports.
    pub remove: Vec<String>,
    /// Imports added to keep coverage.
    pub add: Vec<String>,
    /// Downstream repairs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<NamedFix>,
    /// Reasons for kept and added imports, with `--explain`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<NeedExplanation>,
}

/// Everything a run reports.
#[derive(Debug, Clone, Serialize)]
pub struct ShakeReport {
    /// Number of modules loaded.
    pub modules_loaded: usize,
    /// Number of modules analysed for unused imports.
    pub modules_analyzed: usize,
    /// Per-module findings, in module load order.
    pub findings: Vec<ModuleFinding>,
    /// Reduced edits to apply, in module load order.
    pub edits: Vec<NamedEdit>,
    /// Source files rewritten by `--fix`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applied: Vec<FixResult>,
}

impl ShakeReport {
    /// Whether the run found nothing to change.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.edits.is_empty()
    }
}

/// Loaded graph plus everything derived from it.
pub struct Workspace {
    /// Module graph.
    pub registry: ModuleRegistry,
    /// Symbol owners.
    pub index: SymbolIndex,
    /// Needs per module id.
    pub needs: Vec<ModuleSet>,
}

impl Workspace {
    /// Build the derived data for a loaded registry.
    #[must_use]
    pub fn analyze(registry: ModuleRegistry, show_progress: bool, verbose: bool) -> Self {
        let index = SymbolIndex::build(&registry);
        if verbose {
            for dup in index.duplicates() {
                eprintln!(
                    "[VERBOSE] Symbol {} declared by both {} and {}; keeping {}",
                    dup.symbol,
                    registry.name(dup.owner),
                    registry.name(dup.ignored),
                    registry.name(dup.owner)
                );
            }
        }

        let progress = show_progress.then(|| create_progress_bar(registry.len() as u64));
        let needs = UsageAnalyzer::new(&registry, &index).calc_all_needs(progress.as_ref());
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
        Self {
            registry,
            index,
            needs,
        }
    }

    /// Modules to visit: all loaded modules, or only the package's.
    #[must_use]
    pub fn targets(&self, package: Option<&str>) -> ModuleSet {
        self.registry
            .iter()
            .map(|(id, _)| id)
            .filter(|&id| match package {
                Some(p) => self.registry.in_package(id, p),
                None => true,
            })
            .collect()
    }

    fn finding(&self, report: &ModuleReport, explain: bool) -> ModuleFinding {
        let registry = &self.registry;
        let reasons = if explain {
            let removed: ModuleSet = report.remove.iter().copied().collect();
            let mut shown: ModuleSet = registry
                .imports(report.module)
                .iter()
                .copied()
                .filter(|id| !removed.contains(*id))
                .collect();
            shown.extend(report.add.iter().copied());
            UsageAnalyzer::new(registry, &self.index)
                .explain_needs(report.module)
                .into_iter()
                .filter(|(id, _)| shown.contains(*id))
                .map(|(id, reason)| NeedExplanation {
                    module: registry.name(id).to_owned(),
                    declaration: reason.declaration,
                    symbol: reason.symbol,
                })
                .collect()
        } else {
            Vec::new()
        };
        ModuleFinding {
            module: registry.name(report.module).to_owned(),
            remove: registry.names(report.remove.iter().copied()),
            add: registry.names(report.add.iter().copied()),
            fixes: report
                .fixes
                .iter()
                .map(|fix| NamedFix {
                    removed: registry.name(fix.removed).to_owned(),
                    targets: registry.names(fix.targets.iter().copied()),
                })
                .collect(),
            reasons,
        }
    }
}

/// Run the analysis described by `options`, printing to `writer`.
///
/// Returns the process exit code: 0 when nothing needs changing or the
/// changes were handled by `--fix`/`--update`, 1 when a dry run found edits,
/// 2 when the module graph could not be loaded.
///
/// # Errors
///
/// Returns an error if `--package-only` is given without a package, or if
/// writing output, the override document or a source file fails.
pub fn run_shake<W: Write>(options: &ShakeOptions, mut writer: W) -> Result<i32> {
    let start = Instant::now();
    let scope = if options.package_only {
        let package = options.package.as_deref().ok_or_else(|| {
            anyhow::anyhow!("--package-only needs a package (use --package or set `package`)")
        })?;
        Some(package)
    } else {
        None
    };

    if options.verbose {
        eprintln!("[VERBOSE] Roots: {:?}", options.roots);
        eprintln!("[VERBOSE] Search path: {:?}", options.search_path);
    }
    let source = SearchPathSource::new(options.search_path.clone());
    let mut registry = ModuleRegistry::new();
    if let Err(e) = registry.load(&source, &options.roots) {
        eprintln!("{} {e}", "Error:".red().bold());
        return Ok(EXIT_LOAD_ERROR);
    }
    if options.verbose {
        eprintln!(
            "[VERBOSE] Loaded {} modules in {:.2?}",
            registry.len(),
            start.elapsed()
        );
    }

    let show_progress = !options.json && !options.verbose;
    let workspace = Workspace::analyze(registry, show_progress, options.verbose);
    let registry = &workspace.registry;

    let mut doc = OverrideDocument::load_or_default(&options.overrides_path, options.verbose);
    let rules = OverrideRules::resolve(&doc, registry);

    let targets = workspace.targets(scope);
    let mut outcome = ImportAdvisor::new(registry, &workspace.needs, &rules)
        .with_downstream(options.downstream)
        .run(&targets);
    if scope.is_some() {
        outcome.edits.retain(|id| targets.contains(id));
        for report in &mut outcome.reports {
            for fix in &mut report.fixes {
                fix.targets.retain(|&id| targets.contains(id));
            }
            report.fixes.retain(|fix| !fix.targets.is_empty());
        }
    }
    if options.verbose {
        eprintln!(
            "[VERBOSE] Analysed {} modules in {:.2?}",
            targets.len(),
            start.elapsed()
        );
    }

    let mut report = ShakeReport {
        modules_loaded: registry.len(),
        modules_analyzed: targets.len(),
        findings: outcome
            .reports
            .iter()
            .map(|r| workspace.finding(r, options.explain))
            .collect(),
        edits: outcome.edits.named(registry),
        applied: Vec::new(),
    };

    // JSON goes out once, after `--fix` has filled in `applied`.
    if !options.json {
        print_report(&mut writer, &report)?;
    }
    if report.is_clean() {
        if options.json {
            writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        return Ok(0);
    }

    if options.update {
        for finding in &report.findings {
            doc.record_exceptions(
                &finding.module,
                finding.remove.iter().cloned(),
                options.global,
            );
        }
        doc.save(&options.overrides_path)?;
        if !options.json {
            writeln!(
                writer,
                "{} {}",
                "Updated".green(),
                normalize_display_path(&options.overrides_path)
            )?;
        }
    }

    if options.fix {
        let fix_options = ImportFixOptions {
            source_roots: options.source_roots.clone(),
            extension: options.source_extension.clone(),
            verbose: options.verbose,
        };
        report.applied = if options.json {
            run_fix_imports(&report.edits, &fix_options, std::io::sink())?
        } else {
            run_fix_imports(&report.edits, &fix_options, &mut writer)?
        };
    }
    if options.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    }

    if options.fix || options.update {
        Ok(0)
    } else {
        Ok(EXIT_FINDINGS)
    }
}
