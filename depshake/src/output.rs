use crate::commands::{ModuleFinding, ShakeReport};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Create a progress bar over module count for the needs phase.
///
/// In test mode, returns a hidden progress bar to avoid polluting test output.
#[must_use]
pub fn create_progress_bar(total_modules: u64) -> ProgressBar {
    // In test mode, return a hidden progress bar to avoid polluting test output
    if cfg!(test) {
        return ProgressBar::hidden();
    }

    let pb =
        ProgressBar::with_draw_target(Some(total_modules), ProgressDrawTarget::stderr_with_hz(20));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} modules ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.set_message("collecting references...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.tick();
    pb
}

fn list(names: &[String]) -> String {
    format!("[{}]", names.join(", "))
}

/// Print one module's findings.
///
/// ```text
/// Pkg.B: remove [Pkg.A]
///   add [Pkg.C]
///   fix Pkg.A: [Pkg.D]
/// ```
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_finding(writer: &mut impl Write, finding: &ModuleFinding) -> std::io::Result<()> {
    writeln!(
        writer,
        "{}: {} {}",
        finding.module.bold(),
        "remove".red(),
        list(&finding.remove)
    )?;
    if !finding.add.is_empty() {
        writeln!(writer, "  {} {}", "add".green(), list(&finding.add))?;
    }
    for fix in &finding.fixes {
        writeln!(
            writer,
            "  {} {}: {}",
            "fix".yellow(),
            fix.removed,
            list(&fix.targets)
        )?;
    }
    for reason in &finding.reasons {
        writeln!(
            writer,
            "  {} {}: {} uses {}",
            "why".dimmed(),
            reason.module,
            reason.declaration,
            reason.symbol
        )?;
    }
    Ok(())
}

/// Print the summary line.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_summary(writer: &mut impl Write, report: &ShakeReport) -> std::io::Result<()> {
    writeln!(
        writer,
        "{}",
        format!(
            "Analyzed {} modules ({} loaded)",
            report.modules_analyzed.to_string().bold(),
            report.modules_loaded.to_string().bold()
        )
        .dimmed()
    )?;
    if report.is_clean() {
        writeln!(writer, "{}", "✓ All clean! No unused imports found.".green())?;
    } else {
        writeln!(
            writer,
            "{} modules with unused imports, {} modules to edit",
            report.findings.len().to_string().red().bold(),
            report.edits.len().to_string().yellow().bold()
        )?;
    }
    Ok(())
}

/// Print the full report.
///
/// # Errors
///
/// Returns an error if writing to the writer fails.
pub fn print_report(writer: &mut impl Write, report: &ShakeReport) -> std::io::Result<()> {
    for finding in &report.findings {
        print_finding(writer, finding)?;
    }
    if !report.findings.is_empty() {
        writeln!(writer)?;
    }
    print_summary(writer, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{NamedFix, NeedExplanation};

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn test_print_finding() {
        colored::control::set_override(false);
        let finding = ModuleFinding {
            module: "Pkg.B".to_owned(),
            remove: strings(&["Pkg.A", "Pkg.X"]),
            add: strings(&["Pkg.C"]),
            fixes: vec![NamedFix {
                removed: "Pkg.A".to_owned(),
                targets: strings(&["Pkg.D"]),
            }],
            reasons: vec![NeedExplanation {
                module: "Pkg.C".to_owned(),
                declaration: "Pkg.B.f".to_owned(),
                symbol: "Pkg.C.x".to_owned(),
            }],
        };
        let mut out = Vec::new();
        print_finding(&mut out, &finding).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Pkg.B: remove [Pkg.A, Pkg.X]\n  add [Pkg.C]\n  fix Pkg.A: [Pkg.D]\n  why Pkg.C: Pkg.B.f uses Pkg.C.x\n"
        );
    }

    #[test]
    fn test_print_clean_report() {
        colored::control::set_override(false);
        let report = ShakeReport {
            modules_loaded: 3,
            modules_analyzed: 2,
            findings: Vec::new(),
            edits: Vec::new(),
            applied: Vec::new(),
        };
        let mut out = Vec::new();
        print_report(&mut out, &report).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Analyzed 2 modules (3 loaded)"));
        assert!(out.contains("All clean"));
    }
}
