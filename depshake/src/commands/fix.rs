//! Import fix command: writes computed edits back to module sources.

use crate::edits::NamedEdit;
use crate::fix::patch_source;
use crate::utils::{find_module_file, normalize_display_path, validate_path_within_root};

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Options for import fixing
#[derive(Debug, Default)]
pub struct ImportFixOptions {
    /// Directories holding module sources, searched in order
    pub source_roots: Vec<PathBuf>,
    /// Source file extension
    pub extension: String,
    /// Verbose output
    pub verbose: bool,
}

/// Result of fixing one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixResult {
    /// Module whose source was fixed
    pub module: String,
    /// File that was fixed
    pub file: String,
    /// Imports removed
    pub removed: Vec<String>,
    /// Imports added
    pub added: Vec<String>,
}

/// Apply `edits` to the source files of their modules.
///
/// Files that cannot be found, lie outside their source root or have a
/// header that does not parse are reported and skipped.
///
/// # Errors
///
/// Returns an error if writing to `writer` or to a source file fails.
pub fn run_fix_imports<W: Write>(
    edits: &[NamedEdit],
    options: &ImportFixOptions,
    mut writer: W,
) -> Result<Vec<FixResult>> {
    if edits.is_empty() {
        return Ok(Vec::new());
    }
    writeln!(writer, "\n{}", "Applying import fixes...".cyan())?;

    let mut results = Vec::new();
    for edit in edits {
        if let Some(result) = apply_fix_to_module(&mut writer, edit, options)? {
            results.push(result);
        }
    }

    if options.verbose {
        eprintln!(
            "[VERBOSE] Fixed {} of {} modules",
            results.len(),
            edits.len()
        );
    }
    Ok(results)
}

fn apply_fix_to_module<W: Write>(
    writer: &mut W,
    edit: &NamedEdit,
    options: &ImportFixOptions,
) -> Result<Option<FixResult>> {
    let Some((root, file_path)) =
        find_module_file(&options.source_roots, &edit.module, &options.extension)
    else {
        writeln!(
            writer,
            "  {} {}: source file not found",
            "Skip:".yellow(),
            edit.module
        )?;
        return Ok(None);
    };

    let file_path = match validate_path_within_root(&file_path, root) {
        Ok(p) => p,
        Err(e) => {
            writeln!(writer, "  {} {}: {}", "Skip:".yellow(), edit.module, e)?;
            return Ok(None);
        }
    };
    let display = normalize_display_path(&file_path);

    let content = match fs::read_to_string(&file_path) {
        Ok(c) => c,
        Err(e) => {
            writeln!(writer, "  {} {}: {}", "Skip:".yellow(), display, e)?;
            return Ok(None);
        }
    };

    let fixed = match patch_source(&content, &edit.remove, &edit.add) {
        Ok(fixed) => fixed,
        Err(e) => {
            writeln!(writer, "  {} {}: {}", "Parse error:".red(), display, e)?;
            return Ok(None);
        }
    };
    if fixed == content {
        if options.verbose {
            eprintln!("[VERBOSE] {display} already up to date");
        }
        return Ok(None);
    }

    fs::write(&file_path, fixed)?;
    writeln!(
        writer,
        "  {} {} ({} removed, {} added)",
        "Fixed:".green(),
        display,
        edit.remove.len(),
        edit.add.len()
    )?;
    Ok(Some(FixResult {
        module: edit.module.clone(),
        file: display,
        removed: edit.remove.clone(),
        added: edit.add.clone(),
    }))
}
