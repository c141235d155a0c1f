//! Source patching: applies a module's import edit to its source text.
//!
//! The header is parsed to locate the import statements, then all changes
//! are applied through `ByteRangeRewriter` so that everything outside the
//! touched statements is kept byte for byte.

mod header;
mod rewriter;

pub use header::{parse_header, HeaderError, ImportHeader, ImportStmt};
pub use rewriter::{ByteRangeRewriter, RewriteError, TextEdit};

use rustc_hash::FxHashSet;

/// Errors while patching a source file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixError {
    /// The import header could not be parsed.
    #[error(transparent)]
    Header(#[from] HeaderError),
    /// The computed edits were inconsistent.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

/// Remove the imports named in `remove`, drop repeated imports, and add an
/// `import` line for every name in `add` the remaining header lacks.
///
/// Added lines go after the last import (see [`ImportHeader::insert_at`]) in
/// the given order.
///
/// # Errors
///
/// Returns an error if the header does not parse.
pub fn patch_source<R, A>(text: &str, remove: &[R], add: &[A]) -> Result<String, FixError>
where
    R: AsRef<str>,
    A: AsRef<str>,
{
    let header = parse_header(text)?;
    let remove: FxHashSet<&str> = remove.iter().map(AsRef::as_ref).collect();

    let mut rewriter = ByteRangeRewriter::new(text);
    let mut deleted = Vec::new();
    let mut kept = FxHashSet::default();
    for stmt in &header.imports {
        let module = stmt.module.as_str();
        if remove.contains(module) || !kept.insert(module) {
            deleted.push(stmt.remove_span.clone());
            rewriter.add_edit(TextEdit::delete(
                stmt.remove_span.start,
                stmt.remove_span.end,
            ));
        }
    }

    let mut lines = String::new();
    for name in add.iter().map(AsRef::as_ref) {
        if kept.insert(name) {
            lines.push_str("import ");
            lines.push_str(name);
            lines.push('\n');
        }
    }
    if !lines.is_empty() {
        // Whatever ends up right before the insertion point must be a line
        // break, looking past deletions that end there.
        let mut before = header.insert_at;
        while let Some(range) = deleted.iter().find(|r| r.end == before && r.start < before) {
            before = range.start;
        }
        if before > 0 && !text[..before].ends_with('\n') {
            lines.insert(0, '\n');
        }
        rewriter.add_edit(TextEdit::insert(header.insert_at, lines));
    }

    Ok(rewriter.apply()?)
}
